use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use waxstash_backend::api::{AccountApi, CollectionApi};
use waxstash_backend::config::{init_logging, ApplicationSettings};
use waxstash_backend::stores::VocabStore;
use waxstash_backend::AppData;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging()?;

    let settings = ApplicationSettings::from_env()?;

    let db: DatabaseConnection = Database::connect(&settings.database_url).await?;
    tracing::info!(database_url = %settings.database_url, "connected to database");

    Migrator::up(&db, None).await?;
    tracing::info!("database migrations completed");

    // Seed the fixed reference vocabularies; safe to re-run
    VocabStore::new(db.clone()).seed().await?;

    let data = Arc::new(AppData::new(db, &settings)?);

    // Repair self-follow edges for any user created before the invariant
    // was enforced at registration
    let repaired = data.follow_store.ensure_all_self_follows().await?;
    if repaired > 0 {
        tracing::info!(repaired, "backfilled missing self-follow edges");
    }

    let api_service = OpenApiService::new(
        (
            AccountApi::new(Arc::clone(&data)),
            CollectionApi::new(Arc::clone(&data)),
        ),
        "waxstash",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("http://{}/api", settings.bind_addr));

    let ui = api_service.swagger_ui();

    let app = Route::new()
        .nest("/api", api_service)
        .nest("/swagger", ui);

    tracing::info!(addr = %settings.bind_addr, "starting server");

    Server::new(TcpListener::bind(settings.bind_addr.clone()))
        .run(app)
        .await?;

    Ok(())
}
