// API layer - poem-openapi endpoint implementations
pub mod account;
pub mod collection;

pub use account::AccountApi;
pub use collection::CollectionApi;

use poem_openapi::{auth::Basic, SecurityScheme};

use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::types::db::user;

/// HTTP basic authentication: email and password checked per request.
/// This layer authenticates the caller; the stores below it only ever
/// see the resulting user id.
#[derive(SecurityScheme)]
#[oai(ty = "basic")]
pub struct UserAuth(pub Basic);

/// Authenticate the caller and bump their last-seen timestamp.
pub(crate) async fn authenticate(data: &AppData, auth: &UserAuth) -> Result<user::Model, ApiError> {
    let user = data
        .user_store
        .verify_password(&auth.0.username, &auth.0.password)
        .await?;
    data.user_store.ping(user.id).await?;

    Ok(user)
}
