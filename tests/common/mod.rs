// Common test utilities for integration tests

#![allow(dead_code)]

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use waxstash_backend::services::{AccountService, TokenService};
use waxstash_backend::stores::{FollowStore, NewRecord, RecordStore, UserStore, VocabStore};
use waxstash_backend::types::db::user;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-characters-long";

/// Creates an in-memory test database with migrations applied and the
/// reference vocabularies seeded
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    VocabStore::new(db.clone())
        .seed()
        .await
        .expect("Failed to seed vocabularies");

    db
}

/// Creates an account service (and its user store) over a test database
pub fn create_account_service(db: &DatabaseConnection) -> (Arc<UserStore>, AccountService) {
    let user_store = Arc::new(UserStore::new(db.clone()));
    let token_service = Arc::new(TokenService::new(TEST_SECRET.to_string()));
    let account_service = AccountService::new(Arc::clone(&user_store), token_service);

    (user_store, account_service)
}

pub async fn register_user(store: &UserStore, email: &str, username: &str) -> user::Model {
    store
        .register(email, username, "yolo")
        .await
        .expect("Failed to register user")
}

/// A record input with sensible defaults; size_id 3 is the seeded 12"
pub fn test_record(artist: &str, title: &str) -> NewRecord {
    NewRecord {
        artist: artist.to_string(),
        name: title.to_string(),
        year: 1970,
        size_id: 3,
        format_id: 1,
        color: Some("Black".to_string()),
        notes: Some("Lorem".to_string()),
        mail: false,
        image_url: None,
    }
}

pub fn follow_store(db: &DatabaseConnection) -> FollowStore {
    FollowStore::new(db.clone())
}

pub fn record_store(db: &DatabaseConnection) -> RecordStore {
    RecordStore::new(db.clone())
}

pub fn user_store(db: &DatabaseConnection) -> UserStore {
    UserStore::new(db.clone())
}
