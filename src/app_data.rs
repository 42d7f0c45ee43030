use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::ApplicationSettings;
use crate::errors::CodecError;
use crate::services::{AccountService, IdCodec, TokenService};
use crate::stores::{FollowStore, RecordStore, UserStore, VocabStore};

/// Shared application state handed to the API layer.
pub struct AppData {
    pub db: DatabaseConnection,
    pub token_service: Arc<TokenService>,
    pub codec: Arc<IdCodec>,
    pub user_store: Arc<UserStore>,
    pub follow_store: Arc<FollowStore>,
    pub record_store: Arc<RecordStore>,
    pub vocab_store: Arc<VocabStore>,
    pub account_service: Arc<AccountService>,
}

impl AppData {
    pub fn new(db: DatabaseConnection, settings: &ApplicationSettings) -> Result<Self, CodecError> {
        let token_service = Arc::new(TokenService::with_ttls(
            settings.secret_key.clone(),
            settings.confirm_ttl_seconds,
            settings.reset_ttl_seconds,
            settings.change_email_ttl_seconds,
        ));
        let codec = Arc::new(IdCodec::new(settings.secret_key.as_bytes())?);

        let user_store = Arc::new(UserStore::new(db.clone()));
        let follow_store = Arc::new(FollowStore::new(db.clone()));
        let record_store = Arc::new(RecordStore::new(db.clone()));
        let vocab_store = Arc::new(VocabStore::new(db.clone()));

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&user_store),
            Arc::clone(&token_service),
        ));

        Ok(Self {
            db,
            token_service,
            codec,
            user_store,
            follow_store,
            record_store,
            vocab_store,
            account_service,
        })
    }
}
