// Errors layer - Error type definitions
pub mod api;
pub mod codec;
pub mod database;
pub mod follow;
pub mod record;
pub mod token;
pub mod user;

// Re-exports for convenience
pub use api::ApiError;
pub use codec::CodecError;
pub use database::DatabaseError;
pub use follow::FollowError;
pub use record::RecordError;
pub use token::TokenError;
pub use user::UserError;
