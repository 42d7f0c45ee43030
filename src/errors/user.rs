use crate::errors::{DatabaseError, TokenError};
use thiserror::Error;

/// Identity and account-flow errors.
///
/// Everything except the transparent `Database` variant is a recoverable,
/// caller-facing outcome: unique-field violations are surfaced per field,
/// token failures deny the mutation without applying any part of it.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Email already registered: {email}")]
    DuplicateEmail { email: String },

    #[error("Username already registered: {username}")]
    DuplicateUsername { username: String },

    #[error("No user with id {user_id}")]
    NotFound { user_id: i32 },

    #[error("There is no account associated with that email address")]
    EmailNotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Administrator permission required")]
    Forbidden,

    #[error("Password hashing failed: {message}")]
    PasswordHash { message: String },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
