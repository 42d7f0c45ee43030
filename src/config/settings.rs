use std::env;
use std::fmt;
use thiserror::Error;

use crate::services::DEFAULT_TOKEN_TTL_SECONDS;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("SECRET_KEY environment variable must be set")]
    MissingSecretKey,

    #[error("Invalid value for {variable}: {value}")]
    InvalidValue { variable: String, value: String },
}

/// Process-wide configuration, fixed at startup.
///
/// The secret key signs action tokens and keys the id codec; it is never
/// mutated at runtime.
pub struct ApplicationSettings {
    pub database_url: String,
    pub secret_key: String,
    pub bind_addr: String,
    pub confirm_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub change_email_ttl_seconds: i64,
}

impl ApplicationSettings {
    /// Load settings from environment variables. Only SECRET_KEY is
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://waxstash.db?mode=rwc".to_string());

        let secret_key = env::var("SECRET_KEY").map_err(|_| SettingsError::MissingSecretKey)?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            database_url,
            secret_key,
            bind_addr,
            confirm_ttl_seconds: ttl_from_env("CONFIRM_TOKEN_TTL_SECONDS")?,
            reset_ttl_seconds: ttl_from_env("RESET_TOKEN_TTL_SECONDS")?,
            change_email_ttl_seconds: ttl_from_env("CHANGE_EMAIL_TOKEN_TTL_SECONDS")?,
        })
    }
}

fn ttl_from_env(variable: &str) -> Result<i64, SettingsError> {
    match env::var(variable) {
        Ok(value) => value.parse().map_err(|_| SettingsError::InvalidValue {
            variable: variable.to_string(),
            value,
        }),
        Err(_) => Ok(DEFAULT_TOKEN_TTL_SECONDS),
    }
}

impl fmt::Debug for ApplicationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationSettings")
            .field("database_url", &self.database_url)
            .field("secret_key", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("confirm_ttl_seconds", &self.confirm_ttl_seconds)
            .field("reset_ttl_seconds", &self.reset_ttl_seconds)
            .field("change_email_ttl_seconds", &self.change_email_ttl_seconds)
            .finish()
    }
}
