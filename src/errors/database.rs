use thiserror::Error;

/// Persistence-layer failures. The only error class that is not a
/// recoverable caller-facing outcome; surfaced as a 500-equivalent after
/// the enclosing transaction has rolled back.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {operation} failed: {source}")]
    Operation {
        operation: String,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Starting transaction failed: {source}")]
    TransactionBegin {
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Committing transaction failed: {source}")]
    TransactionCommit {
        #[source]
        source: sea_orm::DbErr,
    },
}

impl DatabaseError {
    pub fn operation(operation: &str, source: sea_orm::DbErr) -> Self {
        DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        }
    }
}
