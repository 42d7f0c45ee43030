use crate::errors::DatabaseError;
use thiserror::Error;

/// Ownership index errors.
///
/// `NotOwner` is distinct from `NotFound`: the former means the record
/// exists but belongs to someone else ("you don't own that"), the latter
/// that the id does not resolve at all.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record {record_id} is not owned by user {user_id}")]
    NotOwner { record_id: i32, user_id: i32 },

    #[error("No record with id {record_id}")]
    NotFound { record_id: i32 },

    /// The same owner already has a record with identical
    /// (name, artist, year, format, size, color, notes)
    #[error("You already own this")]
    Duplicate,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
