use crate::errors::DatabaseError;
use thiserror::Error;

/// Follow graph errors.
#[derive(Error, Debug)]
pub enum FollowError {
    /// The self-follow edge is structurally permanent and cannot be
    /// removed through the public unfollow operation
    #[error("User {user_id} cannot unfollow themselves")]
    SelfUnfollow { user_id: i32 },

    #[error("No user with id {user_id}")]
    UserNotFound { user_id: i32 },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
