use thiserror::Error;

/// Action token verification failures.
///
/// All variants deny the requested mutation; callers surface them as a
/// generic "invalid or expired request" and must never log the raw token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed or its signature does not validate
    #[error("token is malformed or its signature does not validate")]
    Malformed,

    /// The current time exceeds issued-at plus time-to-live
    #[error("token has expired")]
    Expired,

    /// The token was issued for a different action
    #[error("token purpose does not match the requested action")]
    PurposeMismatch,
}
