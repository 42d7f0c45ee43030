use serde::{Deserialize, Serialize};

/// The privileged action a token authorizes. A token issued for one purpose
/// must never be accepted for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Confirm,
    Reset,
    ChangeEmail,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPurpose::Confirm => f.write_str("confirm"),
            TokenPurpose::Reset => f.write_str("reset"),
            TokenPurpose::ChangeEmail => f.write_str("change_email"),
        }
    }
}

/// Action token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: i32,

    /// The action this token authorizes
    pub purpose: TokenPurpose,

    /// Extra payload carried through verification unchanged
    /// (e.g. the new address for a change-email token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}
