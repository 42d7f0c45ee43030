use thiserror::Error;

/// Identifier obfuscation failures.
///
/// `Malformed` is surfaced to callers as a plain not-found, never as a
/// decoding error, so the encoding internals stay invisible.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Not valid URL-safe encoding, or decoding did not yield a plain
    /// non-negative integer string
    #[error("identifier token is malformed")]
    Malformed,

    /// The codec key must not be empty
    #[error("codec key is empty")]
    EmptyKey,

    /// Only non-negative identifiers can be encoded
    #[error("identifier is negative")]
    NegativeId,
}
