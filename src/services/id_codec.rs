use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::fmt;

use crate::errors::CodecError;

/// Reversible obfuscation of database identifiers for use in URLs.
///
/// The decimal digit string of the id is mixed with the key byte-by-byte
/// (additive, modulo 256, key repeated cyclically) and the result is
/// URL-safe base64 encoded. Deterministic: the same id and key always
/// produce the same string.
///
/// This is obfuscation, not authentication. There is no MAC, so a
/// corrupted or forged token can decode to a different, syntactically
/// valid integer instead of an error. Callers must treat the decoded id
/// as untrusted input and surface decode failures as a plain not-found.
pub struct IdCodec {
    key: Vec<u8>,
}

impl IdCodec {
    /// Create a codec over the given key. Fails if the key is empty.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CodecError::EmptyKey);
        }
        Ok(Self { key })
    }

    /// Encode a non-negative identifier into an opaque URL-safe string.
    pub fn encode(&self, id: i64) -> Result<String, CodecError> {
        if id < 0 {
            return Err(CodecError::NegativeId);
        }

        let mixed: Vec<u8> = id
            .to_string()
            .bytes()
            .zip(self.key.iter().cycle())
            .map(|(digit, k)| digit.wrapping_add(*k))
            .collect();

        Ok(URL_SAFE_NO_PAD.encode(mixed))
    }

    /// Decode a string produced by [`encode`](Self::encode) with the same
    /// key back into the original identifier.
    pub fn decode(&self, token: &str) -> Result<i64, CodecError> {
        let mixed = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CodecError::Malformed)?;

        let digits: Vec<u8> = mixed
            .iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, k)| byte.wrapping_sub(*k))
            .collect();

        if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::Malformed);
        }

        let digits = String::from_utf8(digits).map_err(|_| CodecError::Malformed)?;
        digits.parse::<i64>().map_err(|_| CodecError::Malformed)
    }
}

impl fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdCodec").field("key", &"<redacted>").finish()
    }
}
