use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;

use crate::errors::TokenError;
use crate::types::internal::{Claims, TokenPurpose};

/// Default time-to-live for every token purpose, in seconds.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// The payload recovered from a successfully verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject_id: i32,
    pub extra: Option<String>,
}

/// Issues and verifies signed, expiring, purpose-tagged action tokens.
///
/// A token authorizes exactly one privileged action (account confirmation,
/// password reset, email change) for exactly one user, within a bounded
/// time window. Tokens are HS256-signed so they cannot be forged or
/// altered without detection.
///
/// Tokens are stateless: there is no server-side revocation list, so a
/// token stays verifiable any number of times until it expires. That is a
/// deliberate simplicity trade-off, not an oversight.
pub struct TokenService {
    secret_key: String,
    confirm_ttl_seconds: i64,
    reset_ttl_seconds: i64,
    change_email_ttl_seconds: i64,
}

impl TokenService {
    /// Create a new TokenService with the given secret key and the
    /// default TTL for every purpose.
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            confirm_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            reset_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            change_email_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    /// Create a new TokenService with per-purpose TTL overrides.
    pub fn with_ttls(
        secret_key: String,
        confirm_ttl_seconds: i64,
        reset_ttl_seconds: i64,
        change_email_ttl_seconds: i64,
    ) -> Self {
        Self {
            secret_key,
            confirm_ttl_seconds,
            reset_ttl_seconds,
            change_email_ttl_seconds,
        }
    }

    /// The configured TTL for the given purpose.
    pub fn default_ttl(&self, purpose: TokenPurpose) -> i64 {
        match purpose {
            TokenPurpose::Confirm => self.confirm_ttl_seconds,
            TokenPurpose::Reset => self.reset_ttl_seconds,
            TokenPurpose::ChangeEmail => self.change_email_ttl_seconds,
        }
    }

    /// Issue a token authorizing `purpose` for `subject_id`, valid for
    /// `ttl_seconds` from now.
    ///
    /// # Arguments
    /// * `purpose` - The action the token authorizes
    /// * `subject_id` - The user the token is issued for
    /// * `extra` - Extra payload returned unchanged on verification
    /// * `ttl_seconds` - Validity window measured from issuance
    ///
    /// # Returns
    /// * `Ok(String)` - The encoded token, URL-safe as issued
    /// * `Err(TokenError)` - Claims serialization failed (should not
    ///   happen for claims this crate constructs)
    pub fn issue(
        &self,
        purpose: TokenPurpose,
        subject_id: i32,
        extra: Option<String>,
        ttl_seconds: i64,
    ) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();

        let claims = Claims {
            sub: subject_id,
            purpose,
            extra,
            exp: iat + ttl_seconds,
            iat,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )
        .map_err(|_| TokenError::Malformed)
    }

    /// Issue a token with the configured TTL for its purpose.
    pub fn issue_with_default_ttl(
        &self,
        purpose: TokenPurpose,
        subject_id: i32,
        extra: Option<String>,
    ) -> Result<String, TokenError> {
        self.issue(purpose, subject_id, extra, self.default_ttl(purpose))
    }

    /// Verify a token against an expected purpose.
    ///
    /// # Arguments
    /// * `token` - The encoded token to verify
    /// * `expected_purpose` - The action the caller is about to perform
    ///
    /// # Returns
    /// * `Ok(VerifiedToken)` - The original subject id and extra payload
    /// * `Err(TokenError::Malformed)` - Unparseable token or bad signature
    /// * `Err(TokenError::Expired)` - The validity window has elapsed
    /// * `Err(TokenError::PurposeMismatch)` - Valid token, wrong action
    pub fn verify(
        &self,
        token: &str,
        expected_purpose: TokenPurpose,
    ) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_key.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;

        if token_data.claims.purpose != expected_purpose {
            return Err(TokenError::PurposeMismatch);
        }

        Ok(VerifiedToken {
            subject_id: token_data.claims.sub,
            extra: token_data.claims.extra,
        })
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret_key", &"<redacted>")
            .field("confirm_ttl_seconds", &self.confirm_ttl_seconds)
            .field("reset_ttl_seconds", &self.reset_ttl_seconds)
            .field("change_email_ttl_seconds", &self.change_email_ttl_seconds)
            .finish()
    }
}

impl fmt::Display for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenService {{ confirm: {}s, reset: {}s, change_email: {}s }}",
            self.confirm_ttl_seconds, self.reset_ttl_seconds, self.change_email_ttl_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-minimum-32-characters-long";

    fn service() -> TokenService {
        TokenService::new(TEST_SECRET.to_string())
    }

    #[test]
    fn test_issue_verify_round_trip_for_all_purposes() {
        let service = service();

        for purpose in [
            TokenPurpose::Confirm,
            TokenPurpose::Reset,
            TokenPurpose::ChangeEmail,
        ] {
            let token = service.issue(purpose, 17, None, 3600).unwrap();
            let verified = service.verify(&token, purpose).unwrap();

            assert_eq!(verified.subject_id, 17);
            assert_eq!(verified.extra, None);
        }
    }

    #[test]
    fn test_extra_payload_returned_unchanged() {
        let service = service();

        let token = service
            .issue(
                TokenPurpose::ChangeEmail,
                3,
                Some("new@example.com".to_string()),
                3600,
            )
            .unwrap();
        let verified = service.verify(&token, TokenPurpose::ChangeEmail).unwrap();

        assert_eq!(verified.subject_id, 3);
        assert_eq!(verified.extra, Some("new@example.com".to_string()));
    }

    #[test]
    fn test_token_embeds_issuance_and_expiry() {
        let service = service();

        let before = Utc::now().timestamp();
        let token = service.issue(TokenPurpose::Confirm, 1, None, 1800).unwrap();
        let after = Utc::now().timestamp();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(TEST_SECRET.as_bytes()),
            &validation,
        )
        .unwrap();

        assert!(decoded.claims.iat >= before);
        assert!(decoded.claims.iat <= after);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 1800);
    }

    #[test]
    fn test_verify_fails_with_expired_token() {
        let service = service();

        // Craft a token whose window has already elapsed
        let now = Utc::now().timestamp();
        let expired_claims = Claims {
            sub: 1,
            purpose: TokenPurpose::Reset,
            extra: None,
            exp: now - 3600,
            iat: now - 7200,
        };

        let expired_token = encode(
            &Header::new(Algorithm::HS256),
            &expired_claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let result = service.verify(&expired_token, TokenPurpose::Reset);

        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn test_verify_fails_with_purpose_mismatch() {
        let service = service();

        let token = service.issue(TokenPurpose::Confirm, 1, None, 3600).unwrap();
        let result = service.verify(&token, TokenPurpose::Reset);

        assert_eq!(result, Err(TokenError::PurposeMismatch));
    }

    #[test]
    fn test_verify_fails_with_wrong_secret() {
        let service = service();
        let wrong_service = TokenService::new("wrong-secret-key-minimum-32-chars".to_string());

        let token = service.issue(TokenPurpose::Confirm, 1, None, 3600).unwrap();
        let result = wrong_service.verify(&token, TokenPurpose::Confirm);

        assert_eq!(result, Err(TokenError::Malformed));
    }

    #[test]
    fn test_verify_fails_with_tampered_token() {
        let service = service();

        let token = service.issue(TokenPurpose::Confirm, 1, None, 3600).unwrap();
        let mut tampered = token.clone();
        // Flip a character in the payload segment
        let payload_pos = token.find('.').unwrap() + 1;
        let original = tampered.remove(payload_pos);
        let replacement = if original == 'A' { 'B' } else { 'A' };
        tampered.insert(payload_pos, replacement);

        let result = service.verify(&tampered, TokenPurpose::Confirm);

        assert_eq!(result, Err(TokenError::Malformed));
    }

    #[test]
    fn test_verify_fails_with_garbage() {
        let service = service();

        assert_eq!(
            service.verify("not-a-token", TokenPurpose::Confirm),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            service.verify("", TokenPurpose::Confirm),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_token_is_url_safe() {
        let service = service();

        let token = service
            .issue(
                TokenPurpose::ChangeEmail,
                9,
                Some("someone+tag@example.com".to_string()),
                3600,
            )
            .unwrap();

        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_default_ttl_is_one_hour_for_every_purpose() {
        let service = service();

        assert_eq!(service.default_ttl(TokenPurpose::Confirm), 3600);
        assert_eq!(service.default_ttl(TokenPurpose::Reset), 3600);
        assert_eq!(service.default_ttl(TokenPurpose::ChangeEmail), 3600);
    }

    #[test]
    fn test_ttl_overrides_are_respected() {
        let service = TokenService::with_ttls(TEST_SECRET.to_string(), 600, 1200, 1800);

        assert_eq!(service.default_ttl(TokenPurpose::Confirm), 600);
        assert_eq!(service.default_ttl(TokenPurpose::Reset), 1200);
        assert_eq!(service.default_ttl(TokenPurpose::ChangeEmail), 1800);
    }

    #[test]
    fn test_debug_does_not_expose_secret() {
        let service = TokenService::new("super-secret-signing-key-32-chars-min".to_string());

        let debug_output = format!("{:?}", service);

        assert!(!debug_output.contains("super-secret-signing-key"));
        assert!(debug_output.contains("<redacted>"));
        assert!(debug_output.contains("TokenService"));
    }
}
