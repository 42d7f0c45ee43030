use std::sync::Arc;

use crate::errors::{TokenError, UserError};
use crate::services::TokenService;
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::TokenPurpose;

/// A freshly registered user together with their confirmation token.
///
/// Email transport is the deployment's concern; the token is handed back
/// to the caller for delivery.
#[derive(Debug)]
pub struct Registration {
    pub user: user::Model,
    pub confirmation_token: String,
}

/// The account flows that tie tokens to identity mutations: confirm,
/// password reset, email change.
///
/// Verification always happens before any mutation, so a failed token
/// never leaves a partially applied change behind.
pub struct AccountService {
    user_store: Arc<UserStore>,
    token_service: Arc<TokenService>,
}

impl AccountService {
    pub fn new(user_store: Arc<UserStore>, token_service: Arc<TokenService>) -> Self {
        Self {
            user_store,
            token_service,
        }
    }

    /// Register a new account and issue its confirmation token.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Registration, UserError> {
        let user = self.user_store.register(email, username, password).await?;
        let confirmation_token =
            self.token_service
                .issue_with_default_ttl(TokenPurpose::Confirm, user.id, None)?;

        Ok(Registration {
            user,
            confirmation_token,
        })
    }

    /// Issue a fresh confirmation token for an existing account.
    pub async fn resend_confirmation(&self, user_id: i32) -> Result<String, UserError> {
        let user = self.user_store.get(user_id).await?;

        Ok(self
            .token_service
            .issue_with_default_ttl(TokenPurpose::Confirm, user.id, None)?)
    }

    /// Verify a confirmation token and mark its subject confirmed.
    pub async fn confirm_account(&self, token: &str) -> Result<i32, UserError> {
        let verified = self.token_service.verify(token, TokenPurpose::Confirm)?;
        self.user_store.mark_confirmed(verified.subject_id).await?;

        Ok(verified.subject_id)
    }

    /// Issue a password-reset token for the account behind `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, UserError> {
        let user = self
            .user_store
            .find_by_email(email)
            .await?
            .ok_or(UserError::EmailNotFound)?;

        Ok(self
            .token_service
            .issue_with_default_ttl(TokenPurpose::Reset, user.id, None)?)
    }

    /// Verify a reset token and replace its subject's password. An
    /// invalid or expired token leaves the password unchanged.
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<i32, UserError> {
        let verified = self.token_service.verify(token, TokenPurpose::Reset)?;
        self.user_store
            .set_password(verified.subject_id, new_password)
            .await?;

        Ok(verified.subject_id)
    }

    /// Issue an email-change token carrying the new address, after
    /// re-checking the caller's password.
    pub async fn request_email_change(
        &self,
        user_id: i32,
        password: &str,
        new_email: &str,
    ) -> Result<String, UserError> {
        let user = self.user_store.get(user_id).await?;
        self.user_store.verify_password(&user.email, password).await?;

        Ok(self.token_service.issue_with_default_ttl(
            TokenPurpose::ChangeEmail,
            user_id,
            Some(new_email.to_string()),
        )?)
    }

    /// Verify an email-change token and point its subject at the new
    /// address carried in the token.
    pub async fn complete_email_change(&self, token: &str) -> Result<i32, UserError> {
        let verified = self
            .token_service
            .verify(token, TokenPurpose::ChangeEmail)?;

        // A change-email token without an address is not one we issued
        let new_email = verified
            .extra
            .ok_or(UserError::Token(TokenError::Malformed))?;

        self.user_store
            .change_email(verified.subject_id, &new_email)
            .await?;

        Ok(verified.subject_id)
    }
}
