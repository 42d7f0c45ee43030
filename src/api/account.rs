use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use std::sync::Arc;

use crate::api::{authenticate, UserAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::stores::ProfileUpdate;
use crate::types::db::user;
use crate::types::dto::account::{
    ChangeEmailRequest, ChangePasswordRequest, CompletePasswordResetRequest, EditProfileRequest,
    MessageResponse, PasswordResetRequest, RegisterRequest, RegisterResponse, TokenIssuedResponse,
    UserResponse,
};

/// Account and authentication endpoints
pub struct AccountApi {
    data: Arc<AppData>,
}

#[derive(Tags)]
enum AccountTags {
    /// Registration, confirmation and credential management
    Account,
}

impl AccountApi {
    pub fn new(data: Arc<AppData>) -> Self {
        Self { data }
    }

    fn user_response(user: user::Model) -> UserResponse {
        UserResponse {
            username: user.username,
            confirmed: user.confirmed,
            name: user.name,
            location: user.location,
            about_me: user.about_me,
            member_since: user.member_since,
            last_seen: user.last_seen,
        }
    }
}

#[OpenApi(prefix_path = "/auth")]
impl AccountApi {
    /// Register a new account
    ///
    /// The account starts unconfirmed; the returned confirmation token
    /// must reach the user out of band.
    #[oai(path = "/register", method = "post", tag = "AccountTags::Account")]
    async fn register(
        &self,
        body: Json<RegisterRequest>,
    ) -> Result<Json<RegisterResponse>, ApiError> {
        let registration = self
            .data
            .account_service
            .register(&body.email, &body.username, &body.password)
            .await?;

        Ok(Json(RegisterResponse {
            username: registration.user.username,
            confirmation_token: registration.confirmation_token,
        }))
    }

    /// Confirm an account with a confirmation token
    #[oai(path = "/confirm/:token", method = "get", tag = "AccountTags::Account")]
    async fn confirm(&self, token: Path<String>) -> Result<Json<MessageResponse>, ApiError> {
        self.data.account_service.confirm_account(&token.0).await?;

        Ok(Json(MessageResponse {
            message: "Thanks for confirming your account".to_string(),
        }))
    }

    /// Request a fresh confirmation token
    #[oai(path = "/confirm/resend", method = "post", tag = "AccountTags::Account")]
    async fn resend_confirmation(
        &self,
        auth: UserAuth,
    ) -> Result<Json<TokenIssuedResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let token = self
            .data
            .account_service
            .resend_confirmation(caller.id)
            .await?;

        Ok(Json(TokenIssuedResponse { token }))
    }

    /// Request a password reset token for an email address
    #[oai(path = "/reset", method = "post", tag = "AccountTags::Account")]
    async fn password_reset_request(
        &self,
        body: Json<PasswordResetRequest>,
    ) -> Result<Json<TokenIssuedResponse>, ApiError> {
        let token = self
            .data
            .account_service
            .request_password_reset(&body.email)
            .await?;

        Ok(Json(TokenIssuedResponse { token }))
    }

    /// Complete a password reset with a reset token
    ///
    /// An invalid or expired token leaves the password unchanged.
    #[oai(path = "/reset/:token", method = "post", tag = "AccountTags::Account")]
    async fn password_reset(
        &self,
        token: Path<String>,
        body: Json<CompletePasswordResetRequest>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        self.data
            .account_service
            .complete_password_reset(&token.0, &body.password)
            .await?;

        Ok(Json(MessageResponse {
            message: "Your password has been updated".to_string(),
        }))
    }

    /// Change password, checking the old one first
    #[oai(path = "/change-password", method = "post", tag = "AccountTags::Account")]
    async fn change_password(
        &self,
        auth: UserAuth,
        body: Json<ChangePasswordRequest>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        self.data
            .user_store
            .change_password(caller.id, &body.old_password, &body.password)
            .await?;

        Ok(Json(MessageResponse {
            message: "Your password has been updated".to_string(),
        }))
    }

    /// Request an email change token for the authenticated account
    #[oai(path = "/change-email", method = "post", tag = "AccountTags::Account")]
    async fn change_email_request(
        &self,
        auth: UserAuth,
        body: Json<ChangeEmailRequest>,
    ) -> Result<Json<TokenIssuedResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let token = self
            .data
            .account_service
            .request_email_change(caller.id, &body.password, &body.new_email)
            .await?;

        Ok(Json(TokenIssuedResponse { token }))
    }

    /// Complete an email change with a change-email token
    #[oai(path = "/change-email/:token", method = "get", tag = "AccountTags::Account")]
    async fn change_email(&self, token: Path<String>) -> Result<Json<MessageResponse>, ApiError> {
        self.data
            .account_service
            .complete_email_change(&token.0)
            .await?;

        Ok(Json(MessageResponse {
            message: "Your email address has been updated".to_string(),
        }))
    }

    /// Edit the authenticated user's profile
    #[oai(path = "/profile", method = "put", tag = "AccountTags::Account")]
    async fn edit_profile(
        &self,
        auth: UserAuth,
        body: Json<EditProfileRequest>,
    ) -> Result<Json<UserResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let updated = self
            .data
            .user_store
            .update_profile(
                caller.id,
                ProfileUpdate {
                    name: body.name.clone(),
                    location: body.location.clone(),
                    about_me: body.about_me.clone(),
                },
            )
            .await?;

        Ok(Json(Self::user_response(updated)))
    }
}
