use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for registration
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Response model for registration
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Username of the created account
    pub username: String,

    /// Confirmation token; delivering it to the user (normally by email)
    /// is the caller's job
    pub confirmation_token: String,
}

/// Public view of a user account
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub confirmed: bool,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,

    /// Unix timestamp of account creation
    pub member_since: i64,

    /// Unix timestamp of last activity
    pub last_seen: i64,
}

/// Request model for a password-reset request
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Response model carrying an issued action token
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenIssuedResponse {
    /// The action token; delivering it to the user (normally by email)
    /// is the caller's job
    pub token: String,
}

/// Request model for completing a password reset
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CompletePasswordResetRequest {
    pub password: String,
}

/// Request model for an authenticated password change
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub password: String,
}

/// Request model for an email-change request
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangeEmailRequest {
    /// Current password, re-checked before a token is issued
    pub password: String,
    pub new_email: String,
}

/// Request model for a profile edit
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct EditProfileRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
}

/// Generic success message
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
