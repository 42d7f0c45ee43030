use crate::errors::{CodecError, DatabaseError, FollowError, RecordError, TokenError, UserError};
use poem_openapi::{payload::Json, ApiResponse, Object};

/// Standardized error response body
#[derive(Object, Debug)]
pub struct ErrorBody {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Offending field for per-field constraint violations
    pub field: Option<String>,

    /// HTTP status code
    pub status_code: u16,
}

/// API error responses shared by all endpoint groups
#[derive(ApiResponse, Debug)]
pub enum ApiError {
    /// Invalid or expired request (action tokens)
    #[oai(status = 400)]
    BadRequest(Json<ErrorBody>),

    /// Invalid credentials
    #[oai(status = 401)]
    Unauthorized(Json<ErrorBody>),

    /// Caller lacks the required capability or ownership
    #[oai(status = 403)]
    Forbidden(Json<ErrorBody>),

    /// Resource does not resolve
    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),

    /// The same record already exists for this owner
    #[oai(status = 409)]
    Conflict(Json<ErrorBody>),

    /// Per-field constraint violation
    #[oai(status = 422)]
    ConstraintViolation(Json<ErrorBody>),

    /// Unexpected persistence-layer failure
    #[oai(status = 500)]
    Internal(Json<ErrorBody>),
}

impl ApiError {
    pub fn invalid_request() -> Self {
        ApiError::BadRequest(Json(ErrorBody {
            error: "invalid_request".to_string(),
            message: "Invalid or expired request".to_string(),
            field: None,
            status_code: 400,
        }))
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized(Json(ErrorBody {
            error: "invalid_credentials".to_string(),
            message: "Invalid email or password".to_string(),
            field: None,
            status_code: 401,
        }))
    }

    pub fn forbidden(message: &str) -> Self {
        ApiError::Forbidden(Json(ErrorBody {
            error: "forbidden".to_string(),
            message: message.to_string(),
            field: None,
            status_code: 403,
        }))
    }

    pub fn not_found() -> Self {
        ApiError::NotFound(Json(ErrorBody {
            error: "not_found".to_string(),
            message: "Not found".to_string(),
            field: None,
            status_code: 404,
        }))
    }

    pub fn duplicate_record() -> Self {
        ApiError::Conflict(Json(ErrorBody {
            error: "duplicate_record".to_string(),
            message: "You already own this".to_string(),
            field: None,
            status_code: 409,
        }))
    }

    pub fn constraint_violation(field: &str, message: &str) -> Self {
        ApiError::ConstraintViolation(Json(ErrorBody {
            error: "constraint_violation".to_string(),
            message: message.to_string(),
            field: Some(field.to_string()),
            status_code: 422,
        }))
    }

    pub fn internal() -> Self {
        ApiError::Internal(Json(ErrorBody {
            error: "internal_error".to_string(),
            message: "Internal server error".to_string(),
            field: None,
            status_code: 500,
        }))
    }
}

impl From<TokenError> for ApiError {
    // One generic denial for all token failures; the raw token and its
    // signature never reach a log line or a response body
    fn from(_: TokenError) -> Self {
        ApiError::invalid_request()
    }
}

impl From<CodecError> for ApiError {
    // Surfaced as a 404-equivalent so encoding internals stay invisible
    fn from(_: CodecError) -> Self {
        ApiError::not_found()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        tracing::error!(error = %e, "persistence failure");
        ApiError::internal()
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::DuplicateEmail { .. } => {
                ApiError::constraint_violation("email", "Email already registered")
            }
            UserError::DuplicateUsername { .. } => {
                ApiError::constraint_violation("username", "Username already registered")
            }
            UserError::NotFound { .. } => ApiError::not_found(),
            UserError::EmailNotFound => ApiError::constraint_violation(
                "email",
                "There is no account associated with that email address",
            ),
            UserError::InvalidCredentials => ApiError::invalid_credentials(),
            UserError::Forbidden => ApiError::forbidden("Administrator permission required"),
            UserError::Token(e) => e.into(),
            UserError::Database(e) => e.into(),
            UserError::PasswordHash { message } => {
                tracing::error!(message = %message, "password hashing failure");
                ApiError::internal()
            }
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::NotOwner { .. } => ApiError::forbidden("You don't own that"),
            RecordError::NotFound { .. } => ApiError::not_found(),
            RecordError::Duplicate => ApiError::duplicate_record(),
            RecordError::Database(e) => e.into(),
        }
    }
}

impl From<FollowError> for ApiError {
    fn from(e: FollowError) -> Self {
        match e {
            FollowError::SelfUnfollow { .. } => {
                ApiError::constraint_violation("username", "You cannot unfollow yourself")
            }
            FollowError::UserNotFound { .. } => ApiError::not_found(),
            FollowError::Database(e) => e.into(),
        }
    }
}
