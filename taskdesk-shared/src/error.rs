/// Domain error taxonomy
///
/// Every service operation returns [`AppResult`]. The HTTP layer maps each
/// variant onto a status code; `Internal` keeps its source for logging and is
/// never rendered to callers.
///
/// # Example
///
/// ```
/// use taskdesk_shared::error::{AppError, AppResult};
///
/// fn find(id: u32) -> AppResult<u32> {
///     if id == 0 {
///         return Err(AppError::NotFound("task not found".to_string()));
///     }
///     Ok(id)
/// }
///
/// assert!(matches!(find(0), Err(AppError::NotFound(_))));
/// ```

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Message used for every token verification failure
pub const INVALID_TOKEN_MESSAGE: &str = "invalid or expired token";

/// Message used for every login failure
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid email or password";

/// Result alias for domain operations
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Semantically invalid input (unknown reference, bad enum value, non-positive hours)
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Credential or token failure
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("internal error: {context}")]
    Internal {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Wraps an unexpected failure
    pub fn internal(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Internal {
            context: context.into(),
            source: source.into(),
        }
    }

    /// The generic token rejection
    pub fn invalid_token() -> Self {
        AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    }

    /// The generic login rejection
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                AppError::Conflict(format!("duplicate value violates {}", constraint))
            }
            StoreError::Backend(source) => AppError::Internal {
                context: "storage failure".to_string(),
                source,
            },
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooLong => AppError::BadRequest(format!(
                "password must be at most {} bytes",
                crate::auth::password::MAX_PASSWORD_BYTES
            )),
            other => AppError::internal("password hashing failed", other),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => AppError::invalid_token(),
            other => AppError::internal("token operation failed", other),
        }
    }
}
