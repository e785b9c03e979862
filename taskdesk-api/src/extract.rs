/// Request extractors with JSON error bodies
///
/// Drop-in replacements for axum's `Json`, `Path` and `Query` extractors.
/// A rejection (malformed JSON, a missing content type, an unparsable UUID
/// in the path, a bad query string) becomes an [`ApiError::BadRequest`], so
/// it is rendered as the usual `ErrorResponse` body instead of plain text.
///
/// # Example
///
/// ```
/// use taskdesk_api::error::ApiResult;
/// use taskdesk_api::extract::{ApiJson, ApiPath};
/// use uuid::Uuid;
///
/// async fn rename(ApiPath(id): ApiPath<Uuid>, ApiJson(name): ApiJson<String>) -> ApiResult<String> {
///     Ok(format!("{} -> {}", id, name))
/// }
/// ```

use crate::error::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
