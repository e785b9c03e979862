/// Bearer authentication for Axum
///
/// [`jwt_auth_middleware`] reads `Authorization: Bearer <token>`, verifies it
/// as an access token and inserts an [`AuthContext`] into the request
/// extensions. Handlers take it with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use std::sync::Arc;
/// use taskdesk_shared::auth::jwt::{TokenConfig, TokenIssuer};
/// use taskdesk_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
///
/// async fn me(Extension(auth): Extension<AuthContext>) -> String {
///     auth.email
/// }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = Arc::new(TokenIssuer::new(TokenConfig::new("secret"))?);
/// let app: Router = Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn(move |req, next| {
///         jwt_auth_middleware(tokens.clone(), req, next)
///     }));
/// # Ok(())
/// # }
/// ```

use crate::auth::jwt::{AccessClaims, TokenIssuer};
use crate::error::INVALID_TOKEN_MESSAGE;
use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub employee_id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<AccessClaims> for AuthContext {
    fn from(claims: AccessClaims) -> Self {
        Self {
            employee_id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Error type for bearer authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    /// Malformed header, bad signature, expired, wrong kind
    #[error("invalid or expired token")]
    InvalidToken,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing credentials",
            AuthError::InvalidToken => INVALID_TOKEN_MESSAGE,
        };
        let body = Json(AuthErrorBody {
            error: "unauthorized",
            message,
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// Verifies the bearer token of a request
pub fn authenticate(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens
        .verify_access(token)
        .map_err(|_| AuthError::InvalidToken)?;
    Ok(claims.into())
}

/// Bearer authentication middleware
pub async fn jwt_auth_middleware(
    tokens: Arc<TokenIssuer>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate(&tokens, req.headers())?;
    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}
