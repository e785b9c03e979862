/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Register an employee and log them in
/// - `POST /v1/auth/login` - Login and get a token pair
/// - `POST /v1/auth/refresh` - Rotate a refresh token
/// - `POST /v1/auth/logout` - Revoke one session
/// - `POST /v1/auth/logout-all` - Revoke every session of the caller (bearer)
///
/// # Refresh Token Transport
///
/// Register, login and refresh set the refresh token in an `HttpOnly`,
/// `SameSite=Lax` cookie scoped to `/v1/auth` (`Secure` when
/// `COOKIE_SECURE` is set). The JSON body repeats it for non-browser
/// clients. Refresh and logout read the cookie first and fall back to a
/// `{"refresh_token": "..."}` body. A failed refresh and every logout clear
/// the cookie.
///
/// Responses carry the raw refresh token and its expiry only; session ids
/// and digests stay server-side.

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use taskdesk_shared::{
    auth::{
        middleware::AuthContext,
        password::MAX_PASSWORD_BYTES,
        service::{AuthSession, Registration},
    },
    error::AppError,
    models::{employee::Employee, session::ClientInfo},
};
use validator::{Validate, ValidationError};

/// Name of the refresh token cookie
pub const REFRESH_COOKIE: &str = "refresh_token";

const COOKIE_PATH: &str = "/v1/auth";

const CLEARED_COOKIE: &str = "refresh_token=; Path=/v1/auth; Max-Age=0; \
     Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax";

const CLEARED_SECURE_COOKIE: &str = "refresh_token=; Path=/v1/auth; Max-Age=0; \
     Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Secure";

/// A single `Set-Cookie` header
pub type CookieHeader = [(HeaderName, HeaderValue); 1];

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be 2 to 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "password_fits_hasher")
    )]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh or logout body, used when no refresh cookie is sent
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token pair returned by register, login and refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,

    pub access_expires_at: DateTime<Utc>,

    pub refresh_token: String,

    pub refresh_expires_at: DateTime<Utc>,

    /// Always "Bearer"
    pub token_type: String,

    pub employee: Employee,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            access_expires_at: session.access_expires_at,
            refresh_token: session.refresh_token,
            refresh_expires_at: session.refresh_expires_at,
            token_type: "Bearer".to_string(),
            employee: session.employee,
        }
    }
}

/// Logout-all response
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutAllResponse {
    /// Number of sessions that were still live
    pub revoked: u64,
}

/// The hasher rejects anything longer than 72 bytes, whatever the
/// character count
fn password_fits_hasher(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password_bytes")
            .with_message(Cow::Borrowed("Password must be at most 72 bytes")));
    }
    Ok(())
}

/// `Set-Cookie` carrying a refresh token until `expires_at`
pub fn refresh_cookie(
    token: &str,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> ApiResult<CookieHeader> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; Expires={}; HttpOnly; SameSite=Lax",
        REFRESH_COOKIE,
        token,
        COOKIE_PATH,
        max_age,
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT"),
    );
    if secure {
        cookie.push_str("; Secure");
    }

    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("refresh cookie is not a header value: {}", e)))?;
    Ok([(header::SET_COOKIE, value)])
}

/// `Set-Cookie` that removes the refresh token cookie
pub fn cleared_refresh_cookie(secure: bool) -> CookieHeader {
    let cookie = if secure {
        CLEARED_SECURE_COOKIE
    } else {
        CLEARED_COOKIE
    };
    [(header::SET_COOKIE, HeaderValue::from_static(cookie))]
}

/// Value of the refresh token cookie, if the request carries a non-empty one
pub fn refresh_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == REFRESH_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Refresh token from the cookie, else from a JSON body; `None` if neither
fn presented_refresh_token(headers: &HeaderMap, body: &[u8]) -> ApiResult<Option<String>> {
    if let Some(token) = refresh_cookie_value(headers) {
        return Ok(Some(token));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let req: RefreshRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;
    validate_request(&req)?;
    Ok(Some(req.refresh_token))
}

/// Advisory client metadata from request headers
///
/// The first `X-Forwarded-For` hop wins over `X-Real-IP`.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string);

    ClientInfo {
        user_agent: header("user-agent").map(str::to_string),
        ip_address,
    }
}

/// Register a new employee
///
/// Creates the employee and opens a first session, as a login would.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieHeader, Json<AuthResponse>)> {
    validate_request(&req)?;

    let password = req.password.clone();
    let employee = state
        .auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            department: req.department,
            position: req.position,
        })
        .await?;

    let session = state
        .auth
        .login(&employee.email, &password, client_info(&headers))
        .await?;

    let cookie = refresh_cookie(
        &session.refresh_token,
        session.refresh_expires_at,
        state.config.api.cookie_secure,
    )?;
    Ok((StatusCode::CREATED, cookie, Json(session.into())))
}

/// Login with email and password
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Invalid email or password
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<(CookieHeader, Json<AuthResponse>)> {
    validate_request(&req)?;

    let session = state
        .auth
        .login(&req.email, &req.password, client_info(&headers))
        .await?;

    let cookie = refresh_cookie(
        &session.refresh_token,
        session.refresh_expires_at,
        state.config.api.cookie_secure,
    )?;
    Ok((cookie, Json(session.into())))
}

/// Exchange a refresh token for a new token pair
///
/// The presented token is single-use. Any failure clears the cookie.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, invalid, expired, revoked or replayed
///   refresh token
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(CookieHeader, Json<AuthResponse>), (CookieHeader, ApiError)> {
    let secure = state.config.api.cookie_secure;

    let rotated = async {
        let token = presented_refresh_token(&headers, &body)?
            .ok_or_else(|| ApiError::from(AppError::invalid_token()))?;
        let session = state.auth.refresh(&token, client_info(&headers)).await?;
        let cookie = refresh_cookie(&session.refresh_token, session.refresh_expires_at, secure)?;
        Ok::<_, ApiError>((cookie, Json(AuthResponse::from(session))))
    }
    .await;

    rotated.map_err(|e| (cleared_refresh_cookie(secure), e))
}

/// Revoke the session of a refresh token and clear the cookie
///
/// Succeeds for unknown or already revoked tokens, and when no token is
/// presented at all.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, CookieHeader), (CookieHeader, ApiError)> {
    let secure = state.config.api.cookie_secure;

    let revoked = async {
        if let Some(token) = presented_refresh_token(&headers, &body)? {
            state.auth.logout(&token).await?;
        }
        Ok::<_, ApiError>(())
    }
    .await;

    match revoked {
        Ok(()) => Ok((StatusCode::NO_CONTENT, cleared_refresh_cookie(secure))),
        Err(e) => Err((cleared_refresh_cookie(secure), e)),
    }
}

/// Revoke every session of the authenticated employee
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<LogoutAllResponse>> {
    let revoked = state.auth.logout_all(auth.employee_id).await?;
    Ok(Json(LogoutAllResponse { revoked }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_info_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        let info = client_info(&headers);
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_info_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        let info = client_info(&headers);
        assert!(info.user_agent.is_none());
        assert_eq!(info.ip_address.as_deref(), Some("198.51.100.4"));

        assert!(client_info(&HeaderMap::new()).ip_address.is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            department: String::new(),
            position: String::new(),
        };
        assert!(valid.validate().is_ok());

        let invalid = RegisterRequest {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            ..valid
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_password_limit_counts_bytes() {
        let base = RegisterRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "a".repeat(72),
            department: String::new(),
            position: String::new(),
        };
        assert!(base.validate().is_ok());

        // 72 characters, 144 bytes
        let multibyte = RegisterRequest {
            password: "é".repeat(72),
            ..base
        };
        let errors = multibyte.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields["password"][0].code, "password_bytes");
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let expires_at = Utc::now() + chrono::Duration::days(7);
        let [(name, value)] = refresh_cookie("abc.def.ghi", expires_at, false).unwrap();
        let value = value.to_str().unwrap();

        assert_eq!(name, header::SET_COOKIE);
        assert!(value.starts_with("refresh_token=abc.def.ghi; Path=/v1/auth; Max-Age="));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.ends_with("GMT; HttpOnly; SameSite=Lax"));
        assert!(!value.contains("Secure"));

        let max_age: i64 = value
            .split("; ")
            .find_map(|attr| attr.strip_prefix("Max-Age="))
            .unwrap()
            .parse()
            .unwrap();
        assert!((7 * 86400 - 5..=7 * 86400).contains(&max_age));

        let [(_, secure)] = refresh_cookie("abc", expires_at, true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let [(_, value)] = cleared_refresh_cookie(false);
        let value = value.to_str().unwrap();
        assert!(value.starts_with("refresh_token=; Path=/v1/auth; Max-Age=0;"));
        assert!(value.contains("HttpOnly"));
        assert!(!value.contains("Secure"));

        let [(_, value)] = cleared_refresh_cookie(true);
        assert!(value.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_refresh_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        assert!(refresh_cookie_value(&headers).is_none());

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=tok.en.value; lang=en"),
        );
        assert_eq!(refresh_cookie_value(&headers).as_deref(), Some("tok.en.value"));

        headers.insert(header::COOKIE, HeaderValue::from_static("refresh_token="));
        assert!(refresh_cookie_value(&headers).is_none());
    }

    #[test]
    fn test_cookie_wins_over_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refresh_token=from-cookie"));
        let token = presented_refresh_token(&headers, br#"{"refresh_token": "from-body"}"#).unwrap();
        assert_eq!(token.as_deref(), Some("from-cookie"));

        let headers = HeaderMap::new();
        let token = presented_refresh_token(&headers, br#"{"refresh_token": "from-body"}"#).unwrap();
        assert_eq!(token.as_deref(), Some("from-body"));

        assert!(presented_refresh_token(&headers, b"  ").unwrap().is_none());
        assert!(matches!(
            presented_refresh_token(&headers, b"{oops"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            presented_refresh_token(&headers, br#"{"refresh_token": ""}"#),
            Err(ApiError::ValidationError(_))
        ));
    }
}
