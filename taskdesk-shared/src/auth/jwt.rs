/// Access and refresh token issuing
///
/// [`TokenIssuer`] signs and verifies the two token kinds used by the auth
/// flows. It is built once from an immutable [`TokenConfig`] and shared
/// behind an `Arc` for the lifetime of the process.
///
/// # Token Kinds
///
/// - **Access token**: carries employee id, email and name. Expires after
///   `access_ttl_minutes` (default 15). Never persisted.
/// - **Refresh token**: carries the employee id as subject and a random
///   `jti`. Expires after `refresh_ttl_days` (default 7). Persisted only as
///   its [`digest`].
///
/// # Verification
///
/// Only the HMAC family (HS256/HS384/HS512) is accepted. Signature, issuer,
/// expiry, not-before and token kind are checked, and every failure is
/// reported as the same [`TokenError::InvalidToken`].
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{TokenConfig, TokenIssuer};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new(TokenConfig::new("a-long-random-secret"))?;
///
/// let refresh = issuer.issue_refresh(Uuid::new_v4())?;
/// let claims = issuer.verify_refresh(&refresh.token)?;
/// assert_eq!(claims.sub, refresh.employee_id);
/// # Ok(())
/// # }
/// ```

use crate::models::employee::Employee;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Issuer claim written into every token
pub const DEFAULT_ISSUER: &str = "taskdesk";

pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// One year
pub const MAX_ACCESS_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Ten years
pub const MAX_REFRESH_TTL_DAYS: i64 = 3650;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The signing secret is empty
    #[error("JWT secret must not be empty")]
    EmptySecret,

    /// A configured lifetime is not positive or exceeds its ceiling
    #[error("Token lifetime out of range")]
    InvalidLifetime,

    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Any verification failure
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Immutable token settings
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: String,

    /// Value of the `iss` claim
    pub issuer: String,

    pub access_ttl_minutes: i64,

    pub refresh_ttl_days: i64,
}

impl TokenConfig {
    /// Settings with default issuer and lifetimes
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

/// Token kind, embedded as a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - employee ID
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub employee_id: Uuid,
    pub email: String,
    pub name: String,
    pub token_type: TokenType,
}

/// Refresh token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - employee ID
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token ID, makes every refresh token distinct
    pub jti: Uuid,
    pub token_type: TokenType,
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub employee_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access and refresh tokens
pub struct TokenIssuer {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    /// Builds an issuer
    ///
    /// # Errors
    ///
    /// - `TokenError::EmptySecret` if the secret is empty
    /// - `TokenError::InvalidLifetime` if either lifetime is not positive or
    ///   exceeds [`MAX_ACCESS_TTL_MINUTES`] / [`MAX_REFRESH_TTL_DAYS`]
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if !(1..=MAX_ACCESS_TTL_MINUTES).contains(&config.access_ttl_minutes)
            || !(1..=MAX_REFRESH_TTL_DAYS).contains(&config.refresh_ttl_days)
        {
            return Err(TokenError::InvalidLifetime);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.config.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.config.refresh_ttl_days)
    }

    /// Signs an access token for an employee
    pub fn issue_access(&self, employee: &Employee) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.access_ttl();

        let claims = AccessClaims {
            sub: employee.id,
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            employee_id: employee.id,
            email: employee.email.clone(),
            name: employee.name.clone(),
            token_type: TokenType::Access,
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            employee_id: employee.id,
            expires_at,
        })
    }

    /// Signs a refresh token with a fresh `jti`
    pub fn issue_refresh(&self, employee_id: Uuid) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.refresh_ttl();

        let claims = RefreshClaims {
            sub: employee_id,
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            employee_id,
            expires_at,
        })
    }

    /// Verifies an access token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.verify(token)?;
        if claims.token_type != TokenType::Access || claims.employee_id != claims.sub {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verifies a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::CreateError(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                TokenError::InvalidToken
            })
    }
}

/// Lookup digest of a refresh token: hex-encoded SHA-256
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig::new(SECRET)).expect("issuer")
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Ada Lovelace".to_string(),
            department: "Engineering".to_string(),
            position: "Analyst".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn encode_with(claims: &impl Serialize, alg: Algorithm, secret: &str) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("encode")
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            TokenIssuer::new(TokenConfig::new("")),
            Err(TokenError::EmptySecret)
        ));
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        let mut config = TokenConfig::new(SECRET);
        config.access_ttl_minutes = 0;
        assert!(matches!(
            TokenIssuer::new(config),
            Err(TokenError::InvalidLifetime)
        ));
    }

    #[test]
    fn test_lifetime_ceilings() {
        let mut config = TokenConfig::new(SECRET);
        config.access_ttl_minutes = MAX_ACCESS_TTL_MINUTES;
        config.refresh_ttl_days = MAX_REFRESH_TTL_DAYS;
        let issuer = TokenIssuer::new(config.clone()).expect("ceilings are inclusive");
        assert!(issuer.issue_refresh(Uuid::new_v4()).is_ok());
        assert!(issuer.issue_access(&employee()).is_ok());

        let mut access = config.clone();
        access.access_ttl_minutes = MAX_ACCESS_TTL_MINUTES + 1;
        assert!(matches!(
            TokenIssuer::new(access),
            Err(TokenError::InvalidLifetime)
        ));

        let mut refresh = config;
        refresh.refresh_ttl_days = 200_000_000;
        assert!(matches!(
            TokenIssuer::new(refresh),
            Err(TokenError::InvalidLifetime)
        ));
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let rendered = format!("{:?}", TokenConfig::new(SECRET));
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = issuer();
        let employee = employee();

        let issued = issuer.issue_access(&employee).expect("issue");
        let claims = issuer.verify_access(&issued.token).expect("verify");

        assert_eq!(claims.sub, employee.id);
        assert_eq!(claims.employee_id, employee.id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_access_token_expires_after_configured_minutes() {
        let mut config = TokenConfig::new(SECRET);
        config.access_ttl_minutes = 42;
        let issuer = TokenIssuer::new(config).expect("issuer");

        let issued = issuer.issue_access(&employee()).expect("issue");
        let claims = issuer.verify_access(&issued.token).expect("verify");

        assert_eq!(claims.exp - claims.iat, 42 * 60);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let issuer = issuer();
        let employee_id = Uuid::new_v4();

        let issued = issuer.issue_refresh(employee_id).expect("issue");
        let claims = issuer.verify_refresh(&issued.token).expect("verify");

        assert_eq!(claims.sub, employee_id);
        assert_eq!(claims.exp - claims.iat, DEFAULT_REFRESH_TTL_DAYS * 24 * 3600);
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let issuer = issuer();
        let employee_id = Uuid::new_v4();

        let first = issuer.issue_refresh(employee_id).expect("issue");
        let second = issuer.issue_refresh(employee_id).expect("issue");

        assert_ne!(first.token, second.token);
        assert_ne!(digest(&first.token), digest(&second.token));
    }

    #[test]
    fn test_token_kinds_do_not_cross_verify() {
        let issuer = issuer();
        let employee = employee();

        let access = issuer.issue_access(&employee).expect("access");
        let refresh = issuer.issue_refresh(employee.id).expect("refresh");

        assert!(matches!(
            issuer.verify_refresh(&access.token),
            Err(TokenError::InvalidToken)
        ));
        assert!(matches!(
            issuer.verify_access(&refresh.token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = issuer().issue_refresh(Uuid::new_v4()).expect("issue");
        let other = TokenIssuer::new(TokenConfig::new("a-completely-different-secret")).expect("issuer");
        assert!(matches!(
            other.verify_refresh(&issued.token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issued = issuer().issue_refresh(Uuid::new_v4()).expect("issue");
        let mut config = TokenConfig::new(SECRET);
        config.issuer = "someone-else".to_string();
        let other = TokenIssuer::new(config).expect("issuer");
        assert!(matches!(
            other.verify_refresh(&issued.token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: Uuid::new_v4(),
            iss: DEFAULT_ISSUER.to_string(),
            iat: now - 7200,
            nbf: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };
        let token = encode_with(&claims, Algorithm::HS256, SECRET);

        assert!(matches!(
            issuer().verify_refresh(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_not_yet_valid_token_rejected() {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: Uuid::new_v4(),
            iss: DEFAULT_ISSUER.to_string(),
            iat: now,
            nbf: now + 3600,
            exp: now + 7200,
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };
        let token = encode_with(&claims, Algorithm::HS256, SECRET);

        assert!(issuer().verify_refresh(&token).is_err());
    }

    #[test]
    fn test_other_hmac_algorithms_accepted() {
        let issuer = issuer();
        let issued = issuer.issue_refresh(Uuid::new_v4()).expect("issue");
        let claims = issuer.verify_refresh(&issued.token).expect("verify");

        let hs512 = encode_with(&claims, Algorithm::HS512, SECRET);
        assert_eq!(issuer.verify_refresh(&hs512).expect("verify").jti, claims.jti);
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let issuer = issuer();
        let issued = issuer.issue_access(&employee()).expect("issue");
        let payload = issued.token.split('.').nth(1).expect("payload segment");

        // {"alg":"none","typ":"JWT"}
        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);

        assert!(matches!(
            issuer.verify_access(&forged),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = issuer();
        let mut token = issuer.issue_access(&employee()).expect("issue").token;
        token.push('x');
        assert!(issuer.verify_access(&token).is_err());
        assert!(issuer.verify_access("not.a.jwt").is_err());
        assert!(issuer.verify_access("").is_err());
    }

    #[test]
    fn test_digest_is_deterministic_hex_sha256() {
        let first = digest("some-refresh-token");
        assert_eq!(first, digest("some-refresh-token"));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, digest("some-other-token"));
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
