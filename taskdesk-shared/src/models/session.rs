/// Refresh session model
///
/// One row per issued refresh token. Only the SHA-256 digest of the token is
/// stored; the raw token leaves the process once and is never persisted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
///     token_digest TEXT NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     revoked_at TIMESTAMPTZ,
///     user_agent TEXT,
///     ip_address TEXT
/// );
/// ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Persisted refresh session
///
/// Deliberately not `Serialize`: the digest and row id stay server-side.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshSession {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl RefreshSession {
    /// Valid iff not revoked and not yet expired
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

/// Input for persisting a session
#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    pub employee_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Advisory client metadata recorded with a session
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
