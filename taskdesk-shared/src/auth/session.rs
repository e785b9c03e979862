/// Refresh session store
///
/// Wraps a [`SessionRepository`] with the session rules:
///
/// - only the digest of a refresh token is stored or looked up
/// - a session is usable iff it is unrevoked and unexpired
/// - a session is revoked at most once
/// - expired sessions, and sessions revoked longer ago than the retention
///   window, are purged by [`SessionStore::delete_expired`]

use crate::auth::jwt::IssuedToken;
use crate::error::{AppError, AppResult};
use crate::models::session::{ClientInfo, NewRefreshSession, RefreshSession};
use crate::store::SessionRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// How long revoked sessions are kept for auditing
pub const DEFAULT_REVOKED_RETENTION_DAYS: i64 = 30;

#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
}

impl SessionStore {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    /// Persists the session for a freshly issued refresh token
    pub async fn create(
        &self,
        refresh: &IssuedToken,
        client: ClientInfo,
    ) -> AppResult<RefreshSession> {
        let session = self
            .repo
            .insert_session(NewRefreshSession {
                employee_id: refresh.employee_id,
                token_digest: crate::auth::jwt::digest(&refresh.token),
                expires_at: refresh.expires_at,
                user_agent: client.user_agent,
                ip_address: client.ip_address,
            })
            .await?;
        Ok(session)
    }

    /// Finds a session by digest
    ///
    /// # Errors
    ///
    /// `Unauthorized` if no session has this digest.
    pub async fn lookup(&self, digest: &str) -> AppResult<RefreshSession> {
        self.repo
            .find_session_by_digest(digest)
            .await?
            .ok_or_else(AppError::invalid_token)
    }

    /// Finds a session by digest and requires it to be valid at `now`
    pub async fn lookup_valid(&self, digest: &str, now: DateTime<Utc>) -> AppResult<RefreshSession> {
        let session = self.lookup(digest).await?;
        if !session.is_valid_at(now) {
            tracing::warn!(
                employee_id = %session.employee_id,
                revoked = session.revoked_at.is_some(),
                "Rejected refresh with an unusable session"
            );
            return Err(AppError::invalid_token());
        }
        Ok(session)
    }

    /// Revokes a session only if still valid; the loser of a concurrent
    /// consumption gets `Unauthorized`
    pub async fn consume(&self, digest: &str, now: DateTime<Utc>) -> AppResult<RefreshSession> {
        self.repo
            .consume_session(digest, now)
            .await?
            .ok_or_else(AppError::invalid_token)
    }

    /// Revokes a session
    ///
    /// # Errors
    ///
    /// `NotFound` if the session is absent or already revoked.
    pub async fn revoke(&self, digest: &str) -> AppResult<()> {
        if self.repo.revoke_session(digest, Utc::now()).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("session not found or already revoked".to_string()))
        }
    }

    /// Revokes every session of an employee; idempotent
    pub async fn revoke_all(&self, employee_id: Uuid) -> AppResult<u64> {
        Ok(self.repo.revoke_all_sessions(employee_id, Utc::now()).await?)
    }

    /// Purges expired sessions and sessions revoked before `now - retention`
    ///
    /// # Errors
    ///
    /// `BadRequest` if the retention reaches past the representable dates.
    pub async fn delete_expired(&self, retention: Duration) -> AppResult<u64> {
        let now = Utc::now();
        let revoked_before = now.checked_sub_signed(retention).ok_or_else(|| {
            AppError::BadRequest("session retention window out of range".to_string())
        })?;
        Ok(self
            .repo
            .delete_expired_sessions(now, revoked_before)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn issued(employee_id: Uuid, token: &str, expires_in: Duration) -> IssuedToken {
        IssuedToken {
            token: token.to_string(),
            employee_id,
            expires_at: Utc::now() + expires_in,
        }
    }

    fn store() -> (SessionStore, MemoryStore) {
        let memory = MemoryStore::new();
        (SessionStore::new(Arc::new(memory.clone())), memory)
    }

    #[tokio::test]
    async fn test_create_stores_digest_not_token() {
        let (sessions, _) = store();
        let token = issued(Uuid::new_v4(), "raw-refresh-token", Duration::days(7));

        let session = sessions
            .create(
                &token,
                ClientInfo {
                    user_agent: Some("curl/8.0".to_string()),
                    ip_address: Some("10.0.0.1".to_string()),
                },
            )
            .await
            .unwrap();

        assert_ne!(session.token_digest, "raw-refresh-token");
        assert_eq!(session.token_digest, crate::auth::jwt::digest("raw-refresh-token"));
        assert_eq!(session.user_agent.as_deref(), Some("curl/8.0"));
        assert!(session.revoked_at.is_none());
    }

    #[tokio::test]
    async fn test_lookup_missing_is_unauthorized() {
        let (sessions, _) = store();
        assert!(matches!(
            sessions.lookup("missing").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_valid_rejects_expired_and_revoked() {
        let (sessions, _) = store();
        let employee_id = Uuid::new_v4();
        let expired = issued(employee_id, "expired", Duration::seconds(-1));
        let revoked = issued(employee_id, "revoked", Duration::days(1));
        sessions.create(&expired, ClientInfo::default()).await.unwrap();
        sessions.create(&revoked, ClientInfo::default()).await.unwrap();
        sessions.revoke(&crate::auth::jwt::digest("revoked")).await.unwrap();

        let now = Utc::now();
        for token in ["expired", "revoked"] {
            let result = sessions
                .lookup_valid(&crate::auth::jwt::digest(token), now)
                .await;
            assert!(matches!(result, Err(AppError::Unauthorized(_))), "{}", token);
        }
    }

    #[tokio::test]
    async fn test_revoke_twice_is_not_found() {
        let (sessions, _) = store();
        let token = issued(Uuid::new_v4(), "once", Duration::days(1));
        sessions.create(&token, ClientInfo::default()).await.unwrap();
        let digest = crate::auth::jwt::digest("once");

        sessions.revoke(&digest).await.unwrap();
        assert!(matches!(
            sessions.revoke(&digest).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            sessions.revoke("absent").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_is_idempotent() {
        let (sessions, _) = store();
        let employee_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        for (owner, token) in [(employee_id, "a"), (employee_id, "b"), (other, "c")] {
            sessions
                .create(&issued(owner, token, Duration::days(1)), ClientInfo::default())
                .await
                .unwrap();
        }

        assert_eq!(sessions.revoke_all(employee_id).await.unwrap(), 2);
        assert_eq!(sessions.revoke_all(employee_id).await.unwrap(), 0);

        let untouched = sessions.lookup(&crate::auth::jwt::digest("c")).await.unwrap();
        assert!(untouched.revoked_at.is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_recent_revocations() {
        let (sessions, memory) = store();
        let employee_id = Uuid::new_v4();
        sessions
            .create(&issued(employee_id, "gone", Duration::hours(-2)), ClientInfo::default())
            .await
            .unwrap();
        sessions
            .create(&issued(employee_id, "kept", Duration::days(1)), ClientInfo::default())
            .await
            .unwrap();
        sessions.revoke(&crate::auth::jwt::digest("kept")).await.unwrap();

        let deleted = sessions
            .delete_expired(Duration::days(DEFAULT_REVOKED_RETENTION_DAYS))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(memory.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_expired_rejects_unrepresentable_retention() {
        let (sessions, memory) = store();
        sessions
            .create(
                &issued(Uuid::new_v4(), "stale", Duration::hours(-1)),
                ClientInfo::default(),
            )
            .await
            .unwrap();

        let result = sessions.delete_expired(Duration::MAX).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(memory.session_count().await, 1);
    }
}
