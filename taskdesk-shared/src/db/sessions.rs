use super::PgStore;
use crate::models::session::{NewRefreshSession, RefreshSession};
use crate::store::{SessionRepository, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
impl SessionRepository for PgStore {
    async fn insert_session(&self, new: NewRefreshSession) -> StoreResult<RefreshSession> {
        let session = sqlx::query_as::<_, RefreshSession>(
            r#"
            INSERT INTO refresh_sessions (employee_id, token_digest, expires_at, user_agent, ip_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.employee_id)
        .bind(new.token_digest)
        .bind(new.expires_at)
        .bind(new.user_agent)
        .bind(new.ip_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_session_by_digest(&self, digest: &str) -> StoreResult<Option<RefreshSession>> {
        let session = sqlx::query_as::<_, RefreshSession>(
            "SELECT * FROM refresh_sessions WHERE token_digest = $1",
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn revoke_session(&self, digest: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET revoked_at = $2
            WHERE token_digest = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(digest)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume_session(
        &self,
        digest: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshSession>> {
        // Single statement: the row lock taken by UPDATE decides the race.
        let session = sqlx::query_as::<_, RefreshSession>(
            r#"
            UPDATE refresh_sessions
            SET revoked_at = $2
            WHERE token_digest = $1 AND revoked_at IS NULL AND expires_at > $2
            RETURNING *
            "#,
        )
        .bind(digest)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn revoke_all_sessions(&self, employee_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET revoked_at = $2
            WHERE employee_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
        revoked_before: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_sessions WHERE expires_at < $1 OR revoked_at < $2",
        )
        .bind(now)
        .bind(revoked_before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
