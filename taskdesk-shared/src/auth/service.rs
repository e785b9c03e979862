/// Authentication flows
///
/// [`AuthService`] ties the hasher, the token issuer, the session store and
/// the employee directory together:
///
/// ```text
/// issued --(valid, before expiry)--> refreshed --(old revoked, new issued)--> issued
/// issued --(logout)--> revoked
/// issued --(expiry elapses)--> expired (purged by the sweeper)
/// ```
///
/// Every credential failure surfaces as the same `Unauthorized` message so
/// callers cannot tell a missing account from a wrong password.

use crate::auth::jwt::{self, TokenIssuer};
use crate::auth::password::CredentialHasher;
use crate::auth::session::SessionStore;
use crate::error::{AppError, AppResult};
use crate::models::employee::{Employee, NewEmployee};
use crate::models::session::ClientInfo;
use crate::store::EmployeeStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Input for self-registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub position: String,
}

/// Token pair handed to a client after login or refresh
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub employee: Employee,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    employees: Arc<dyn EmployeeStore>,
    sessions: SessionStore,
    tokens: Arc<TokenIssuer>,
    hasher: CredentialHasher,
}

impl AuthService {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        sessions: SessionStore,
        tokens: Arc<TokenIssuer>,
        hasher: CredentialHasher,
    ) -> Self {
        Self {
            employees,
            sessions,
            tokens,
            hasher,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenIssuer> {
        &self.tokens
    }

    /// Creates an employee with a password
    ///
    /// # Errors
    ///
    /// - `Conflict` if a live employee already has the email
    /// - `BadRequest` if the password exceeds the hasher's ceiling
    pub async fn register(&self, registration: Registration) -> AppResult<Employee> {
        if self
            .employees
            .find_employee_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "an employee with this email already exists".to_string(),
            ));
        }

        let password_hash = self.hash_password(registration.password).await?;

        // A concurrent registration can still trip the unique index; the
        // resulting UniqueViolation maps to Conflict as well.
        let employee = self
            .employees
            .insert_employee(NewEmployee {
                name: registration.name,
                department: registration.department,
                position: registration.position,
                email: registration.email,
                password_hash: Some(password_hash),
            })
            .await?;

        tracing::info!(employee_id = %employee.id, "Employee registered");
        Ok(employee)
    }

    /// Verifies credentials and opens a new session
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> AppResult<AuthSession> {
        let Some(employee) = self.employees.find_employee_by_email(email).await? else {
            tracing::warn!("Login rejected: unknown email");
            return Err(AppError::invalid_credentials());
        };

        let Some(stored_hash) = employee.password_hash.clone() else {
            tracing::warn!(employee_id = %employee.id, "Login rejected: no password set");
            return Err(AppError::invalid_credentials());
        };

        if !self.verify_password(password.to_string(), stored_hash).await? {
            tracing::warn!(employee_id = %employee.id, "Login rejected: wrong password");
            return Err(AppError::invalid_credentials());
        }

        let session = self.open_session(employee, client).await?;
        tracing::info!(employee_id = %session.employee.id, "Employee logged in");
        Ok(session)
    }

    /// Rotates a refresh token: the presented one is revoked, a new pair issued
    ///
    /// If the new session cannot be persisted the old one stays revoked and
    /// the caller must log in again.
    pub async fn refresh(&self, refresh_token: &str, client: ClientInfo) -> AppResult<AuthSession> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let digest = jwt::digest(refresh_token);
        let now = Utc::now();

        let session = self.sessions.lookup_valid(&digest, now).await?;
        if session.employee_id != claims.sub {
            tracing::warn!(
                employee_id = %claims.sub,
                session_owner = %session.employee_id,
                "Refresh rejected: subject does not own the session"
            );
            return Err(AppError::invalid_token());
        }

        let employee = self
            .employees
            .find_employee(claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::warn!(employee_id = %claims.sub, "Refresh rejected: employee gone");
                AppError::invalid_token()
            })?;

        // Conditional revoke: only one concurrent refresh of this token wins
        self.sessions.consume(&digest, now).await?;

        match self.open_session(employee, client).await {
            Ok(rotated) => {
                tracing::info!(employee_id = %rotated.employee.id, "Refresh token rotated");
                Ok(rotated)
            }
            Err(e) => {
                tracing::error!(
                    employee_id = %claims.sub,
                    error = %e,
                    "Refresh session revoked but its replacement could not be stored"
                );
                Err(e)
            }
        }
    }

    /// Revokes the session of a refresh token
    ///
    /// Unknown or already revoked sessions are not an error.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        match self.sessions.revoke(&jwt::digest(refresh_token)).await {
            Ok(()) => {
                tracing::info!("Session revoked");
                Ok(())
            }
            Err(AppError::NotFound(_)) => {
                tracing::debug!("Logout for an unknown or revoked session");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Revokes every session of an employee, returning how many were live
    pub async fn logout_all(&self, employee_id: Uuid) -> AppResult<u64> {
        let revoked = self.sessions.revoke_all(employee_id).await?;
        tracing::info!(employee_id = %employee_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    async fn open_session(&self, employee: Employee, client: ClientInfo) -> AppResult<AuthSession> {
        let access = self.tokens.issue_access(&employee)?;
        let refresh = self.tokens.issue_refresh(employee.id)?;
        self.sessions.create(&refresh, client).await?;

        Ok(AuthSession {
            employee,
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
        })
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::internal("password hashing task failed", e))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, stored_hash: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AppError::internal("password verification task failed", e))??;
        Ok(matches)
    }
}
