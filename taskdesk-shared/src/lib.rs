//! # TaskDesk Shared Library
//!
//! Domain types, storage, and business logic used by the TaskDesk API server.
//!
//! ## Module Organization
//!
//! - `auth`: Credential hashing, token issuing, refresh sessions, and the auth flows
//! - `db`: PostgreSQL pool, migrations, and the `PgStore` gateway
//! - `store`: Storage traits and the in-memory gateway
//! - `models`: Persisted data structures
//! - `tasks`: Task lifecycle engine, messages, and time entries
//! - `employees`: Employee directory
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod db;
pub mod employees;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
