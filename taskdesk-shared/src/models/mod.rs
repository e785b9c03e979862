/// Persisted data structures
///
/// Plain data types shared by the storage gateways and the services. None of
/// these types talk to storage themselves; see [`crate::store`] and
/// [`crate::db`] for that.
///
/// # Models
///
/// - `employee`: Employees and their (optional) password hash
/// - `session`: Refresh sessions, stored by token digest
/// - `task`: Tasks and the status enum
/// - `participant`: Task membership with roles
/// - `message`: Task message log (user and system messages)
/// - `time_entry`: Logged hours and per-task summaries

pub mod employee;
pub mod message;
pub mod participant;
pub mod session;
pub mod task;
pub mod time_entry;

/// Error returned when parsing a string into a closed enum fails
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
