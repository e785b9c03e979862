/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `auth`: Registration, login, token refresh and logout
/// - `employees`: Employee directory
/// - `tasks`: Tasks, status transitions and participants
/// - `messages`: Task message log
/// - `time_entries`: Logged hours and per-task summaries

pub mod auth;
pub mod employees;
pub mod messages;
pub mod tasks;
pub mod time_entries;
