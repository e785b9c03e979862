//! # TaskDesk API Server Library
//!
//! HTTP surface of TaskDesk: employee authentication, the employee
//! directory, tasks with their message log, and time tracking.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Json/Path/Query extractors that reject with `ApiError`
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
