// ABOUTME: Library root for shipwatch - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod github;
pub mod handlers;
pub mod track;
