// ABOUTME: Library root for relevo - exposes public modules for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod error;
pub mod probe;
pub mod routes;
pub mod runtime;
pub mod types;
