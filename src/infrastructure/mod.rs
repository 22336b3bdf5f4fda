//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Configuration loading (config)
//! - Database connection and schema (db)
//! - Repository implementations (repositories)
//! - Application state (state)
//! - Service registration and pipeline assembly (startup)
//! - HTTP server (server)

pub mod config;
pub mod db;
pub mod repositories;
pub mod server;
pub mod startup;
pub mod state;

pub use repositories::*;
pub use startup::{Startup, StartupError};
pub use state::AppState;
