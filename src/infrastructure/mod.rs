//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and migrations (db)
//! - Configuration loading (config)
//! - HTTP router assembly (server)
//! - Demo data and the scripted demonstration (seed, demo)
//! - Application state (state)

pub mod config;
pub mod db;
pub mod demo;
pub mod seed;
pub mod server;
pub mod state;

pub use state::AppState;
