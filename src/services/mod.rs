//! Services Layer
//!
//! Business logic kept apart from the HTTP handlers: the lending engine, the
//! analytics reports and catalog administration. Services take a
//! `DatabaseConnection` and can be called directly or through axum.

pub mod analytics_service;
pub mod catalog_service;
pub mod lending_service;

// Re-export for convenience
pub use lending_service::{borrow, delete_reader, report_lost, return_copy, ReaderDeletion};
