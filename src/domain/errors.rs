//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use std::fmt;

use sea_orm::{DbErr, SqlErr};

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Referenced entity (copy, reader, book...) does not exist
    NotFound(String),
    /// Operation not valid for the current entity state; the message carries that state
    InvalidState(String),
    /// Input rejected before or by a storage constraint (duplicate email, bad year...)
    Validation(String),
    /// Storage or connectivity failure, surfaced unchanged
    Database(String),
}

impl DomainError {
    /// Translates a unique/foreign-key violation raised by storage into a
    /// domain error built by `on_constraint`; any other error stays a
    /// database error.
    pub fn from_constraint(e: DbErr, on_constraint: impl FnOnce(&str) -> DomainError) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail))
            | Some(SqlErr::ForeignKeyConstraintViolation(detail)) => on_constraint(&detail),
            _ => DomainError::Database(e.to_string()),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            DomainError::Validation(msg) => write!(f, "Validation error: {}", msg),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}
