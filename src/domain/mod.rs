//! Domain layer - Pure business abstractions
//!
//! Only the error taxonomy shared by the lending, analytics and catalog
//! services lives here.

pub mod errors;

pub use errors::DomainError;
