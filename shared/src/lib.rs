//! Shared types and models for the Paintrack warehouse platform
//!
//! This crate contains domain types shared between the backend service and
//! any future clients: inventory models, status enums, and the validation
//! rules that must hold before the engine takes any lock.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
