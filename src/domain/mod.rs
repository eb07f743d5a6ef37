//! Domain layer for the adaptest toolkit
//!
//! This module contains the core data model and the ports the services depend on.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{RunnerError, StoreError, StoreResult, SynthesizerError};
