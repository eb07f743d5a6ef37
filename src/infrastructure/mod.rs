//! Infrastructure layer module
//!
//! This module contains infrastructure adapters and external integrations:
//! - Configuration management
//! - Logging infrastructure
//! - Test synthesizer HTTP client
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod synthesizer;
