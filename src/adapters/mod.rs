//! Adapters for persistence and external systems.

pub mod json;
pub mod memory;
pub mod pytest;
