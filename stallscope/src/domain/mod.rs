//! Domain model for stallscope
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting function signatures
//! - Structured error handling

pub mod config;
pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use config::RunConfig;
pub use errors::{AdapterError, ConfigError, DetectorError, ExportError, TaskError};
pub use types::{Millis, TaskId, TaskKind, TaskStatus};
