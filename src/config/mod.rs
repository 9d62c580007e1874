//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, inspection ceiling, estimation split, etc.)
//! - Logging and resolver selection enums
//! - The `AnalyzerConfig` struct

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{AnalyzerConfig, LogFormat, LogLevel, ResolverKind};
