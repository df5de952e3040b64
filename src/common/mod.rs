//! Common types shared across the pipeline simulator.
//!
//! This module provides the symbolic register namespace and the error type
//! used by the configuration and program loaders.

/// Error types for configuration and program loading.
pub mod error;

/// Symbolic register names.
pub mod reg;

pub use error::{Result, SimError};
pub use reg::{Reg, DEFAULT_REGISTER_COUNT};
