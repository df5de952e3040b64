//! Simulation harness: configuration and program loading, and run reports.

/// Configuration and program loaders.
pub mod loader;

/// Serializable run reports.
pub mod report;
