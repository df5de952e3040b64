//! Five-Stage Pipeline Hazard Simulator Library.
//!
//! This crate models the cycle-by-cycle behavior of a classic in-order
//! pipeline (Fetch, Decode, Execute, Memory, Writeback) running a small
//! synthetic instruction set. It detects data hazards, optionally resolves
//! them by forwarding, and records statistics plus a full per-cycle trace.
//!
//! Registers are symbolic: the simulator tracks which instruction produces
//! and consumes which register, not the values themselves.
//!
//! # Modules
//!
//! * `common`: Symbolic registers and error types.
//! * `config`: Configuration loading and parsing.
//! * `core`: Instruction model, generator, pipeline units and cycle engine.
//! * `sim`: Program loading and run reports.
//! * `stats`: Counters and cycle history.

/// Symbolic registers and error types.
pub mod common;

/// Configuration for tracing, cycle limits, forwarding and program generation.
///
/// Parsed from TOML; every field has a default.
pub mod config;

/// Instruction model, generator, pipeline units and the cycle engine.
pub mod core;

/// Program loading and serializable run reports.
pub mod sim;

/// Pipeline statistics and the per-cycle history.
pub mod stats;
