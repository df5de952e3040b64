//! Pipeline core.
//!
//! Contains the instruction model, the instruction generator, the pipeline
//! units (latches, hazard detection, forwarding) and the cycle engine that
//! drives them.

/// Cycle engine: owns instructions and latches, advances one cycle per call.
pub mod engine;

/// Random and validated instruction construction.
pub mod generator;

/// Instruction identity and pipeline progress.
pub mod instruction;

/// Pipeline latches, control signals, hazard detection and forwarding.
pub mod pipeline;

pub use engine::{PipelineEngine, SimulationOptions};
pub use generator::InstructionGenerator;
pub use instruction::{HazardKind, Instruction, InstructionId, OpKind, Stage};
