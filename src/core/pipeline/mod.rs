//! Instruction pipeline implementation.
//!
//! This module contains the pipeline latches for inter-stage communication,
//! the hazard detection and forwarding units, and the control signals that
//! connect them to the cycle engine.

/// Register forwarding unit.
pub mod forwarding;

/// Data hazard detection unit.
pub mod hazards;

/// Inter-stage pipeline latches (IF/ID, ID/EX, EX/MEM, MEM/WB).
pub mod latches;

/// Decode-time control bits, hazard control lines and forwarding selects.
pub mod signals;

/// Common interface over the four latches.
pub mod traits;
