//! Pipeline control signals and operand source selection.
//!
//! This module defines the per-instruction control bits produced at decode
//! and carried through the latches, the three hazard control lines that gate
//! the front of the pipeline, and the forwarding unit's operand source
//! selection.

use serde::Serialize;

use crate::core::instruction::OpKind;

/// Control bits generated when an instruction is decoded.
///
/// These travel with the instruction through ID/EX, EX/MEM and MEM/WB so that
/// each stage can decide what the occupant does without consulting the
/// instruction itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodedControl {
    /// Instruction writes its destination register in WB.
    pub reg_write: bool,
    /// Instruction reads data memory in MEM (load).
    pub mem_read: bool,
}

impl DecodedControl {
    /// Decodes the control bits for an operation kind.
    pub fn for_kind(kind: OpKind) -> Self {
        Self {
            reg_write: kind.writes_register(),
            mem_read: kind.reads_memory(),
        }
    }
}

/// Hazard control lines, recomputed once per cycle.
///
/// The default is fully permissive. Only the hazard detection unit pulls the
/// lines to their restrictive values, and always all three together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlSignals {
    /// The fetch stage may hand its instruction to IF/ID and admit the next one.
    pub pc_write: bool,
    /// The IF/ID occupant may advance into ID/EX.
    pub ifid_write: bool,
    /// Inject a bubble downstream of ID/EX instead of advancing its occupant.
    pub idex_zero: bool,
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self {
            pc_write: true,
            ifid_write: true,
            idex_zero: false,
        }
    }
}

impl ControlSignals {
    /// Signals that freeze the front of the pipeline and insert one bubble.
    pub fn stall() -> Self {
        Self {
            pc_write: false,
            ifid_write: false,
            idex_zero: true,
        }
    }

    /// Returns `true` if any line is in its restrictive state.
    pub fn is_stall(&self) -> bool {
        !self.pc_write || !self.ifid_write || self.idex_zero
    }
}

/// Where an EX-stage source operand is taken from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForwardSource {
    /// Register file (no forwarding).
    #[default]
    None,
    /// Result of the instruction currently in EX/MEM.
    ExMem,
    /// Result of the instruction currently in MEM/WB.
    MemWb,
}

impl ForwardSource {
    /// Label used in trace output and the cycle table.
    pub fn label(self) -> &'static str {
        match self {
            ForwardSource::None => "RegFile",
            ForwardSource::ExMem => "EX_MEM",
            ForwardSource::MemWb => "MEM_WB",
        }
    }
}

/// Forwarding unit output for the two source slots of the ID/EX occupant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ForwardingDecision {
    /// Source of the first operand (`rs1`).
    pub a: ForwardSource,
    /// Source of the second operand (`rs2`).
    pub b: ForwardSource,
}

impl ForwardingDecision {
    /// Number of operands satisfied from a later stage.
    pub fn forwarded_operands(&self) -> u64 {
        [self.a, self.b]
            .iter()
            .filter(|src| **src != ForwardSource::None)
            .count() as u64
    }
}
