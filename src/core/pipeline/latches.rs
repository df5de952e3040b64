//! Pipeline latch structures for inter-stage communication.
//!
//! Each latch sits on a stage boundary and holds at most one in-flight
//! instruction. Latches never own instructions: they carry a [`Slot`] handle
//! into the engine's instruction arena plus the control bits the downstream
//! stage needs.

use crate::common::reg::Reg;
use crate::core::instruction::Instruction;
use crate::core::pipeline::signals::DecodedControl;

/// Handle to an instruction in the engine's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(pub usize);

/// Entry in the IF/ID latch (Fetch to Decode). The occupant is in stage ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfIdEntry {
    /// Arena handle of the instruction.
    pub slot: Slot,
    /// First source register.
    pub rs1: Option<Reg>,
    /// Second source register.
    pub rs2: Option<Reg>,
    /// Set while the entry is frozen by a stall; the stall is served once
    /// the entry has been held for a cycle.
    pub held: bool,
}

impl IfIdEntry {
    pub fn new(slot: Slot, inst: &Instruction) -> Self {
        Self {
            slot,
            rs1: inst.rs1(),
            rs2: inst.rs2(),
            held: false,
        }
    }

    /// Returns `true` if either source operand names `reg`.
    pub fn reads(&self, reg: Reg) -> bool {
        self.rs1 == Some(reg) || self.rs2 == Some(reg)
    }
}

/// Entry in the ID/EX latch (Decode to Execute). The occupant is in stage EX.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdExEntry {
    /// Arena handle of the instruction.
    pub slot: Slot,
    /// First source register.
    pub rs1: Option<Reg>,
    /// Second source register.
    pub rs2: Option<Reg>,
    /// Destination register.
    pub rd: Option<Reg>,
    /// Control bits for downstream stages.
    pub ctrl: DecodedControl,
}

impl IdExEntry {
    /// Decodes an instruction into its ID/EX form.
    pub fn decode(slot: Slot, inst: &Instruction) -> Self {
        Self {
            slot,
            rs1: inst.rs1(),
            rs2: inst.rs2(),
            rd: inst.rd(),
            ctrl: DecodedControl::for_kind(inst.kind()),
        }
    }

    /// Register this entry will write, ignoring the zero register.
    pub fn writes(&self) -> Option<Reg> {
        written_reg(self.rd, &self.ctrl)
    }
}

/// Entry in the EX/MEM latch (Execute to Memory). The occupant is in stage MEM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExMemEntry {
    /// Arena handle of the instruction.
    pub slot: Slot,
    /// Destination register.
    pub rd: Option<Reg>,
    /// Control bits for downstream stages.
    pub ctrl: DecodedControl,
}

impl ExMemEntry {
    /// Register this entry will write, ignoring the zero register.
    pub fn writes(&self) -> Option<Reg> {
        written_reg(self.rd, &self.ctrl)
    }
}

impl From<&IdExEntry> for ExMemEntry {
    fn from(e: &IdExEntry) -> Self {
        Self {
            slot: e.slot,
            rd: e.rd,
            ctrl: e.ctrl,
        }
    }
}

/// Entry in the MEM/WB latch (Memory to Writeback). The occupant is in stage WB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemWbEntry {
    /// Arena handle of the instruction.
    pub slot: Slot,
    /// Destination register.
    pub rd: Option<Reg>,
    /// Control bits for the writeback stage.
    pub ctrl: DecodedControl,
}

impl MemWbEntry {
    /// Register this entry will write, ignoring the zero register.
    pub fn writes(&self) -> Option<Reg> {
        written_reg(self.rd, &self.ctrl)
    }
}

impl From<&ExMemEntry> for MemWbEntry {
    fn from(e: &ExMemEntry) -> Self {
        Self {
            slot: e.slot,
            rd: e.rd,
            ctrl: e.ctrl,
        }
    }
}

fn written_reg(rd: Option<Reg>, ctrl: &DecodedControl) -> Option<Reg> {
    if !ctrl.reg_write {
        return None;
    }
    rd.filter(|r| !r.is_zero())
}

/// IF/ID pipeline latch.
#[derive(Clone, Debug, Default)]
pub struct IfId {
    pub entry: Option<IfIdEntry>,
}

/// ID/EX pipeline latch.
#[derive(Clone, Debug, Default)]
pub struct IdEx {
    pub entry: Option<IdExEntry>,
}

/// EX/MEM pipeline latch.
#[derive(Clone, Debug, Default)]
pub struct ExMem {
    pub entry: Option<ExMemEntry>,
}

impl ExMem {
    /// An empty latch standing in for a no-op.
    pub fn bubble() -> Self {
        Self { entry: None }
    }
}

/// MEM/WB pipeline latch.
#[derive(Clone, Debug, Default)]
pub struct MemWb {
    pub entry: Option<MemWbEntry>,
}
