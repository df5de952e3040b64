//! Instruction Model.
//!
//! An [`Instruction`] pairs an immutable identity (id, operation kind and
//! symbolic operands) with the mutable progress the cycle engine records as
//! the instruction moves through the pipeline. Only the engine changes the
//! progress fields; the operands are fixed at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::SimError;
use crate::common::reg::Reg;

/// Program-order identifier, unique within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionId(pub u64);

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("I{}", self.0))
    }
}

/// Operation kinds of the synthetic instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Load,
    Store,
    Branch,
}

impl OpKind {
    /// Every operation kind, in mnemonic order.
    pub const ALL: [OpKind; 6] = [
        OpKind::Add,
        OpKind::Sub,
        OpKind::Mul,
        OpKind::Load,
        OpKind::Store,
        OpKind::Branch,
    ];

    /// Returns the upper-case mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpKind::Add => "ADD",
            OpKind::Sub => "SUB",
            OpKind::Mul => "MUL",
            OpKind::Load => "LOAD",
            OpKind::Store => "STORE",
            OpKind::Branch => "BRANCH",
        }
    }

    /// `true` for kinds that write a destination register.
    pub fn writes_register(self) -> bool {
        matches!(self, OpKind::Add | OpKind::Sub | OpKind::Mul | OpKind::Load)
    }

    /// `true` for kinds that read data memory (the only load-use producers).
    pub fn reads_memory(self) -> bool {
        matches!(self, OpKind::Load)
    }

    /// Number of source operands the kind requires.
    pub fn source_count(self) -> usize {
        match self {
            OpKind::Add | OpKind::Sub | OpKind::Mul | OpKind::Store => 2,
            OpKind::Load | OpKind::Branch => 1,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

impl FromStr for OpKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.mnemonic().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SimError::UnknownOp(s.to_string()))
    }
}

/// Pipeline stage an instruction currently occupies.
///
/// Stages are ordered; an instruction's stage never moves backwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    #[default]
    If,
    Id,
    Ex,
    Mem,
    Wb,
    Complete,
}

impl Stage {
    /// The five in-flight stages, front to back.
    pub const PIPELINE: [Stage; 5] = [Stage::If, Stage::Id, Stage::Ex, Stage::Mem, Stage::Wb];

    /// Returns the following stage; `Complete` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::If => Stage::Id,
            Stage::Id => Stage::Ex,
            Stage::Ex => Stage::Mem,
            Stage::Mem => Stage::Wb,
            Stage::Wb | Stage::Complete => Stage::Complete,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::If => "IF",
            Stage::Id => "ID",
            Stage::Ex => "EX",
            Stage::Mem => "MEM",
            Stage::Wb => "WB",
            Stage::Complete => "COMPLETE",
        };
        f.pad(name)
    }
}

/// Classification of the hazard that stalled an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardKind {
    #[default]
    None,
    /// Read-after-write on a value still in flight (forwarding disabled).
    Raw,
    /// Consumer directly behind a load whose data is not ready until after MEM.
    LoadUse,
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HazardKind::None => "NONE",
            HazardKind::Raw => "RAW",
            HazardKind::LoadUse => "LOAD_USE",
        };
        f.pad(name)
    }
}

/// A single instruction and its pipeline progress.
///
/// Instructions are normally produced by the
/// [`InstructionGenerator`](crate::core::generator::InstructionGenerator),
/// which guarantees that the operand slots match the kind:
///
/// | kind            | `rd` | `rs1`     | `rs2`   |
/// |-----------------|------|-----------|---------|
/// | ADD / SUB / MUL | yes  | yes       | yes     |
/// | LOAD            | yes  | address   | -       |
/// | STORE           | -    | value     | address |
/// | BRANCH          | -    | condition | -       |
///
/// [`Instruction::new`] does not validate; hazard detection on a mismatched
/// instruction is undefined. Use [`Instruction::check_operands`] when the
/// operands come from an untrusted source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instruction {
    id: InstructionId,
    kind: OpKind,
    rd: Option<Reg>,
    rs1: Option<Reg>,
    rs2: Option<Reg>,

    stage: Stage,
    cycle: u64,
    is_stalled: bool,
    has_hazard: bool,
    hazard: HazardKind,
}

impl Instruction {
    /// Creates an instruction in stage IF at cycle 0 without validating the operands.
    pub fn new(
        id: InstructionId,
        kind: OpKind,
        rd: Option<Reg>,
        rs1: Option<Reg>,
        rs2: Option<Reg>,
    ) -> Self {
        Self {
            id,
            kind,
            rd,
            rs1,
            rs2,
            stage: Stage::If,
            cycle: 0,
            is_stalled: false,
            has_hazard: false,
            hazard: HazardKind::None,
        }
    }

    /// `rd <- rs1 op rs2` for ADD, SUB and MUL.
    pub fn alu(id: u64, kind: OpKind, rd: Reg, rs1: Reg, rs2: Reg) -> Self {
        Self::new(InstructionId(id), kind, Some(rd), Some(rs1), Some(rs2))
    }

    /// `rd <- MEM[addr]`.
    pub fn load(id: u64, rd: Reg, addr: Reg) -> Self {
        Self::new(InstructionId(id), OpKind::Load, Some(rd), Some(addr), None)
    }

    /// `MEM[addr] <- value`.
    pub fn store(id: u64, value: Reg, addr: Reg) -> Self {
        Self::new(InstructionId(id), OpKind::Store, None, Some(value), Some(addr))
    }

    /// Conditional branch on `cond`.
    pub fn branch(id: u64, cond: Reg) -> Self {
        Self::new(InstructionId(id), OpKind::Branch, None, Some(cond), None)
    }

    /// Verifies that the populated operand slots match the kind.
    ///
    /// # Returns
    ///
    /// `Err` with a human-readable reason when a required slot is empty or a
    /// forbidden slot is filled.
    pub fn check_operands(&self) -> Result<(), String> {
        let wants_rd = self.kind.writes_register();
        let wants_rs2 = self.kind.source_count() == 2;

        if wants_rd != self.rd.is_some() {
            return Err(if wants_rd {
                "missing destination register".to_string()
            } else {
                "does not take a destination register".to_string()
            });
        }
        if self.rs1.is_none() {
            return Err("missing first source register".to_string());
        }
        if wants_rs2 != self.rs2.is_some() {
            return Err(if wants_rs2 {
                "missing second source register".to_string()
            } else {
                "does not take a second source register".to_string()
            });
        }
        Ok(())
    }

    pub fn id(&self) -> InstructionId {
        self.id
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn rd(&self) -> Option<Reg> {
        self.rd
    }

    pub fn rs1(&self) -> Option<Reg> {
        self.rs1
    }

    pub fn rs2(&self) -> Option<Reg> {
        self.rs2
    }

    /// Destination that can feed a later instruction: `rd` unless it is `R0`.
    pub fn produced_reg(&self) -> Option<Reg> {
        self.rd.filter(|r| !r.is_zero())
    }

    /// Returns `true` when either source operand names `reg`.
    pub fn reads(&self, reg: Reg) -> bool {
        self.rs1 == Some(reg) || self.rs2 == Some(reg)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Cycle in which the instruction last changed stage.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_stalled(&self) -> bool {
        self.is_stalled
    }

    pub fn has_hazard(&self) -> bool {
        self.has_hazard
    }

    pub fn hazard(&self) -> HazardKind {
        self.hazard
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }

    /// Moves the instruction to `stage`, stamping `cycle`.
    pub(crate) fn enter(&mut self, stage: Stage, cycle: u64) {
        debug_assert!(stage >= self.stage, "{} cannot regress from {} to {}", self.id, self.stage, stage);
        self.stage = stage;
        self.cycle = cycle;
    }

    pub(crate) fn mark_stalled(&mut self, kind: HazardKind) {
        self.is_stalled = true;
        self.has_hazard = true;
        self.hazard = kind;
    }

    pub(crate) fn clear_hazard(&mut self) {
        self.is_stalled = false;
        self.has_hazard = false;
        self.hazard = HazardKind::None;
    }

    /// Data-flow form used by listings: `R1 = R2 + R3`, `R1 = MEM[R2]`,
    /// `MEM[R2] = R1`, `BRANCH if R1`.
    pub fn describe(&self) -> String {
        let show = |r: Option<Reg>| r.map_or_else(|| "?".to_string(), |r| r.to_string());
        match self.kind {
            OpKind::Add | OpKind::Sub | OpKind::Mul => {
                let op = match self.kind {
                    OpKind::Add => '+',
                    OpKind::Sub => '-',
                    _ => '*',
                };
                format!("{} = {} {} {}", show(self.rd), show(self.rs1), op, show(self.rs2))
            }
            OpKind::Load => format!("{} = MEM[{}]", show(self.rd), show(self.rs1)),
            OpKind::Store => format!("MEM[{}] = {}", show(self.rs2), show(self.rs1)),
            OpKind::Branch => format!("BRANCH if {}", show(self.rs1)),
        }
    }
}

impl fmt::Display for Instruction {
    /// Assembly form: `ADD R1, R2, R3`, `LOAD R1, [R2]`, `STORE R1, [R2]`, `BRANCH R1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |r: Option<Reg>| r.map_or_else(|| "?".to_string(), |r| r.to_string());
        match self.kind {
            OpKind::Add | OpKind::Sub | OpKind::Mul => write!(
                f,
                "{} {}, {}, {}",
                self.kind,
                show(self.rd),
                show(self.rs1),
                show(self.rs2)
            ),
            OpKind::Load => write!(f, "LOAD {}, [{}]", show(self.rd), show(self.rs1)),
            OpKind::Store => write!(f, "STORE {}, [{}]", show(self.rs1), show(self.rs2)),
            OpKind::Branch => write!(f, "BRANCH {}", show(self.rs1)),
        }
    }
}
