//! Instruction Generator.
//!
//! Produces instructions with randomly assigned symbolic operands. Ids are
//! handed out from a counter owned by the generator, so every instruction a
//! generator creates within a run is unique and numbered in creation order.
//! Resetting the pipeline engine does not touch this counter; call
//! [`InstructionGenerator::reset`] to start numbering again from zero.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::error::{Result, SimError};
use crate::common::reg::{Reg, DEFAULT_REGISTER_COUNT};
use crate::config::GeneratorConfig;
use crate::core::instruction::{Instruction, InstructionId, OpKind};

/// Factory for well-formed instructions.
pub struct InstructionGenerator {
    next_id: u64,
    registers: u8,
    rng: StdRng,
}

impl Default for InstructionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionGenerator {
    /// Creates a generator seeded from OS entropy over `R0`..`R7`.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            registers: DEFAULT_REGISTER_COUNT,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible generator over `R0`..`R7`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            next_id: 0,
            registers: DEFAULT_REGISTER_COUNT,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a generator from the `[generator]` config table.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let mut gen = match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        gen.registers = config.registers.max(1);
        gen
    }

    /// Id the next created instruction will receive.
    pub fn next_id(&self) -> InstructionId {
        InstructionId(self.next_id)
    }

    /// Restarts id assignment from zero. The random stream is not rewound.
    pub fn reset(&mut self) {
        self.next_id = 0;
    }

    fn take_id(&mut self) -> InstructionId {
        let id = InstructionId(self.next_id);
        self.next_id += 1;
        id
    }

    fn random_reg(&mut self) -> Reg {
        Reg::new(self.rng.gen_range(0..self.registers))
    }

    /// Picks an operation kind uniformly.
    pub fn random_kind(&mut self) -> OpKind {
        OpKind::ALL[self.rng.gen_range(0..OpKind::ALL.len())]
    }

    /// Creates an instruction of `kind` with random operands in exactly the
    /// slots the kind requires.
    pub fn create(&mut self, kind: OpKind) -> Instruction {
        let id = self.take_id();
        match kind {
            OpKind::Add | OpKind::Sub | OpKind::Mul => {
                let rd = self.random_reg();
                let rs1 = self.random_reg();
                let rs2 = self.random_reg();
                Instruction::new(id, kind, Some(rd), Some(rs1), Some(rs2))
            }
            OpKind::Load => {
                let rd = self.random_reg();
                let addr = self.random_reg();
                Instruction::new(id, kind, Some(rd), Some(addr), None)
            }
            OpKind::Store => {
                let value = self.random_reg();
                let addr = self.random_reg();
                Instruction::new(id, kind, None, Some(value), Some(addr))
            }
            OpKind::Branch => {
                let cond = self.random_reg();
                Instruction::new(id, kind, None, Some(cond), None)
            }
        }
    }

    /// Creates an instruction of a random kind.
    pub fn random_instruction(&mut self) -> Instruction {
        let kind = self.random_kind();
        self.create(kind)
    }

    /// Creates `count` random instructions in program order.
    pub fn random_program(&mut self, count: usize) -> Vec<Instruction> {
        (0..count).map(|_| self.random_instruction()).collect()
    }

    /// Creates an instruction with caller-chosen operands.
    ///
    /// The operands are validated against the kind before an id is consumed.
    ///
    /// # Arguments
    ///
    /// * `index` - Position in the source program, used only for error reporting
    pub fn build(
        &mut self,
        index: usize,
        kind: OpKind,
        rd: Option<Reg>,
        rs1: Option<Reg>,
        rs2: Option<Reg>,
    ) -> Result<Instruction> {
        let inst = Instruction::new(self.next_id(), kind, rd, rs1, rs2);
        inst.check_operands()
            .map_err(|reason| SimError::MalformedInstruction { index, kind, reason })?;
        self.take_id();
        Ok(inst)
    }
}

/// Counts adjacent pairs where an instruction reads the register its
/// immediate predecessor writes.
///
/// This is the static estimate shown next to a program listing before it is
/// run; the engine's own counters are authoritative.
pub fn count_adjacent_dependencies(program: &[Instruction]) -> usize {
    program
        .windows(2)
        .filter(|pair| {
            pair[0]
                .produced_reg()
                .is_some_and(|reg| pair[1].reads(reg))
        })
        .count()
}
