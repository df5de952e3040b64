//! Simulation statistics and cycle history.
//!
//! Tracks cumulative pipeline counters and the per-cycle occupancy trace that
//! replaces per-cycle console logging as the queryable record of a run.

use serde::Serialize;

use crate::core::instruction::{InstructionId, Stage};
use crate::core::pipeline::signals::ForwardingDecision;

/// Cumulative counters for one run.
///
/// `instructions_in_pipeline` is filled in when a snapshot is taken; the
/// other counters only ever grow until the engine is reset.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimStats {
    pub cycles: u64,
    pub instructions_completed: u64,
    pub instructions_in_pipeline: u64,

    pub hazards_detected: u64,
    pub stalls_inserted: u64,
    pub raw_hazards: u64,
    pub load_use_hazards: u64,

    /// Source operands taken from a later latch, counted as they issue to EX.
    pub forwarded_operands: u64,
}

impl SimStats {
    /// Instructions completed per cycle; 0 before the first cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_completed as f64 / self.cycles as f64
        }
    }

    /// Cycles per completed instruction; 0 until something completes.
    pub fn cpi(&self) -> f64 {
        if self.instructions_completed == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_completed as f64
        }
    }

    /// Prints a formatted summary of the counters.
    pub fn print(&self) {
        let cyc = if self.cycles == 0 { 1 } else { self.cycles };

        println!("\n==========================================================");
        println!("PIPELINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.instructions_completed);
        println!("sim_in_flight            {}", self.instructions_in_pipeline);
        println!("sim_ipc                  {:.4}", self.ipc());
        println!("sim_cpi                  {:.4}", self.cpi());
        println!("----------------------------------------------------------");
        println!("HAZARDS");
        println!("  hazards.detected       {}", self.hazards_detected);
        println!("  hazards.raw            {}", self.raw_hazards);
        println!("  hazards.load_use       {}", self.load_use_hazards);
        println!(
            "  stalls.inserted        {} ({:.2}%)",
            self.stalls_inserted,
            (self.stalls_inserted as f64 / cyc as f64) * 100.0
        );
        println!("----------------------------------------------------------");
        println!("FORWARDING");
        println!("  fwd.operands           {}", self.forwarded_operands);
        println!("==========================================================");
    }
}

/// One row of the cycle history.
///
/// Recorded after all latches have moved for the cycle and never modified
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleRecord {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Occupant of IF, ID, EX, MEM and WB, in that order.
    pub stages: [Option<InstructionId>; 5],
    /// The front of the pipeline was frozen this cycle.
    pub stalled: bool,
    /// A bubble was injected this cycle.
    pub bubble: bool,
    /// The hazard unit flagged a dependency this cycle.
    pub hazard_detected: bool,
    /// Operand sources chosen for the instruction that was in EX.
    pub forwarding: ForwardingDecision,
}

impl CycleRecord {
    /// Instruction occupying `stage` after this cycle, if any.
    ///
    /// `Stage::Complete` is not a pipeline position and always yields `None`.
    pub fn at(&self, stage: Stage) -> Option<InstructionId> {
        Stage::PIPELINE
            .iter()
            .position(|s| *s == stage)
            .and_then(|idx| self.stages[idx])
    }

    /// Returns `true` when no stage is occupied.
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Option::is_none)
    }

    /// Renders the row as `IF:I5 -> ID:I4 -> EX:I3 -> MEM:-- -> WB:I2`.
    pub fn diagram(&self) -> String {
        Stage::PIPELINE
            .iter()
            .zip(self.stages.iter())
            .map(|(stage, occ)| match occ {
                Some(id) => format!("{}:{}", stage, id),
                None => format!("{}:--", stage),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
