//! Run Reports.
//!
//! Bundles the statistics and cycle history of a finished run into one
//! serializable value for machine-readable output.

use serde::Serialize;

use crate::common::error::Result;
use crate::core::engine::PipelineEngine;
use crate::core::instruction::Instruction;
use crate::stats::{CycleRecord, SimStats};

#[derive(Debug, Serialize)]
pub struct ProgramLine {
    pub id: u64,
    pub text: String,
}

/// Everything a front end needs to redraw a run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub forwarding: bool,
    pub program: Vec<ProgramLine>,
    pub stats: SimStats,
    pub ipc: f64,
    pub history: Vec<CycleRecord>,
}

impl Report {
    /// Captures the engine state after a run of `program`.
    pub fn new(engine: &PipelineEngine, program: &[Instruction]) -> Self {
        let stats = engine.stats();
        Self {
            forwarding: engine.forwarding(),
            program: program
                .iter()
                .map(|inst| ProgramLine {
                    id: inst.id().0,
                    text: inst.to_string(),
                })
                .collect(),
            ipc: stats.ipc(),
            stats,
            history: engine.cycle_history().to_vec(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
