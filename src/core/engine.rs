//! Cycle Engine.
//!
//! The engine owns every submitted instruction in an arena and moves arena
//! handles through the four pipeline latches one cycle at a time. A call to
//! [`PipelineEngine::advance_cycle`] performs, in order:
//!
//! 1. Count the cycle.
//! 2. Run hazard detection against the pre-advance latches.
//! 3. Run the forwarding unit against the pre-advance ID/EX occupant.
//! 4. Retire the MEM/WB occupant.
//! 5. Move EX/MEM into MEM/WB.
//! 6. Move ID/EX into EX/MEM, or inject a bubble when stalling.
//! 7. Move IF/ID into ID/EX unless IF/ID is frozen.
//! 8. Hand the fetched instruction to IF/ID and fetch the next one, unless
//!    the program counter is frozen.
//! 9. Record the cycle history row.
//! 10. Evict instructions that completed in an earlier cycle.
//!
//! Latches are written back to front so that every move reads the contents
//! the previous cycle left behind; no instruction can skip a stage.

use crate::config::Config;
use crate::core::instruction::{HazardKind, Instruction, InstructionId, Stage};
use crate::core::pipeline::forwarding;
use crate::core::pipeline::hazards::{self, Stall};
use crate::core::pipeline::latches::{
    ExMem, ExMemEntry, IdEx, IdExEntry, IfId, IfIdEntry, MemWb, MemWbEntry, Slot,
};
use crate::core::pipeline::signals::{ControlSignals, ForwardSource, ForwardingDecision};
use crate::core::pipeline::traits::PipelineLatch;
use crate::stats::{CycleRecord, SimStats};

/// Cycle ceiling used by [`PipelineEngine::simulate`] unless overridden.
pub const DEFAULT_MAX_CYCLES: u64 = 1000;

/// Options for a run-to-completion simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Enable the forwarding unit.
    pub forwarding: bool,
    /// Stop after this many cycles even if instructions remain.
    pub max_cycles: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            forwarding: true,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

impl SimulationOptions {
    /// Builds options from the `[general]` and `[pipeline]` config tables.
    pub fn from_config(config: &Config) -> Self {
        Self {
            forwarding: config.pipeline.forwarding,
            max_cycles: config.general.max_cycles,
        }
    }
}

/// Five-stage in-order pipeline model.
///
/// The engine is single-owner: all state changes go through `&mut self` and
/// every call returns synchronously.
pub struct PipelineEngine {
    arena: Vec<Instruction>,
    live: Vec<Slot>,
    fetch_ptr: usize,
    fetch: Option<Slot>,

    pub if_id: IfId,
    pub id_ex: IdEx,
    pub ex_mem: ExMem,
    pub mem_wb: MemWb,

    signals: ControlSignals,
    forward: ForwardingDecision,
    forwarding: bool,

    stats: SimStats,
    history: Vec<CycleRecord>,

    /// Emit per-cycle diagnostics on stderr.
    pub trace: bool,
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineEngine {
    /// Creates an empty engine with forwarding enabled.
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            live: Vec::new(),
            fetch_ptr: 0,
            fetch: None,
            if_id: IfId::default(),
            id_ex: IdEx::default(),
            ex_mem: ExMem::default(),
            mem_wb: MemWb::default(),
            signals: ControlSignals::default(),
            forward: ForwardingDecision::default(),
            forwarding: true,
            stats: SimStats::default(),
            history: Vec::new(),
            trace: cfg!(feature = "always-trace"),
        }
    }

    /// Creates an engine with forwarding and tracing taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::new();
        engine.set_forwarding(config.pipeline.forwarding);
        engine.set_trace(config.general.trace);
        engine
    }

    /// Appends an instruction to program order.
    ///
    /// The operand slots must match the instruction kind (see
    /// [`Instruction`]); they are not checked here.
    pub fn add_instruction(&mut self, instruction: Instruction) {
        let slot = Slot(self.arena.len());
        self.arena.push(instruction);
        self.live.push(slot);
    }

    /// Enables or disables forwarding from the next cycle on.
    pub fn set_forwarding(&mut self, enabled: bool) {
        self.forwarding = enabled;
    }

    /// Returns `true` when the forwarding unit is enabled.
    pub fn forwarding(&self) -> bool {
        self.forwarding
    }

    /// Enables tracing. Always on when built with `always-trace`.
    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled || cfg!(feature = "always-trace");
    }

    /// Clears latches, counters, history and instructions.
    ///
    /// The forwarding and trace settings are kept. Instruction ids are owned
    /// by the generator and are not affected.
    pub fn reset(&mut self) {
        self.arena.clear();
        self.live.clear();
        self.fetch_ptr = 0;
        self.fetch = None;
        self.if_id.flush();
        self.id_ex.flush();
        self.ex_mem.flush();
        self.mem_wb.flush();
        self.signals = ControlSignals::default();
        self.forward = ForwardingDecision::default();
        self.stats = SimStats::default();
        self.history.clear();
    }

    /// Advances the pipeline by one cycle.
    pub fn advance_cycle(&mut self) {
        self.stats.cycles += 1;
        let cycle = self.stats.cycles;

        // Hazard detection
        let check = hazards::detect(
            &self.if_id,
            &self.id_ex,
            &self.ex_mem,
            &self.mem_wb,
            self.forwarding,
        );
        self.signals = check.signals;
        if let Some(stall) = check.stall {
            self.record_stall(stall, cycle);
        }

        // Forwarding
        self.forward = if self.forwarding {
            forwarding::resolve(&self.id_ex, &self.ex_mem, &self.mem_wb)
        } else {
            ForwardingDecision::default()
        };
        // Counted once, in the cycle the operands issue from ID/EX.
        if !self.signals.idex_zero {
            self.stats.forwarded_operands += self.forward.forwarded_operands();
        }
        if self.trace {
            self.trace_forwarding(cycle);
        }

        // Retire
        if let Some(wb) = self.mem_wb.entry.take() {
            self.arena[wb.slot.0].enter(Stage::Complete, cycle);
            self.stats.instructions_completed += 1;
        }

        // EX/MEM -> MEM/WB
        if let Some(mem) = self.ex_mem.entry.take() {
            self.arena[mem.slot.0].enter(Stage::Wb, cycle);
            self.mem_wb.entry = Some(MemWbEntry::from(&mem));
        }

        // ID/EX -> EX/MEM, or a bubble
        if self.signals.idex_zero {
            self.ex_mem = ExMem::bubble();
        } else if let Some(ex) = self.id_ex.entry.take() {
            self.arena[ex.slot.0].enter(Stage::Mem, cycle);
            self.ex_mem.entry = Some(ExMemEntry::from(&ex));
        }

        // IF/ID -> ID/EX; frozen in place while stalling
        if self.signals.ifid_write {
            self.id_ex.entry = self.if_id.entry.take().map(|id| {
                let inst = &mut self.arena[id.slot.0];
                inst.enter(Stage::Ex, cycle);
                inst.clear_hazard();
                IdExEntry::decode(id.slot, inst)
            });
        }

        // Fetch
        if self.signals.pc_write {
            self.if_id.entry = self.fetch.take().map(|slot| {
                let inst = &mut self.arena[slot.0];
                inst.enter(Stage::Id, cycle);
                IfIdEntry::new(slot, inst)
            });
            if self.fetch_ptr < self.arena.len() {
                let slot = Slot(self.fetch_ptr);
                self.arena[slot.0].enter(Stage::If, cycle);
                self.fetch = Some(slot);
                self.fetch_ptr += 1;
            }
        }

        let record = CycleRecord {
            cycle,
            stages: [
                self.id_of(self.fetch),
                self.id_of(self.if_id.occupant()),
                self.id_of(self.id_ex.occupant()),
                self.id_of(self.ex_mem.occupant()),
                self.id_of(self.mem_wb.occupant()),
            ],
            stalled: self.signals.is_stall(),
            bubble: self.signals.idex_zero,
            hazard_detected: check.stall.is_some(),
            forwarding: self.forward,
        };
        if self.trace {
            eprintln!("[Cycle {:>4}] {}", cycle, record.diagram());
        }
        self.history.push(record);

        let arena = &self.arena;
        self.live.retain(|slot| {
            let inst = &arena[slot.0];
            !(inst.is_complete() && inst.cycle() < cycle)
        });
    }

    /// Resets, loads `instructions` in program order and runs until every
    /// instruction has left the pipeline or `options.max_cycles` is reached.
    ///
    /// # Returns
    ///
    /// The cycle history of the run. An empty program yields an empty history.
    pub fn simulate<I>(&mut self, instructions: I, options: SimulationOptions) -> Vec<CycleRecord>
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.reset();
        self.set_forwarding(options.forwarding);
        for inst in instructions {
            self.add_instruction(inst);
        }

        while !self.live.is_empty() && self.stats.cycles < options.max_cycles {
            self.advance_cycle();
        }

        if !self.live.is_empty() && self.trace {
            eprintln!(
                "[Engine] stopped at cycle ceiling {} with {} instruction(s) live",
                options.max_cycles,
                self.live.len()
            );
        }

        self.history.clone()
    }

    /// Copies of the live instructions, in program order.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.live.iter().map(|slot| self.arena[slot.0].clone()).collect()
    }

    /// Looks up any instruction submitted since the last reset, including
    /// ones already evicted from the live set.
    pub fn find(&self, id: InstructionId) -> Option<&Instruction> {
        self.arena.iter().find(|inst| inst.id() == id)
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SimStats {
        SimStats {
            instructions_in_pipeline: self.live.len() as u64,
            ..self.stats.clone()
        }
    }

    /// Per-cycle trace since the last reset.
    pub fn cycle_history(&self) -> &[CycleRecord] {
        &self.history
    }

    /// Control lines decided in the most recent cycle.
    pub fn control_signals(&self) -> ControlSignals {
        self.signals
    }

    /// Forwarding decision made in the most recent cycle.
    pub fn forwarding_decision(&self) -> ForwardingDecision {
        self.forward
    }

    /// Returns `true` once no submitted instruction remains live.
    pub fn is_drained(&self) -> bool {
        self.live.is_empty()
    }

    fn id_of(&self, slot: Option<Slot>) -> Option<InstructionId> {
        slot.map(|s| self.arena[s.0].id())
    }

    fn record_stall(&mut self, stall: Stall, cycle: u64) {
        self.arena[stall.consumer.0].mark_stalled(stall.kind);
        if let Some(entry) = self.if_id.entry.as_mut() {
            entry.held = true;
        }

        self.stats.hazards_detected += 1;
        self.stats.stalls_inserted += 1;
        match stall.kind {
            HazardKind::Raw => self.stats.raw_hazards += 1,
            HazardKind::LoadUse => self.stats.load_use_hazards += 1,
            HazardKind::None => {}
        }

        if self.trace {
            eprintln!(
                "[Hazard] cycle={} {} {} on {} (producer {})",
                cycle,
                self.arena[stall.consumer.0].id(),
                stall.kind,
                stall.reg,
                self.arena[stall.producer.0].id()
            );
        }
    }

    fn trace_forwarding(&self, cycle: u64) {
        let Some(ex) = self.id_ex.entry.as_ref() else {
            return;
        };
        let id = self.arena[ex.slot.0].id();
        for (name, reg, src) in [("rs1", ex.rs1, self.forward.a), ("rs2", ex.rs2, self.forward.b)] {
            if src == ForwardSource::None {
                continue;
            }
            if let Some(reg) = reg {
                eprintln!(
                    "[Forward] cycle={} {} {}={} Source={}",
                    cycle,
                    id,
                    name,
                    reg,
                    src.label()
                );
            }
        }
    }
}
