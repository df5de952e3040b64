//! Data Hazard Detection.
//!
//! Inspects the pipeline latches at the start of a cycle and decides whether
//! the front of the pipeline must stall. Two hazards are recognised, checked
//! in priority order:
//!
//! 1. **Load-use**: the instruction in ID/EX is a load and the instruction in
//!    IF/ID reads its destination. Forwarding cannot help because the loaded
//!    value only exists after MEM, so this stalls regardless of forwarding.
//! 2. **RAW**: with forwarding disabled, the instruction in IF/ID reads the
//!    destination of an in-flight producer. ID/EX (the immediate
//!    predecessor) is checked first, then EX/MEM, then MEM/WB.
//!
//! A stall freezes IF and IF/ID for one cycle and sends a bubble down the
//! pipeline. An IF/ID entry that has already been held for a cycle is
//! released on the next check, so each hazard costs exactly one stall cycle.

use crate::common::reg::Reg;
use crate::core::instruction::HazardKind;
use crate::core::pipeline::latches::{ExMem, IdEx, IfId, MemWb, Slot};
use crate::core::pipeline::signals::ControlSignals;

/// A stall decided by the hazard unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stall {
    /// Instruction held in IF/ID.
    pub consumer: Slot,
    /// Instruction whose result the consumer waits for.
    pub producer: Slot,
    /// Register carrying the dependency.
    pub reg: Reg,
    /// Hazard classification.
    pub kind: HazardKind,
}

/// Outcome of one hazard check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HazardCheck {
    /// Control lines for this cycle.
    pub signals: ControlSignals,
    /// The stall event, if one fired.
    pub stall: Option<Stall>,
}

/// Checks for a load-use hazard between ID/EX and IF/ID.
///
/// # Arguments
///
/// * `id_ex` - The ID/EX latch (possible load producer)
/// * `if_id` - The IF/ID latch (possible consumer)
///
/// # Returns
///
/// The stall to insert, or `None` when no load-use dependency exists.
pub fn need_stall_load_use(id_ex: &IdEx, if_id: &IfId) -> Option<Stall> {
    let ex_inst = id_ex.entry.as_ref()?;
    let id_inst = if_id.entry.as_ref()?;

    if !ex_inst.ctrl.mem_read {
        return None;
    }
    let rd = ex_inst.writes()?;

    id_inst.reads(rd).then_some(Stall {
        consumer: id_inst.slot,
        producer: ex_inst.slot,
        reg: rd,
        kind: HazardKind::LoadUse,
    })
}

/// Checks for a read-after-write hazard that needs a stall when results
/// cannot be forwarded.
///
/// # Arguments
///
/// * `id_ex` - The ID/EX latch (immediate predecessor)
/// * `ex_mem` - The EX/MEM latch
/// * `mem_wb` - The MEM/WB latch
/// * `if_id` - The IF/ID latch (possible consumer)
///
/// # Returns
///
/// A stall against the nearest matching producer, or `None`.
pub fn need_stall_raw(id_ex: &IdEx, ex_mem: &ExMem, mem_wb: &MemWb, if_id: &IfId) -> Option<Stall> {
    let id_inst = if_id.entry.as_ref()?;

    let producers = [
        id_ex.entry.as_ref().map(|e| (e.slot, e.writes())),
        ex_mem.entry.as_ref().map(|e| (e.slot, e.writes())),
        mem_wb.entry.as_ref().map(|e| (e.slot, e.writes())),
    ];

    producers.into_iter().flatten().find_map(|(slot, rd)| {
        let rd = rd?;
        id_inst.reads(rd).then_some(Stall {
            consumer: id_inst.slot,
            producer: slot,
            reg: rd,
            kind: HazardKind::Raw,
        })
    })
}

/// Runs the hazard detection unit against the current latch contents.
///
/// # Arguments
///
/// * `if_id` - The IF/ID latch
/// * `id_ex` - The ID/EX latch
/// * `ex_mem` - The EX/MEM latch
/// * `mem_wb` - The MEM/WB latch
/// * `forwarding` - Whether the forwarding unit is enabled this cycle
///
/// # Returns
///
/// Permissive signals and no stall unless a hazard fires, in which case all
/// three control lines are restrictive.
pub fn detect(
    if_id: &IfId,
    id_ex: &IdEx,
    ex_mem: &ExMem,
    mem_wb: &MemWb,
    forwarding: bool,
) -> HazardCheck {
    if if_id.entry.as_ref().is_some_and(|e| e.held) {
        return HazardCheck::default();
    }

    let stall = need_stall_load_use(id_ex, if_id).or_else(|| {
        if forwarding {
            None
        } else {
            need_stall_raw(id_ex, ex_mem, mem_wb, if_id)
        }
    });

    match stall {
        Some(stall) => HazardCheck {
            signals: ControlSignals::stall(),
            stall: Some(stall),
        },
        None => HazardCheck::default(),
    }
}
