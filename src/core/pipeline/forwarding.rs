//! Register Forwarding Unit.
//!
//! Decides, for each source operand of the instruction in ID/EX, whether the
//! value can be taken from a later pipeline latch instead of the register
//! file. EX/MEM is always checked before MEM/WB: it holds the younger
//! producer, so when two in-flight instructions write the same register the
//! nearer one wins.

use crate::common::reg::Reg;
use crate::core::pipeline::latches::{ExMem, IdEx, MemWb};
use crate::core::pipeline::signals::{ForwardSource, ForwardingDecision};

/// Resolves the operand sources for the ID/EX occupant.
///
/// # Arguments
///
/// * `id_ex` - The ID/EX latch holding the consumer
/// * `ex_mem` - The EX/MEM latch (one stage ahead)
/// * `mem_wb` - The MEM/WB latch (two stages ahead)
///
/// # Returns
///
/// A decision with both slots `None` when ID/EX is empty or nothing matches.
pub fn resolve(id_ex: &IdEx, ex_mem: &ExMem, mem_wb: &MemWb) -> ForwardingDecision {
    let Some(consumer) = id_ex.entry.as_ref() else {
        return ForwardingDecision::default();
    };

    ForwardingDecision {
        a: source_for(consumer.rs1, ex_mem, mem_wb),
        b: source_for(consumer.rs2, ex_mem, mem_wb),
    }
}

fn source_for(src: Option<Reg>, ex_mem: &ExMem, mem_wb: &MemWb) -> ForwardSource {
    let Some(src) = src else {
        return ForwardSource::None;
    };

    let ex_mem_rd = ex_mem.entry.as_ref().and_then(|e| e.writes());
    if ex_mem_rd == Some(src) {
        return ForwardSource::ExMem;
    }

    let mem_wb_rd = mem_wb.entry.as_ref().and_then(|e| e.writes());
    if mem_wb_rd == Some(src) {
        return ForwardSource::MemWb;
    }

    ForwardSource::None
}
