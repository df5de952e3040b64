//! Pipeline latch interface.
//!
//! Gives the engine one way to clear, inspect and report the occupant of any
//! of the four latches.

use crate::core::pipeline::latches::{ExMem, IdEx, IfId, MemWb, Slot};

/// Represents a pipeline latch (inter-stage buffer).
pub trait PipelineLatch {
    /// Arena handle of the occupant, if any.
    fn occupant(&self) -> Option<Slot>;

    /// Clears the latch.
    fn flush(&mut self);

    /// A latch is valid while it holds an in-flight instruction.
    fn is_valid(&self) -> bool {
        self.occupant().is_some()
    }
}

macro_rules! impl_latch {
    ($($latch:ty),*) => {
        $(
            impl PipelineLatch for $latch {
                fn occupant(&self) -> Option<Slot> {
                    self.entry.as_ref().map(|e| e.slot)
                }

                fn flush(&mut self) {
                    self.entry = None;
                }
            }
        )*
    };
}

impl_latch!(IfId, IdEx, ExMem, MemWb);
