//! Symbolic Register Names.
//!
//! Registers hold no values in this simulator. They exist so the hazard
//! detection and forwarding units can match a consumer's source operands
//! against a producer's destination. `R0` is hardwired to zero: writes to it
//! are discarded and therefore never create a dependency.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::SimError;

/// Default size of the register namespace (`R0`..`R7`).
pub const DEFAULT_REGISTER_COUNT: u8 = 8;

/// A symbolic register, rendered as `R<index>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reg(u8);

impl Reg {
    /// The always-zero register.
    pub const ZERO: Reg = Reg(0);

    /// Creates a register from its index.
    pub const fn new(idx: u8) -> Self {
        Self(idx)
    }

    /// Returns the register index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Returns `true` for the hardwired zero register.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("R{}", self.0))
    }
}

impl FromStr for Reg {
    type Err = SimError;

    /// Parses `R3` or `r3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .strip_prefix('R')
            .or_else(|| trimmed.strip_prefix('r'))
            .and_then(|idx| idx.parse::<u8>().ok())
            .map(Reg)
            .ok_or_else(|| SimError::UnknownRegister(s.to_string()))
    }
}

impl TryFrom<String> for Reg {
    type Error = SimError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Reg> for String {
    fn from(reg: Reg) -> Self {
        reg.to_string()
    }
}
