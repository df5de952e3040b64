//! Simulator configuration.
//!
//! Configuration is read from a TOML file with three tables. Every field has
//! a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [general]
//! trace = false
//! max_cycles = 1000
//!
//! [pipeline]
//! forwarding = true
//!
//! [generator]
//! count = 8
//! registers = 8
//! seed = 42
//! ```

use serde::Deserialize;

use crate::common::reg::DEFAULT_REGISTER_COUNT;
use crate::core::engine::DEFAULT_MAX_CYCLES;

const DEFAULT_PROGRAM_LENGTH: usize = 8;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace: bool,

    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_forwarding")]
    pub forwarding: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { forwarding: true }
    }
}

/// Settings for random program generation.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of instructions in a generated program.
    #[serde(default = "default_count")]
    pub count: usize,

    /// Size of the symbolic register namespace (`R0`..`R{registers-1}`).
    #[serde(default = "default_registers")]
    pub registers: u8,

    /// Fixed seed for reproducible programs; OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_PROGRAM_LENGTH,
            registers: DEFAULT_REGISTER_COUNT,
            seed: None,
        }
    }
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_forwarding() -> bool {
    true
}

fn default_count() -> usize {
    DEFAULT_PROGRAM_LENGTH
}

fn default_registers() -> u8 {
    DEFAULT_REGISTER_COUNT
}
