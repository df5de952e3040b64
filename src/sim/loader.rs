//! Configuration and Program Loading.
//!
//! Reads the TOML configuration and TOML program listings from disk. A
//! program is a list of `[[instructions]]` tables:
//!
//! ```toml
//! [[instructions]]
//! op = "LOAD"
//! rd = "R1"
//! rs1 = "R2"
//!
//! [[instructions]]
//! op = "ADD"
//! rd = "R3"
//! rs1 = "R1"
//! rs2 = "R4"
//! ```
//!
//! Every entry is checked against its kind's operand rule before an id is
//! assigned, so the engine only ever sees well-formed instructions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::{Result, SimError};
use crate::common::reg::Reg;
use crate::config::Config;
use crate::core::generator::InstructionGenerator;
use crate::core::instruction::{Instruction, OpKind};

#[derive(Debug, Deserialize)]
struct ProgramFile {
    #[serde(default)]
    instructions: Vec<ProgramEntry>,
}

#[derive(Debug, Deserialize)]
struct ProgramEntry {
    op: String,
    rd: Option<String>,
    rs1: Option<String>,
    rs2: Option<String>,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_reg(name: Option<&str>) -> Result<Option<Reg>> {
    name.map(str::parse::<Reg>).transpose()
}

/// Parses a configuration document.
pub fn parse_config(text: &str) -> Result<Config> {
    Ok(toml::from_str(text)?)
}

/// Reads and parses a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    parse_config(&read(path.as_ref())?)
}

/// Parses a program listing, numbering instructions with `gen`.
pub fn parse_program(text: &str, gen: &mut InstructionGenerator) -> Result<Vec<Instruction>> {
    let file: ProgramFile = toml::from_str(text)?;

    file.instructions
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let kind: OpKind = entry.op.parse()?;
            gen.build(
                index,
                kind,
                parse_reg(entry.rd.as_deref())?,
                parse_reg(entry.rs1.as_deref())?,
                parse_reg(entry.rs2.as_deref())?,
            )
        })
        .collect()
}

/// Reads and parses a program file.
pub fn load_program(
    path: impl AsRef<Path>,
    gen: &mut InstructionGenerator,
) -> Result<Vec<Instruction>> {
    parse_program(&read(path.as_ref())?, gen)
}
