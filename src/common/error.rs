//! Simulator error types.
//!
//! The pipeline engine itself never fails; everything here comes from the
//! outer layers that read configuration files, parse programs and emit
//! reports.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::instruction::OpKind;

/// Errors raised while loading configuration, loading programs, or
/// serializing reports.
#[derive(Error, Debug)]
pub enum SimError {
    /// A configuration or program file could not be read.
    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A TOML document did not match the expected schema.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A register name outside the `R<n>` namespace.
    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    /// An operation mnemonic that is not part of the instruction set.
    #[error("unknown operation '{0}'")]
    UnknownOp(String),

    /// Operand slots do not match the instruction kind.
    #[error("instruction #{index} ({kind}): {reason}")]
    MalformedInstruction {
        index: usize,
        kind: OpKind,
        reason: String,
    },

    /// Report serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used by the loaders.
pub type Result<T> = std::result::Result<T, SimError>;
