//! Error types for chain selection and consensus configuration.

use hc_block_index::{IndexError, IntegrityCheckResult};
use shared_types::Hash;
use std::time::Duration;

/// Consensus error types.
///
/// Rule violations are not errors: they are reported as
/// `ImportResult::Invalid` with diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Block index is corrupted ({0}); resync from a known-good point")]
    IndexCorrupted(IntegrityCheckResult),

    #[error("Block index has no genesis")]
    NotInitialized,

    #[error("Header {0:02x?} is indexed but not stored")]
    MissingHeader(Hash),

    #[error("Timed out after {waited:?} waiting for the execution environment")]
    LockTimeout { waited: Duration },

    #[error("Fatal execution error: {0}")]
    ExecutionFatal(String),

    #[error("Chain selector halted after a fatal execution error")]
    Halted,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ConsensusError {
    /// Whether the process must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConsensusError::ExecutionFatal(_))
    }
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}
