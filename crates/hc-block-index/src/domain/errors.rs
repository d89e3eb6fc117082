//! # Domain Errors
//!
//! Error types for the block index.
//!
//! ## Design Principles
//!
//! - Storage and codec failures are wrapped, never swallowed
//! - Unrecoverable index corruption is reported through
//!   `IntegrityCheckResult`, not through these errors

use shared_types::Hash;
use thiserror::Error;

/// Errors raised by the block index store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Underlying key-value store failed.
    #[error("Database error: {0}")]
    Database(#[from] KVStoreError),

    /// A persisted record could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// A header record failed its checksum.
    #[error("Header record for {hash:02x?} is corrupted: expected checksum {expected}, got {actual}")]
    HeaderCorrupted {
        hash: Hash,
        expected: u32,
        actual: u32,
    },

    /// The same hash was listed twice in one level.
    #[error("Duplicate block {hash:02x?} at level {level}")]
    DuplicateInfo { level: u64, hash: Hash },

    /// Levels must be written without gaps.
    #[error("Cannot write level {level}: index has {size} levels")]
    LevelGap { level: u64, size: u64 },

    /// A level record must hold at least one block.
    #[error("Cannot write an empty record at level {level}")]
    EmptyLevel { level: u64 },

    /// Genesis level was written with the wrong shape.
    #[error("Genesis level must contain exactly one main-chain record, got {count}")]
    InvalidGenesisLevel { count: usize },

    /// Header passed as genesis is not at height 0.
    #[error("Header at height {number} cannot seed the genesis level")]
    NotGenesis { number: u64 },

    /// Genesis already exists.
    #[error("Index already initialised with genesis {0:02x?}")]
    AlreadyInitialized(Hash),

    /// The index directory is owned by another process.
    #[error("Database locked: {0}")]
    Locked(String),
}

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O failure in the backend.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Backend refused the write.
    #[error("KV store write rejected: {message}")]
    WriteRejected { message: String },
}

/// Record encoding/decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: {message}")]
pub struct SerializationError {
    pub context: &'static str,
    pub message: String,
}

impl SerializationError {
    pub fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }
}
