//! # Inbound Ports (Driving Ports)
//!
//! The API of the block index.

use crate::domain::entities::{BlockInfo, IntegrityCheckResult, IntegrityReport};
use crate::domain::errors::IndexError;
use shared_types::{BlockHeader, Hash};

/// Persistent level index.
///
/// Mutations on one store are mutually exclusive; implementations take
/// `&self` and synchronise internally so the store can be shared.
pub trait BlockIndexApi: Send + Sync {
    /// Records at level `n` in first-seen order; empty if the level is unknown.
    fn get_block_infos_at_level(&self, level: u64) -> Result<Vec<BlockInfo>, IndexError>;

    /// Atomically replace the records at level `n`.
    ///
    /// The write is pending until [`flush`](Self::flush).
    ///
    /// ## Errors
    ///
    /// - `DuplicateInfo`: the same hash appears twice
    /// - `InvalidGenesisLevel`: level 0 is not a single main-chain record
    fn put_block_infos_at_level(&self, level: u64, infos: Vec<BlockInfo>) -> Result<(), IndexError>;

    /// Verify and repair the flushed index.
    fn index_integrity_check(&self) -> Result<IntegrityCheckResult, IndexError> {
        self.index_integrity_check_with_report()
            .map(|(result, _)| result)
    }

    /// As [`index_integrity_check`](Self::index_integrity_check), with details.
    fn index_integrity_check_with_report(
        &self,
    ) -> Result<(IntegrityCheckResult, IntegrityReport), IndexError>;

    /// Durably persist pending mutations.
    fn flush(&self) -> Result<(), IndexError>;

    /// Drop pending mutations, returning reads to the last flushed state.
    fn discard_pending(&self);

    /// Stored header by hash.
    ///
    /// ## Errors
    ///
    /// - `HeaderCorrupted`: checksum mismatch on the stored record
    fn get_header(&self, hash: &Hash) -> Result<Option<BlockHeader>, IndexError>;

    /// Store a header. Pending until `flush`.
    fn put_header(&self, header: &BlockHeader) -> Result<(), IndexError>;

    /// Hash of the canonical head, if any.
    fn best_block_hash(&self) -> Result<Option<Hash>, IndexError>;

    /// Record the canonical head. Pending until `flush`.
    fn set_best_block_hash(&self, hash: Hash) -> Result<(), IndexError>;

    /// Number of levels (highest level + 1).
    fn level_count(&self) -> u64;

    /// Seed level 0 with the genesis header and flush.
    ///
    /// ## Errors
    ///
    /// - `AlreadyInitialized`: level 0 already exists
    fn initialize_genesis(&self, genesis: &BlockHeader) -> Result<(), IndexError>;
}
