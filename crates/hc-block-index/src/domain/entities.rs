//! # Domain Entities
//!
//! Records owned by the block index.

use shared_types::{Hash, U256};

/// One block seen at a given level.
///
/// `cumulative_difficulty` never decreases once set; `is_main_chain` is the
/// only field a reorganisation mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// Identity of the block.
    pub hash: Hash,
    /// Own difficulty plus the parent's cumulative difficulty.
    pub cumulative_difficulty: U256,
    /// Whether the block is on the canonical chain.
    pub is_main_chain: bool,
}

impl BlockInfo {
    pub fn new(hash: Hash, cumulative_difficulty: U256, is_main_chain: bool) -> Self {
        Self {
            hash,
            cumulative_difficulty,
            is_main_chain,
        }
    }
}

/// Find the record for `hash` within a level.
pub fn find_info<'a>(infos: &'a [BlockInfo], hash: &Hash) -> Option<&'a BlockInfo> {
    infos.iter().find(|info| &info.hash == hash)
}

/// Find the main-chain record of a level, if any.
pub fn main_chain_info(infos: &[BlockInfo]) -> Option<&BlockInfo> {
    infos.iter().find(|info| info.is_main_chain)
}

/// Outcome of [`index_integrity_check`](crate::BlockIndexApi::index_integrity_check).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityCheckResult {
    /// No discrepancy was found.
    Correct,
    /// Discrepancies were found and repaired in place.
    Fixed,
    /// Level 0 is absent; the index cannot be rebuilt.
    MissingGenesis,
    /// A level between genesis and the top is absent; the index cannot be
    /// rebuilt.
    MissingLevel,
}

impl IntegrityCheckResult {
    /// Whether block import may continue after this outcome.
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            IntegrityCheckResult::Correct | IntegrityCheckResult::Fixed
        )
    }
}

impl std::fmt::Display for IntegrityCheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityCheckResult::Correct => write!(f, "CORRECT"),
            IntegrityCheckResult::Fixed => write!(f, "FIXED"),
            IntegrityCheckResult::MissingGenesis => write!(f, "MISSING_GENESIS"),
            IntegrityCheckResult::MissingLevel => write!(f, "MISSING_LEVEL"),
        }
    }
}

/// Details gathered during an integrity check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Number of levels examined.
    pub levels_scanned: u64,
    /// Number of records whose cumulative difficulty was rewritten.
    pub difficulties_repaired: u64,
    /// Number of records whose main-chain flag was flipped.
    pub flags_repaired: u64,
    /// Level at which the scan stopped on an unrecoverable error.
    pub failed_level: Option<u64>,
    /// Head chosen by the main-chain reconciliation.
    pub head: Option<Hash>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any record was rewritten.
    pub fn has_repairs(&self) -> bool {
        self.difficulties_repaired > 0 || self.flags_repaired > 0
    }
}
