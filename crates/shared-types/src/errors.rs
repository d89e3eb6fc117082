//! # Error Types
//!
//! Errors raised while constructing shared entities.

use thiserror::Error;

/// Reasons a header cannot be built from its raw fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Difficulty must be strictly positive.
    #[error("Header difficulty must be non-zero")]
    ZeroDifficulty,

    /// A non-genesis header must name its parent.
    #[error("Header at height {number} has no parent hash")]
    MissingParentHash { number: u64 },

    /// Genesis has no parent.
    #[error("Genesis header must have an all-zero parent hash")]
    GenesisWithParent,

    /// More energy consumed than allowed.
    #[error("Energy consumed ({consumed}) exceeds energy limit ({limit})")]
    EnergyConsumedExceedsLimit { consumed: u64, limit: u64 },

    /// A seal field required for the header kind is empty.
    #[error("Seal field '{0}' is missing")]
    MissingSealField(&'static str),
}
