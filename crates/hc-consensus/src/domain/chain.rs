//! Chain head and import outcomes.

use super::rules::RuleError;
use crate::ports::Receipt;
use shared_types::{Hash, U256};

/// Canonical head, cached from the index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainHead {
    pub hash: Hash,
    pub number: u64,
    pub total_difficulty: U256,
}

/// Outcome of `try_connect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportResult {
    /// Indexed and now the canonical head.
    ImportedBest,
    /// Indexed on a side branch.
    ImportedNotBest,
    /// A rule failed or the executor rejected a transaction.
    Invalid,
    /// Already indexed at its level.
    AlreadyExists,
    /// Parent is not indexed.
    NoParent,
}

impl ImportResult {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportResult::ImportedBest | ImportResult::ImportedNotBest)
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportResult::ImportedBest => "imported_best",
            ImportResult::ImportedNotBest => "imported_not_best",
            ImportResult::Invalid => "invalid",
            ImportResult::AlreadyExists => "already_exists",
            ImportResult::NoParent => "no_parent",
        }
    }
}

impl std::fmt::Display for ImportResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Everything the caller learns from one import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub result: ImportResult,
    pub hash: Hash,
    pub number: u64,
    /// Zero unless imported.
    pub cumulative_difficulty: U256,
    /// Credited to the coinbase; zero unless imported.
    pub reward: U256,
    pub receipts: Vec<Receipt>,
    /// Populated for `Invalid`.
    pub diagnostics: Vec<RuleError>,
}

impl ImportSummary {
    pub(crate) fn rejected(result: ImportResult, hash: Hash, number: u64) -> Self {
        Self {
            result,
            hash,
            number,
            cumulative_difficulty: U256::zero(),
            reward: U256::zero(),
            receipts: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn invalid(hash: Hash, number: u64, diagnostics: Vec<RuleError>) -> Self {
        Self {
            diagnostics,
            ..Self::rejected(ImportResult::Invalid, hash, number)
        }
    }
}
