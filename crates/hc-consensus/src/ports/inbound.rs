//! Driving ports (inbound API)

use crate::domain::{ChainHead, ConsensusResult, ImportSummary, RuleResult};
use shared_types::{Block, BlockHeader, Hash, U256};

/// Chain selection API.
pub trait ChainSelectorApi: Send + Sync {
    /// Validate, execute and index `block`, reorganising if it becomes the
    /// heaviest head.
    fn try_connect(&self, block: &Block) -> ConsensusResult<ImportSummary>;

    /// Rule validation only, in parallel. Nothing is indexed.
    fn validate_batch(&self, headers: &[BlockHeader]) -> Vec<ConsensusResult<RuleResult>>;

    fn best_block(&self) -> ChainHead;

    fn total_difficulty(&self) -> U256;

    fn get_header(&self, hash: &Hash) -> ConsensusResult<Option<BlockHeader>>;

    /// Canonical block hash at `level`.
    fn main_chain_hash_at(&self, level: u64) -> ConsensusResult<Option<Hash>>;

    /// Whether a fatal execution error stopped imports.
    fn is_halted(&self) -> bool;
}
