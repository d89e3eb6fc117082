//! Driven ports (outbound dependencies)
//!
//! The execution environment is the only external collaborator besides the
//! block index. It is stateful and single-threaded: callers reach it through
//! [`crate::adapters::ExecutionGate`].

use crate::domain::ForkState;
use shared_types::{Address, Hash, Transaction, U256};

/// Block context handed to the executor before any transaction runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Hash of the block being executed; its post-state is keyed by it.
    pub hash: Hash,
    pub number: u64,
    /// The block runs on this block's post-state.
    pub parent_hash: Hash,
    pub timestamp: u64,
    pub difficulty: U256,
    pub energy_limit: u64,
    pub coinbase: Address,
    /// Reward the coinbase will be credited.
    pub reward: U256,
    pub fork: ForkState,
}

/// Result of executing one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub success: bool,
    pub output: Vec<u8>,
    pub energy_used: u64,
}

/// Executor failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// State may be corrupt; the node must stop importing.
    #[error("fatal: {0}")]
    Fatal(String),

    /// The transaction cannot be included; the block is invalid.
    #[error("transaction {tx_hash:02x?} rejected: {reason}")]
    Rejected { tx_hash: Hash, reason: String },
}

/// Stateful transaction executor.
///
/// One block at a time: `begin_block`, optional `revert_transactions`,
/// `execute` per transaction, `credit_reward`, then `commit_block` or
/// `discard_block`.
///
/// Each block starts from the committed post-state of `parent_hash`, so
/// blocks on different branches never see each other's effects. A parent
/// with no committed state is a `Fatal` error, except for children of
/// genesis, which start from the initial state.
pub trait ExecutionEnvironment: Send {
    fn begin_block(&mut self, context: &ExecutionContext) -> Result<(), ExecutionError>;

    /// Fall back the effects of previously included transactions.
    fn revert_transactions(&mut self, tx_hashes: &[Hash]) -> Result<(), ExecutionError>;

    fn execute(&mut self, tx: &Transaction) -> Result<Receipt, ExecutionError>;

    fn credit_reward(&mut self, coinbase: &Address, amount: U256) -> Result<(), ExecutionError>;

    fn commit_block(&mut self) -> Result<(), ExecutionError>;

    /// Drop everything since `begin_block`.
    fn discard_block(&mut self) -> Result<(), ExecutionError>;
}
