//! # hc-consensus
//!
//! Hybrid PoW/PoS chain selection for the node kernel.
//!
//! ## Architecture
//!
//! The selector validates incoming blocks with a fork-aware rule chain,
//! executes them through a bounded-wait gate, and keeps the block index's
//! main-chain flags on the heaviest branch:
//!
//! ```text
//! Block ──→ [RuleChainFactory] ──→ [RewardPolicy] ──→ [ExecutionGate]
//!                                                          │
//!                                                          ↓
//!                                              [BlockIndexApi] (hc-block-index)
//! ```
//!
//! ### Fork Phases
//!
//! `PreHybrid → Hybrid → HybridSignatureSwap`, keyed purely by height.
//! Staking blocks are accepted from the hybrid fork on; the staking seed
//! scheme and the mining reward formula change at the signature swap.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hc_consensus::{ChainConfig, ChainSelector, ChainSelectorApi, ChainSelectorDependencies};
//! use hc_consensus::adapters::{ExecutionGate, InMemoryExecutor};
//!
//! let config = ChainConfig::from_file("chain.toml")?;
//! let gate = Arc::new(ExecutionGate::from_config(InMemoryExecutor::new(), &config.execution));
//! let selector = ChainSelector::with_genesis(
//!     ChainSelectorDependencies { index, gate, config },
//!     &genesis,
//! )?;
//!
//! let summary = selector.try_connect(&block)?;
//! ```
//!
//! ## Failure Model
//!
//! - Rule violations: `ImportResult::Invalid` with diagnostics
//! - `MISSING_GENESIS` / `MISSING_LEVEL` on open: `ConsensusError::IndexCorrupted`
//! - Executor lock timeout: `ConsensusError::LockTimeout`, only that import aborts
//! - Fatal execution error: `ConsensusError::ExecutionFatal`, then every
//!   import fails with `ConsensusError::Halted`

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::{
    ChainSelectorApi, ExecutionContext, ExecutionEnvironment, ExecutionError, Receipt,
};
pub use service::{ChainSelector, ChainSelectorDependencies};
