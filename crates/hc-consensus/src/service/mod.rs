//! Chain Selector - block import and canonical head selection
//!
//! # Import Pipeline
//!
//! 1. Duplicate and parent lookup against the block index
//! 2. Fork-aware rule chain against the parent header
//! 3. Reward from the era active for the block's seal and height
//! 4. Execution through the gate on the parent's post-state, reverting
//!    rollback transactions at the designated height
//! 5. Index update: heaviest cumulative difficulty becomes the head,
//!    reorganising main-chain flags back to the common ancestor
//! 6. Executor commit, once the index flush has succeeded
//!
//! A failure after execution starts discards the executor block and every
//! staged index write, so the import can be retried.
//!
//! Steps 1-6 run under one import lock. Rule validation alone is side-effect
//! free and is exposed for parallel use through `validate_batch`.

use crate::adapters::ExecutionGate;
use crate::domain::{
    ChainConfig, ChainHead, ConsensusError, ConsensusResult, ForkUtility, ImportResult,
    ImportSummary, RewardInput, RewardPolicy, RuleChainFactory, RuleError, RuleResult,
};
use crate::metrics;
use crate::ports::{
    ChainSelectorApi, ExecutionContext, ExecutionEnvironment, ExecutionError, Receipt,
};
use hc_block_index::{find_info, main_chain_info, BlockIndexApi, BlockInfo, IntegrityCheckResult};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use shared_types::{Block, BlockHeader, Hash, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};


/// Collaborators and settings for a [`ChainSelector`].
pub struct ChainSelectorDependencies<I, E: ExecutionEnvironment> {
    pub index: Arc<I>,
    pub gate: Arc<ExecutionGate<E>>,
    pub config: ChainConfig,
}

/// Block importer over a block index and an execution environment.
pub struct ChainSelector<I: BlockIndexApi, E: ExecutionEnvironment> {
    index: Arc<I>,
    gate: Arc<ExecutionGate<E>>,
    fork: ForkUtility,
    rules: RuleChainFactory,
    rewards: RewardPolicy,
    head: RwLock<ChainHead>,
    import_lock: Mutex<()>,
    halted: AtomicBool,
}

/// Outcome of executing and recording one block.
enum Staged {
    Imported(ImportResult, Vec<Receipt>),
    Failed(ExecutionError),
}

impl<I: BlockIndexApi, E: ExecutionEnvironment> ChainSelector<I, E> {
    /// Open over an initialised index.
    ///
    /// Runs the integrity check first; an unrecoverable index refuses to
    /// open.
    pub fn open(deps: ChainSelectorDependencies<I, E>) -> ConsensusResult<Self> {
        deps.config.validate()?;
        if deps.index.level_count() == 0 {
            return Err(ConsensusError::NotInitialized);
        }

        let (result, report) = deps.index.index_integrity_check_with_report()?;
        match result {
            IntegrityCheckResult::Correct => {
                debug!(
                    "[hc-consensus] Index CORRECT over {} levels",
                    report.levels_scanned
                );
            }
            IntegrityCheckResult::Fixed => {
                warn!(
                    "[hc-consensus] Index repaired on open: {} difficulties, {} flags",
                    report.difficulties_repaired, report.flags_repaired
                );
            }
            IntegrityCheckResult::MissingGenesis | IntegrityCheckResult::MissingLevel => {
                error!(
                    "[hc-consensus] Refusing to import: index {} at level {:?}",
                    result, report.failed_level
                );
                return Err(ConsensusError::IndexCorrupted(result));
            }
        }

        let head = load_head(deps.index.as_ref())?;
        info!(
            "[hc-consensus] Chain head #{} {} (td {})",
            head.number,
            hex_prefix(&head.hash),
            head.total_difficulty
        );

        let fork = ForkUtility::new(deps.config.fork.clone());
        Ok(Self {
            rules: RuleChainFactory::new(
                fork.clone(),
                deps.config.energy,
                deps.config.difficulty,
            ),
            rewards: RewardPolicy::new(fork.clone(), &deps.config.reward),
            fork,
            index: deps.index,
            gate: deps.gate,
            head: RwLock::new(head),
            import_lock: Mutex::new(()),
            halted: AtomicBool::new(false),
        })
    }

    /// Seed `genesis` into an empty index, then open.
    ///
    /// An index already holding a different genesis is rejected.
    pub fn with_genesis(
        deps: ChainSelectorDependencies<I, E>,
        genesis: &BlockHeader,
    ) -> ConsensusResult<Self> {
        if deps.index.level_count() == 0 {
            deps.index.initialize_genesis(genesis)?;
        } else if let Some(existing) = main_chain_info(&deps.index.get_block_infos_at_level(0)?) {
            if existing.hash != genesis.hash() {
                return Err(hc_block_index::IndexError::AlreadyInitialized(existing.hash).into());
            }
        }
        Self::open(deps)
    }

    pub fn fork(&self) -> &ForkUtility {
        &self.fork
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    pub fn gate(&self) -> &Arc<ExecutionGate<E>> {
        &self.gate
    }

    fn connect(&self, block: &Block) -> ConsensusResult<ImportSummary> {
        if self.is_halted() {
            return Err(ConsensusError::Halted);
        }
        let _import = self.import_lock.lock();
        if self.is_halted() {
            return Err(ConsensusError::Halted);
        }

        let header = &block.header;
        let hash = header.hash();
        let number = header.number();

        let level_infos = self.index.get_block_infos_at_level(number)?;
        if find_info(&level_infos, &hash).is_some() {
            return Ok(ImportSummary::rejected(ImportResult::AlreadyExists, hash, number));
        }

        let Some(parent) = self.parent_of(header)? else {
            debug!(
                "[hc-consensus] Block #{} {} has no indexed parent",
                number,
                hex_prefix(&hash)
            );
            return Ok(ImportSummary::rejected(ImportResult::NoParent, hash, number));
        };

        let verdict = self.rules.validate(header, &parent);
        if !verdict.is_valid() {
            let diagnostics = verdict.into_errors();
            debug!(
                "[hc-consensus] Block #{} {} invalid: {:?}",
                number,
                hex_prefix(&hash),
                diagnostics
            );
            return Ok(ImportSummary::invalid(hash, number, diagnostics));
        }

        let parent_infos = self.index.get_block_infos_at_level(parent.number())?;
        let Some(parent_info) = find_info(&parent_infos, &parent.hash()) else {
            return Ok(ImportSummary::rejected(ImportResult::NoParent, hash, number));
        };
        let cumulative_difficulty = parent_info
            .cumulative_difficulty
            .saturating_add(header.difficulty());

        let reward = self.rewards.calculate_reward(
            header.seal_type(),
            &RewardInput {
                height: number,
                time_span: header.timestamp().saturating_sub(parent.timestamp()),
            },
        );

        let old_head = self.head.read().clone();
        let staged = self.execute_and_record(
            block,
            reward,
            cumulative_difficulty,
            level_infos,
            &old_head,
        )?;
        let (result, receipts) = match staged {
            Staged::Imported(result, receipts) => (result, receipts),
            Staged::Failed(ExecutionError::Rejected { tx_hash, reason }) => {
                let diagnostic = RuleError {
                    rule: "ExecutionRule",
                    message: format!("transaction {} rejected: {}", hex_prefix(&tx_hash), reason),
                };
                debug!(
                    "[hc-consensus] Block #{} {} rejected by executor: {}",
                    number,
                    hex_prefix(&hash),
                    diagnostic
                );
                return Ok(ImportSummary::invalid(hash, number, vec![diagnostic]));
            }
            Staged::Failed(ExecutionError::Fatal(message)) => {
                self.halted.store(true, Ordering::SeqCst);
                error!(
                    "[hc-consensus] Fatal execution error at #{}: {}; halting imports",
                    number, message
                );
                return Err(ConsensusError::ExecutionFatal(message));
            }
        };

        if result == ImportResult::ImportedBest {
            *self.head.write() = ChainHead {
                hash,
                number,
                total_difficulty: cumulative_difficulty,
            };
        }

        Ok(ImportSummary {
            result,
            hash,
            number,
            cumulative_difficulty,
            reward,
            receipts,
            diagnostics: Vec::new(),
        })
    }

    fn parent_of(&self, header: &BlockHeader) -> ConsensusResult<Option<BlockHeader>> {
        if header.is_genesis() {
            return Ok(None);
        }
        Ok(self.index.get_header(&header.parent_hash())?)
    }

    /// Run the block on its parent's state and record it in the index.
    ///
    /// The executor commits only after the index flush succeeds. A failed
    /// index update discards the executor block and the staged index writes.
    fn execute_and_record(
        &self,
        block: &Block,
        reward: U256,
        cumulative_difficulty: U256,
        level_infos: Vec<BlockInfo>,
        old_head: &ChainHead,
    ) -> ConsensusResult<Staged> {
        let header = &block.header;
        let context = ExecutionContext {
            hash: header.hash(),
            number: header.number(),
            parent_hash: header.parent_hash(),
            timestamp: header.timestamp(),
            difficulty: header.difficulty(),
            energy_limit: header.energy_limit(),
            coinbase: header.coinbase(),
            reward,
            fork: self.fork.state_at(header.number()),
        };
        let rollback = self.fork.rollback_transaction_hashes(header.number());
        if !rollback.is_empty() {
            warn!(
                "[hc-consensus] Reverting {} rollback transactions at height {}",
                rollback.len(),
                header.number()
            );
        }

        self.gate.run(|executor| {
            let receipts = match run_block(executor, block, &context, rollback) {
                Ok(receipts) => receipts,
                Err(e) => {
                    discard_block(executor);
                    return Ok(Staged::Failed(e));
                }
            };

            let result = match self.record(header, cumulative_difficulty, level_infos, old_head) {
                Ok(result) => result,
                Err(e) => {
                    discard_block(executor);
                    self.index.discard_pending();
                    warn!(
                        "[hc-consensus] Index update for #{} {} failed, import rolled back: {}",
                        header.number(),
                        hex_prefix(&context.hash),
                        e
                    );
                    return Err(e);
                }
            };

            match executor.commit_block() {
                Ok(()) => Ok(Staged::Imported(result, receipts)),
                Err(e) => Ok(Staged::Failed(ExecutionError::Fatal(format!(
                    "commit after index flush: {}",
                    e
                )))),
            }
        })?
    }

    /// Store the header and its level record, moving the head if it is
    /// heavier, then flush.
    fn record(
        &self,
        header: &BlockHeader,
        cumulative_difficulty: U256,
        level_infos: Vec<BlockInfo>,
        old_head: &ChainHead,
    ) -> ConsensusResult<ImportResult> {
        self.index.put_header(header)?;
        let result = if cumulative_difficulty > old_head.total_difficulty {
            self.reorganize(header, cumulative_difficulty, level_infos, old_head)?;
            ImportResult::ImportedBest
        } else {
            let mut infos = level_infos;
            infos.push(BlockInfo::new(header.hash(), cumulative_difficulty, false));
            self.index.put_block_infos_at_level(header.number(), infos)?;
            ImportResult::ImportedNotBest
        };
        self.index.flush()?;
        Ok(result)
    }

    /// Make `header` the head: flip main-chain flags back to the first
    /// ancestor already on the main chain, then clear levels above it.
    fn reorganize(
        &self,
        header: &BlockHeader,
        cumulative_difficulty: U256,
        mut level_infos: Vec<BlockInfo>,
        old_head: &ChainHead,
    ) -> ConsensusResult<()> {
        let hash = header.hash();
        let number = header.number();

        for info in level_infos.iter_mut() {
            info.is_main_chain = false;
        }
        level_infos.push(BlockInfo::new(hash, cumulative_difficulty, true));
        self.index.put_block_infos_at_level(number, level_infos)?;

        let mut cursor = header.parent_hash();
        let mut level = number - 1;
        loop {
            let mut infos = self.index.get_block_infos_at_level(level)?;
            let position = infos
                .iter()
                .position(|info| info.hash == cursor)
                .ok_or(ConsensusError::MissingHeader(cursor))?;
            if infos[position].is_main_chain {
                break;
            }
            for (i, info) in infos.iter_mut().enumerate() {
                info.is_main_chain = i == position;
            }
            self.index.put_block_infos_at_level(level, infos)?;
            if level == 0 {
                break;
            }

            cursor = self
                .index
                .get_header(&cursor)?
                .ok_or(ConsensusError::MissingHeader(cursor))?
                .parent_hash();
            level -= 1;
        }
        let ancestor = level;

        for above in (number + 1)..=old_head.number {
            let mut infos = self.index.get_block_infos_at_level(above)?;
            if infos.iter().any(|info| info.is_main_chain) {
                for info in infos.iter_mut() {
                    info.is_main_chain = false;
                }
                self.index.put_block_infos_at_level(above, infos)?;
            }
        }

        self.index.set_best_block_hash(hash)?;

        let depth = old_head.number.saturating_sub(ancestor);
        if depth > 0 {
            metrics::record_reorg();
            info!(
                "[hc-consensus] Reorganised from #{} {} to #{} {}, depth {}",
                old_head.number,
                hex_prefix(&old_head.hash),
                number,
                hex_prefix(&hash),
                depth
            );
        }
        Ok(())
    }

    fn validate_one(&self, header: &BlockHeader) -> ConsensusResult<RuleResult> {
        match self.parent_of(header)? {
            Some(parent) => Ok(self.rules.validate(header, &parent)),
            None => Ok(RuleResult::Fail(vec![RuleError {
                rule: "ParentRule",
                message: format!(
                    "parent {} of block #{} is not indexed",
                    hex_prefix(&header.parent_hash()),
                    header.number()
                ),
            }])),
        }
    }
}

impl<I: BlockIndexApi, E: ExecutionEnvironment> ChainSelectorApi for ChainSelector<I, E> {
    fn try_connect(&self, block: &Block) -> ConsensusResult<ImportSummary> {
        let started = Instant::now();
        let outcome = self.connect(block);
        if let Ok(summary) = &outcome {
            metrics::record_import(summary.result.as_str());
        }
        metrics::record_import_latency(started.elapsed().as_secs_f64());
        outcome
    }

    fn validate_batch(&self, headers: &[BlockHeader]) -> Vec<ConsensusResult<RuleResult>> {
        headers.par_iter().map(|h| self.validate_one(h)).collect()
    }

    fn best_block(&self) -> ChainHead {
        self.head.read().clone()
    }

    fn total_difficulty(&self) -> U256 {
        self.head.read().total_difficulty
    }

    fn get_header(&self, hash: &Hash) -> ConsensusResult<Option<BlockHeader>> {
        Ok(self.index.get_header(hash)?)
    }

    fn main_chain_hash_at(&self, level: u64) -> ConsensusResult<Option<Hash>> {
        let infos = self.index.get_block_infos_at_level(level)?;
        Ok(main_chain_info(&infos).map(|info| info.hash))
    }

    fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}

fn run_block<E: ExecutionEnvironment>(
    executor: &mut E,
    block: &Block,
    context: &ExecutionContext,
    rollback: &[Hash],
) -> Result<Vec<Receipt>, ExecutionError> {
    executor.begin_block(context)?;
    if !rollback.is_empty() {
        executor.revert_transactions(rollback)?;
    }
    let receipts = block
        .transactions
        .iter()
        .map(|tx| executor.execute(tx))
        .collect::<Result<Vec<_>, _>>()?;
    executor.credit_reward(&context.coinbase, context.reward)?;
    Ok(receipts)
}

fn discard_block<E: ExecutionEnvironment>(executor: &mut E) {
    if let Err(e) = executor.discard_block() {
        warn!("[hc-consensus] Discard after failed block: {}", e);
    }
}

fn load_head<I: BlockIndexApi + ?Sized>(index: &I) -> ConsensusResult<ChainHead> {
    let hash = index.best_block_hash()?.ok_or(ConsensusError::NotInitialized)?;
    let header = index
        .get_header(&hash)?
        .ok_or(ConsensusError::MissingHeader(hash))?;
    let infos = index.get_block_infos_at_level(header.number())?;
    let info = find_info(&infos, &hash).ok_or(ConsensusError::MissingHeader(hash))?;
    Ok(ChainHead {
        hash,
        number: header.number(),
        total_difficulty: info.cumulative_difficulty,
    })
}

fn hex_prefix(hash: &Hash) -> String {
    format!("0x{}", hex::encode(&hash[..4]))
}
