//! In-memory value-transfer executor.
//!
//! Keeps account balances and the set of applied transactions per committed
//! block, which is enough to observe reward crediting, rollback and branch
//! isolation. Failures can be scripted per transaction hash.

use crate::ports::{ExecutionContext, ExecutionEnvironment, ExecutionError, Receipt};
use shared_types::{Address, Hash, Transaction, U256};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Energy charged per transaction.
pub const TRANSFER_ENERGY: u64 = 21_000;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    applied: HashMap<Hash, Transaction>,
}

impl LedgerState {
    fn balance(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn credit(&mut self, account: Address, amount: U256) {
        let balance = self.balance(&account);
        self.balances.insert(account, balance.saturating_add(amount));
    }

    fn debit(&mut self, account: Address, amount: U256) {
        let balance = self.balance(&account);
        self.balances.insert(account, balance.saturating_sub(amount));
    }
}

/// Executor over in-memory ledgers, one per committed block.
#[derive(Debug, Default)]
pub struct InMemoryExecutor {
    /// State the children of genesis start from.
    initial: LedgerState,
    /// Post-state of each committed block.
    states: HashMap<Hash, LedgerState>,
    /// Hash and working state of the block in progress.
    working: Option<(Hash, LedgerState)>,
    context: Option<ExecutionContext>,
    committed_blocks: u64,
    reverted: Vec<Hash>,
    fatal_on: HashSet<Hash>,
    reject_on: HashSet<Hash>,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `account` in the initial state.
    pub fn with_balance(mut self, account: Address, amount: U256) -> Self {
        self.initial.balances.insert(account, amount);
        self
    }

    /// Fail with `ExecutionError::Fatal` when `tx_hash` executes.
    pub fn with_fatal_transaction(mut self, tx_hash: Hash) -> Self {
        self.fatal_on.insert(tx_hash);
        self
    }

    /// Fail with `ExecutionError::Rejected` when `tx_hash` executes.
    pub fn with_rejected_transaction(mut self, tx_hash: Hash) -> Self {
        self.reject_on.insert(tx_hash);
        self
    }

    /// Whether `block` was committed.
    pub fn has_state(&self, block: &Hash) -> bool {
        self.states.contains_key(block)
    }

    /// Balance of `account` after `block`; zero when `block` was never
    /// committed.
    pub fn balance_at(&self, block: &Hash, account: &Address) -> U256 {
        self.states
            .get(block)
            .map(|state| state.balance(account))
            .unwrap_or_default()
    }

    /// Whether `tx_hash` is in effect after `block`.
    pub fn is_applied_at(&self, block: &Hash, tx_hash: &Hash) -> bool {
        self.states
            .get(block)
            .is_some_and(|state| state.applied.contains_key(tx_hash))
    }

    pub fn committed_blocks(&self) -> u64 {
        self.committed_blocks
    }

    /// Hashes reverted so far, in order.
    pub fn reverted(&self) -> &[Hash] {
        &self.reverted
    }

    /// Context of the last block begun.
    pub fn last_context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }

    fn working(&mut self) -> Result<&mut LedgerState, ExecutionError> {
        self.working
            .as_mut()
            .map(|(_, state)| state)
            .ok_or_else(|| ExecutionError::Fatal("no block in progress".into()))
    }
}

impl ExecutionEnvironment for InMemoryExecutor {
    fn begin_block(&mut self, context: &ExecutionContext) -> Result<(), ExecutionError> {
        if self.working.is_some() {
            return Err(ExecutionError::Fatal(format!(
                "block {} begun while another is in progress",
                context.number
            )));
        }
        let base = match self.states.get(&context.parent_hash) {
            Some(state) => state.clone(),
            None if context.number == 1 => self.initial.clone(),
            None => {
                return Err(ExecutionError::Fatal(format!(
                    "no state for parent {:02x?} of block {}",
                    &context.parent_hash[..4],
                    context.number
                )))
            }
        };
        self.working = Some((context.hash, base));
        self.context = Some(context.clone());
        Ok(())
    }

    fn revert_transactions(&mut self, tx_hashes: &[Hash]) -> Result<(), ExecutionError> {
        let state = self.working()?;
        let mut reverted = Vec::with_capacity(tx_hashes.len());
        for hash in tx_hashes {
            let Some(tx) = state.applied.remove(hash) else {
                debug!("[hc-consensus] Rollback target {:02x?} was never applied", &hash[..4]);
                continue;
            };
            if let Some(to) = tx.to {
                state.debit(to, tx.value);
                state.credit(tx.from, tx.value);
            }
            reverted.push(*hash);
        }
        self.reverted.extend(reverted);
        Ok(())
    }

    fn execute(&mut self, tx: &Transaction) -> Result<Receipt, ExecutionError> {
        let fatal = self.fatal_on.contains(&tx.hash);
        let rejected = self.reject_on.contains(&tx.hash);
        let state = self.working()?;
        if fatal {
            return Err(ExecutionError::Fatal(format!(
                "state corrupted while executing {:02x?}",
                &tx.hash[..4]
            )));
        }
        if rejected {
            return Err(ExecutionError::Rejected {
                tx_hash: tx.hash,
                reason: "rejected by executor".into(),
            });
        }
        if tx.energy_limit < TRANSFER_ENERGY {
            return Err(ExecutionError::Rejected {
                tx_hash: tx.hash,
                reason: format!(
                    "energy limit ({}) below intrinsic cost ({})",
                    tx.energy_limit, TRANSFER_ENERGY
                ),
            });
        }

        let success = match tx.to {
            Some(to) if state.balance(&tx.from) >= tx.value => {
                state.debit(tx.from, tx.value);
                state.credit(to, tx.value);
                true
            }
            Some(_) => false,
            None => true,
        };
        if success {
            state.applied.insert(tx.hash, tx.clone());
        }

        Ok(Receipt {
            tx_hash: tx.hash,
            success,
            output: Vec::new(),
            energy_used: TRANSFER_ENERGY,
        })
    }

    fn credit_reward(&mut self, coinbase: &Address, amount: U256) -> Result<(), ExecutionError> {
        self.working()?.credit(*coinbase, amount);
        Ok(())
    }

    fn commit_block(&mut self) -> Result<(), ExecutionError> {
        let (hash, state) = self
            .working
            .take()
            .ok_or_else(|| ExecutionError::Fatal("no block in progress".into()))?;
        self.states.insert(hash, state);
        self.committed_blocks += 1;
        Ok(())
    }

    fn discard_block(&mut self) -> Result<(), ExecutionError> {
        self.working = None;
        Ok(())
    }
}
