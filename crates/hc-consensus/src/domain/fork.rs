//! # Fork Activation
//!
//! Height-keyed protocol upgrades: hybrid PoW/PoS consensus, then the
//! staking signature-scheme swap. Both flags are pure functions of height,
//! so once a height is passed a flag never reverts.
//!
//! The signature-swap block is also the one designated height at which the
//! configured rollback transactions are reverted.

use serde::{Deserialize, Deserializer};
use shared_types::Hash;
use std::sync::Arc;

/// Height at which a fork activates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForkActivation(u64);

impl ForkActivation {
    const NEVER: u64 = u64::MAX;
    const ALWAYS: u64 = 0;

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Not scheduled.
    pub const fn never() -> Self {
        Self(Self::NEVER)
    }

    /// Active from genesis.
    pub const fn always() -> Self {
        Self(Self::ALWAYS)
    }

    /// Activation height, `None` when never scheduled.
    pub fn height(self) -> Option<u64> {
        (self.0 != Self::NEVER).then_some(self.0)
    }

    /// `height >= activation`.
    pub fn is_active(self, height: u64) -> bool {
        self.0 != Self::NEVER && height >= self.0
    }

    /// `height == activation`.
    pub fn is_activation_block(self, height: u64) -> bool {
        self.0 != Self::NEVER && height == self.0
    }
}

impl Default for ForkActivation {
    fn default() -> Self {
        Self::never()
    }
}

impl<'de> Deserialize<'de> for ForkActivation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::new(u64::deserialize(deserializer)?))
    }
}

/// Fork schedule, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForkConfig {
    /// First height at which staking blocks are accepted.
    pub hybrid_fork_height: ForkActivation,
    /// First height using VRF staking seeds and time-varying mining rewards.
    pub signature_swap_fork_height: ForkActivation,
    /// Transactions reverted at the signature-swap block.
    #[serde(deserialize_with = "deserialize_hex_hashes")]
    pub rollback_transactions: Vec<Hash>,
}

impl ForkConfig {
    pub fn with_hybrid_fork(mut self, activation: ForkActivation) -> Self {
        self.hybrid_fork_height = activation;
        self
    }

    pub fn with_signature_swap_fork(mut self, activation: ForkActivation) -> Self {
        self.signature_swap_fork_height = activation;
        self
    }

    pub fn with_rollback_transactions(mut self, hashes: Vec<Hash>) -> Self {
        self.rollback_transactions = hashes;
        self
    }
}

fn deserialize_hex_hashes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Hash>, D::Error> {
    use serde::de::Error;

    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|text| {
            let bytes = hex::decode(text.trim_start_matches("0x"))
                .map_err(|e| D::Error::custom(format!("rollback hash '{}': {}", text, e)))?;
            Hash::try_from(bytes.as_slice()).map_err(|_| {
                D::Error::custom(format!(
                    "rollback hash '{}' must be 32 bytes, got {}",
                    text,
                    bytes.len()
                ))
            })
        })
        .collect()
}

/// Consensus phase at one height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ForkPhase {
    /// Mining blocks only.
    PreHybrid,
    /// Mining and staking blocks alternate.
    Hybrid,
    /// Hybrid, with the swapped staking signature scheme.
    HybridSignatureSwap,
}

/// Feature flags derived for one height. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkState {
    pub height: u64,
    pub hybrid_consensus_active: bool,
    pub signature_swap_active: bool,
}

impl ForkState {
    pub fn phase(&self) -> ForkPhase {
        match (self.hybrid_consensus_active, self.signature_swap_active) {
            (true, true) => ForkPhase::HybridSignatureSwap,
            (true, false) => ForkPhase::Hybrid,
            (false, _) => ForkPhase::PreHybrid,
        }
    }
}

/// Height-to-feature resolver over a shared [`ForkConfig`].
#[derive(Debug, Clone)]
pub struct ForkUtility {
    config: Arc<ForkConfig>,
}

impl ForkUtility {
    pub fn new(config: ForkConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn from_shared(config: Arc<ForkConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForkConfig {
        &self.config
    }

    pub fn is_hybrid_consensus_active(&self, height: u64) -> bool {
        self.config.hybrid_fork_height.is_active(height)
    }

    pub fn is_signature_swap_active(&self, height: u64) -> bool {
        self.config.signature_swap_fork_height.is_active(height)
    }

    pub fn is_hybrid_fork_block(&self, height: u64) -> bool {
        self.config.hybrid_fork_height.is_activation_block(height)
    }

    pub fn is_signature_swap_fork_block(&self, height: u64) -> bool {
        self.config.signature_swap_fork_height.is_activation_block(height)
    }

    /// Transactions to revert when connecting the block at `height`.
    ///
    /// Non-empty only at the signature-swap activation height.
    pub fn rollback_transaction_hashes(&self, height: u64) -> &[Hash] {
        if self.is_signature_swap_fork_block(height) {
            &self.config.rollback_transactions
        } else {
            &[]
        }
    }

    pub fn state_at(&self, height: u64) -> ForkState {
        ForkState {
            height,
            hybrid_consensus_active: self.is_hybrid_consensus_active(height),
            signature_swap_active: self.is_signature_swap_active(height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unity_at(height: u64) -> ForkUtility {
        ForkUtility::new(
            ForkConfig::default()
                .with_hybrid_fork(ForkActivation::new(height))
                .with_signature_swap_fork(ForkActivation::new(height + 3))
                .with_rollback_transactions(vec![[0xAB; 32]]),
        )
    }

    #[test]
    fn test_activation_special_values() {
        assert!(!ForkActivation::never().is_active(u64::MAX));
        assert_eq!(ForkActivation::never().height(), None);
        assert!(ForkActivation::always().is_active(0));
        assert!(ForkActivation::new(10).is_activation_block(10));
        assert!(!ForkActivation::new(10).is_activation_block(11));
    }

    #[test]
    fn test_hybrid_flag_switches_at_height() {
        let fork = unity_at(2);
        assert!(!fork.is_hybrid_consensus_active(0));
        assert!(!fork.is_hybrid_consensus_active(1));
        assert!(fork.is_hybrid_consensus_active(2));
        assert!(fork.is_hybrid_consensus_active(1_000_000));
        assert!(fork.is_hybrid_fork_block(2));
    }

    #[test]
    fn test_phases_walk_forward() {
        let fork = unity_at(2);
        let phases: Vec<_> = (0..8).map(|h| fork.state_at(h).phase()).collect();
        assert_eq!(phases[1], ForkPhase::PreHybrid);
        assert_eq!(phases[2], ForkPhase::Hybrid);
        assert_eq!(phases[4], ForkPhase::Hybrid);
        assert_eq!(phases[5], ForkPhase::HybridSignatureSwap);
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_rollback_only_at_swap_block() {
        let fork = unity_at(2);
        assert!(fork.rollback_transaction_hashes(4).is_empty());
        assert_eq!(fork.rollback_transaction_hashes(5), &[[0xAB; 32]]);
        assert!(fork.rollback_transaction_hashes(6).is_empty());
    }

    #[test]
    fn test_unscheduled_forks_stay_inactive() {
        let fork = ForkUtility::new(ForkConfig::default());
        let state = fork.state_at(u64::MAX);
        assert_eq!(state.phase(), ForkPhase::PreHybrid);
        assert!(fork.rollback_transaction_hashes(u64::MAX).is_empty());
    }
}
