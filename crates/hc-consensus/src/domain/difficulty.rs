//! # Difficulty Adjustment
//!
//! Each header's difficulty is fixed by its parent: a child sealed faster
//! than the target block time raises it by `parent / bound_divisor`, a child
//! on target keeps it, and a slower child lowers it by that quotient once per
//! extra target interval (at most 99 intervals). The result never drops
//! below `minimum`.
//!
//! Mining and staking headers share the formula with their own target times;
//! [`DifficultyRule`](crate::domain::rules::DifficultyRule) checks a header
//! against it.

use crate::domain::config::DifficultyConfig;
use shared_types::{BlockHeader, SealType, U256};

/// Most target intervals a slow block can subtract.
pub const MAX_ADJUSTMENT_STEPS: u64 = 99;

/// Expected difficulty of `current` given its parent.
pub trait DifficultyCalculator: Send + Sync {
    fn calculate_difficulty(&self, current: &BlockHeader, parent: &BlockHeader) -> U256;
}

/// Parent difficulty nudged by the inter-block time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAdjustedDifficultyCalculator {
    bound_divisor: U256,
    target_block_time: u64,
    minimum: U256,
}

impl TimeAdjustedDifficultyCalculator {
    /// `bound_divisor` and `target_block_time` must be non-zero;
    /// `ChainConfig::validate` enforces it.
    pub fn new(bound_divisor: u64, target_block_time: u64, minimum: U256) -> Self {
        Self {
            bound_divisor: U256::from(bound_divisor.max(1)),
            target_block_time: target_block_time.max(1),
            minimum,
        }
    }

    /// Calculator for `seal` headers.
    pub fn for_seal(config: &DifficultyConfig, seal: SealType) -> Self {
        let target = match seal {
            SealType::Mining => config.mining_block_time,
            SealType::Staking => config.staking_block_time,
        };
        Self::new(
            config.bound_divisor,
            target,
            U256::from(config.minimum_difficulty),
        )
    }

    pub fn target_block_time(&self) -> u64 {
        self.target_block_time
    }
}

impl DifficultyCalculator for TimeAdjustedDifficultyCalculator {
    fn calculate_difficulty(&self, current: &BlockHeader, parent: &BlockHeader) -> U256 {
        let parent_difficulty = parent.difficulty();
        let quotient = parent_difficulty / self.bound_divisor;
        let steps = current.timestamp().saturating_sub(parent.timestamp()) / self.target_block_time;

        let adjusted = if steps == 0 {
            parent_difficulty.saturating_add(quotient)
        } else {
            let decrease = quotient.saturating_mul(U256::from((steps - 1).min(MAX_ADJUSTMENT_STEPS)));
            parent_difficulty.saturating_sub(decrease)
        };
        adjusted.max(self.minimum)
    }
}
