//! Domain layer for hybrid chain selection
//!
//! Pure logic with no I/O:
//! - fork: height-keyed feature flags
//! - rules: header validation
//! - difficulty: parent-relative difficulty
//! - rewards: block reward eras
//! - config: chain settings
//! - chain: head and import outcomes

mod chain;
pub mod config;
pub mod difficulty;
mod error;
pub mod fork;
pub mod rewards;
pub mod rules;

pub use chain::*;
pub use config::{ChainConfig, DifficultyConfig, EnergyConfig, ExecutionConfig, RewardConfig};
pub use difficulty::{DifficultyCalculator, TimeAdjustedDifficultyCalculator};
pub use error::*;
pub use fork::{ForkActivation, ForkConfig, ForkPhase, ForkState, ForkUtility};
pub use rewards::{
    FixedRewardsCalculator, RampUpRewardsCalculator, RewardEra, RewardInput, RewardPolicy,
    RewardsCalculator, TimeVaryingRewardsCalculator,
};
pub use rules::{RuleChain, RuleChainFactory, RuleError, RuleResult};
