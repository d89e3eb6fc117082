//! # Chain Configuration
//!
//! Immutable settings consumed by fork activation, the rule chain, the
//! reward calculators and the execution gate.
//!
//! # Config File Format
//!
//! ```toml
//! [fork]
//! hybrid_fork_height = 9200000
//! signature_swap_fork_height = 11000000
//! rollback_transactions = ["0x9c1f...e2"]
//!
//! [reward]
//! block_reward = "1497989283243258292"
//! ramp_up_start = "748994641621655092"
//! ramp_up_upper_bound = 259200
//!
//! [energy]
//! limit_divisor = 1024
//! lower_bound = 1050000
//!
//! [difficulty]
//! minimum_difficulty = 16
//! bound_divisor = 2048
//! mining_block_time = 10
//! staking_block_time = 10
//!
//! [execution]
//! lock_timeout_secs = 600
//! ```
//!
//! Every section and field is optional; missing values take the defaults.

use crate::domain::error::ConfigError;
use crate::domain::fork::{ForkActivation, ForkConfig};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use shared_types::U256;
use std::path::Path;
use std::time::Duration;

/// Overrides the hybrid consensus activation height.
pub const ENV_HYBRID_FORK_HEIGHT: &str = "HC_HYBRID_FORK_HEIGHT";
/// Overrides the signature-swap activation height.
pub const ENV_SIGNATURE_SWAP_FORK_HEIGHT: &str = "HC_SIGNATURE_SWAP_FORK_HEIGHT";
/// Overrides the execution lock timeout, in seconds.
pub const ENV_EXECUTION_LOCK_TIMEOUT_SECS: &str = "HC_EXECUTION_LOCK_TIMEOUT_SECS";

// =============================================================================
// Amounts
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Int(u64),
    Text(String),
}

/// Reward amounts are integers or decimal strings, since TOML integers stop
/// at `i64::MAX`.
fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Int(value) => Ok(U256::from(value)),
        AmountRepr::Text(text) => U256::from_dec_str(text.trim())
            .map_err(|e| D::Error::custom(format!("invalid amount '{}': {:?}", text, e))),
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Reward schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward once the ramp-up completes.
    #[serde(deserialize_with = "deserialize_amount")]
    pub block_reward: U256,
    /// Reward at height 0.
    #[serde(deserialize_with = "deserialize_amount")]
    pub ramp_up_start: U256,
    /// Height at which the ramp-up completes.
    pub ramp_up_upper_bound: u64,
    /// Fixed reward once hybrid consensus is active.
    #[serde(deserialize_with = "deserialize_amount")]
    pub fixed_reward: U256,
    /// Mining reward floor after the signature swap.
    #[serde(deserialize_with = "deserialize_amount")]
    pub min_mining_reward: U256,
    /// Mining reward ceiling after the signature swap.
    #[serde(deserialize_with = "deserialize_amount")]
    pub max_mining_reward: U256,
    /// Inter-block seconds at which a mining block earns `fixed_reward`.
    pub target_block_time: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        let fixed = U256::from(4_500_000_000_000_000_000u64);
        Self {
            block_reward: U256::from(1_497_989_283_243_258_292u64),
            ramp_up_start: U256::from(748_994_641_621_655_092u64),
            ramp_up_upper_bound: 259_200,
            fixed_reward: fixed,
            min_mining_reward: fixed / U256::from(4u64),
            max_mining_reward: fixed * U256::from(2u64),
            target_block_time: 10,
        }
    }
}

impl RewardConfig {
    pub fn with_ramp_up(mut self, start: U256, block_reward: U256, upper_bound: u64) -> Self {
        self.ramp_up_start = start;
        self.block_reward = block_reward;
        self.ramp_up_upper_bound = upper_bound;
        self
    }

    pub fn with_fixed_reward(mut self, reward: U256) -> Self {
        self.fixed_reward = reward;
        self
    }

    pub fn with_mining_bounds(mut self, min: U256, max: U256, target_block_time: u64) -> Self {
        self.min_mining_reward = min;
        self.max_mining_reward = max;
        self.target_block_time = target_block_time;
        self
    }
}

/// Energy-limit rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Parent limit divided by this bounds the per-block change.
    pub limit_divisor: u64,
    /// Minimum energy limit.
    pub lower_bound: u64,
    /// Maximum extra-data bytes.
    pub max_extra_data_size: usize,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            limit_divisor: 1024,
            lower_bound: 1_050_000,
            max_extra_data_size: 32,
        }
    }
}

impl EnergyConfig {
    pub fn with_limit_bounds(mut self, divisor: u64, lower_bound: u64) -> Self {
        self.limit_divisor = divisor;
        self.lower_bound = lower_bound;
        self
    }

    pub fn with_max_extra_data_size(mut self, size: usize) -> Self {
        self.max_extra_data_size = size;
        self
    }
}

/// Difficulty rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub minimum_difficulty: u64,
    /// Parent difficulty divided by this is the per-block step.
    pub bound_divisor: u64,
    /// Target seconds between a mining block and its parent.
    pub mining_block_time: u64,
    /// Target seconds between a staking block and its parent.
    pub staking_block_time: u64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            minimum_difficulty: 16,
            bound_divisor: 2048,
            mining_block_time: 10,
            staking_block_time: 10,
        }
    }
}

impl DifficultyConfig {
    pub fn with_minimum_difficulty(mut self, minimum: u64) -> Self {
        self.minimum_difficulty = minimum;
        self
    }

    pub fn with_bound_divisor(mut self, divisor: u64) -> Self {
        self.bound_divisor = divisor;
        self
    }

    pub fn with_block_times(mut self, mining: u64, staking: u64) -> Self {
        self.mining_block_time = mining;
        self.staking_block_time = staking;
        self
    }
}

/// Execution-environment access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Bounded wait for exclusive access to the executor.
    pub lock_timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            lock_timeout_secs: 600,
        }
    }
}

impl ExecutionConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn with_lock_timeout_secs(mut self, secs: u64) -> Self {
        self.lock_timeout_secs = secs;
        self
    }
}

// =============================================================================
// ChainConfig
// =============================================================================

/// All consensus settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub fork: ForkConfig,
    pub reward: RewardConfig,
    pub energy: EnergyConfig,
    pub difficulty: DifficultyConfig,
    pub execution: ExecutionConfig,
}

impl ChainConfig {
    /// Parse from TOML and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_fork(mut self, fork: ForkConfig) -> Self {
        self.fork = fork;
        self
    }

    pub fn with_reward(mut self, reward: RewardConfig) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_energy(mut self, energy: EnergyConfig) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_difficulty(mut self, difficulty: DifficultyConfig) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Apply `HC_*` environment variables, then validate.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, then validate.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let parse = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(var) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| ConfigError::Env { var, value }),
                None => Ok(None),
            }
        };

        if let Some(height) = parse(ENV_HYBRID_FORK_HEIGHT)? {
            self.fork.hybrid_fork_height = ForkActivation::new(height);
        }
        if let Some(height) = parse(ENV_SIGNATURE_SWAP_FORK_HEIGHT)? {
            self.fork.signature_swap_fork_height = ForkActivation::new(height);
        }
        if let Some(secs) = parse(ENV_EXECUTION_LOCK_TIMEOUT_SECS)? {
            self.execution.lock_timeout_secs = secs;
        }

        self.validate()
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.energy.limit_divisor == 0 {
            return Err(ConfigError::Invalid(
                "energy.limit_divisor must be non-zero".into(),
            ));
        }
        if self.difficulty.bound_divisor == 0 {
            return Err(ConfigError::Invalid(
                "difficulty.bound_divisor must be non-zero".into(),
            ));
        }
        if self.difficulty.mining_block_time == 0 || self.difficulty.staking_block_time == 0 {
            return Err(ConfigError::Invalid(
                "difficulty block times must be non-zero".into(),
            ));
        }
        if self.reward.ramp_up_upper_bound == 0 {
            return Err(ConfigError::Invalid(
                "reward.ramp_up_upper_bound must be non-zero".into(),
            ));
        }
        if self.reward.ramp_up_start > self.reward.block_reward {
            return Err(ConfigError::Invalid(format!(
                "reward.ramp_up_start ({}) exceeds reward.block_reward ({})",
                self.reward.ramp_up_start, self.reward.block_reward
            )));
        }
        if self.reward.min_mining_reward > self.reward.max_mining_reward {
            return Err(ConfigError::Invalid(format!(
                "reward.min_mining_reward ({}) exceeds reward.max_mining_reward ({})",
                self.reward.min_mining_reward, self.reward.max_mining_reward
            )));
        }
        if self.reward.target_block_time == 0 {
            return Err(ConfigError::Invalid(
                "reward.target_block_time must be non-zero".into(),
            ));
        }
        if self.fork.signature_swap_fork_height < self.fork.hybrid_fork_height {
            return Err(ConfigError::Invalid(format!(
                "fork.signature_swap_fork_height ({:?}) precedes fork.hybrid_fork_height ({:?})",
                self.fork.signature_swap_fork_height.height(),
                self.fork.hybrid_fork_height.height()
            )));
        }
        if !self.fork.rollback_transactions.is_empty()
            && self.fork.signature_swap_fork_height.height().is_none()
        {
            return Err(ConfigError::Invalid(
                "fork.rollback_transactions requires fork.signature_swap_fork_height".into(),
            ));
        }
        Ok(())
    }
}
