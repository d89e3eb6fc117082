//! # Block Rewards
//!
//! Two eras:
//!
//! - **Ramp-up**: before hybrid consensus, the reward climbs linearly from
//!   `ramp_up_start` to `block_reward` over `ramp_up_upper_bound` blocks and
//!   stays at `block_reward` afterwards.
//! - **Fixed / time-varying**: once hybrid consensus is active, staking
//!   blocks earn a constant reward. After the signature swap, mining blocks
//!   earn an amount proportional to the time since their parent, clamped to
//!   `[min_mining_reward, max_mining_reward]`.
//!
//! [`RewardPolicy`] routes a `(seal, height)` pair to the right calculator.

use crate::domain::config::RewardConfig;
use crate::domain::fork::ForkUtility;
use shared_types::{SealType, U256};

/// Inputs a calculator may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardInput {
    pub height: u64,
    /// Seconds since the parent block.
    pub time_span: u64,
}

impl RewardInput {
    pub fn at_height(height: u64) -> Self {
        Self {
            height,
            time_span: 0,
        }
    }
}

/// A reward formula.
pub trait RewardsCalculator: Send + Sync {
    fn calculate_reward(&self, input: &RewardInput) -> U256;
}

/// Linear ramp from `start` to `block_reward`.
#[derive(Debug, Clone)]
pub struct RampUpRewardsCalculator {
    start: U256,
    block_reward: U256,
    upper_bound: u64,
    slope: U256,
}

impl RampUpRewardsCalculator {
    pub fn new(start: U256, block_reward: U256, upper_bound: u64) -> Self {
        let slope = if upper_bound == 0 {
            U256::zero()
        } else {
            block_reward.saturating_sub(start) / U256::from(upper_bound)
        };
        Self {
            start,
            block_reward,
            upper_bound,
            slope,
        }
    }

    pub fn from_config(config: &RewardConfig) -> Self {
        Self::new(
            config.ramp_up_start,
            config.block_reward,
            config.ramp_up_upper_bound,
        )
    }

    /// Per-block increment, floored.
    pub fn slope(&self) -> U256 {
        self.slope
    }
}

impl RewardsCalculator for RampUpRewardsCalculator {
    fn calculate_reward(&self, input: &RewardInput) -> U256 {
        if input.height > self.upper_bound {
            return self.block_reward;
        }
        self.start
            .saturating_add(self.slope.saturating_mul(U256::from(input.height)))
            .min(self.block_reward)
    }
}

/// Same reward for every block.
#[derive(Debug, Clone)]
pub struct FixedRewardsCalculator {
    reward: U256,
}

impl FixedRewardsCalculator {
    pub fn new(reward: U256) -> Self {
        Self { reward }
    }
}

impl RewardsCalculator for FixedRewardsCalculator {
    fn calculate_reward(&self, _input: &RewardInput) -> U256 {
        self.reward
    }
}

/// `clamp(base * time_span / target_span, min, max)`.
///
/// Non-decreasing in `time_span`; a span of `target_span` earns `base`.
#[derive(Debug, Clone)]
pub struct TimeVaryingRewardsCalculator {
    base: U256,
    target_span: u64,
    min: U256,
    max: U256,
}

impl TimeVaryingRewardsCalculator {
    pub fn new(base: U256, target_span: u64, min: U256, max: U256) -> Self {
        Self {
            base,
            target_span: target_span.max(1),
            min,
            max: max.max(min),
        }
    }

    pub fn from_config(config: &RewardConfig) -> Self {
        Self::new(
            config.fixed_reward,
            config.target_block_time,
            config.min_mining_reward,
            config.max_mining_reward,
        )
    }
}

impl RewardsCalculator for TimeVaryingRewardsCalculator {
    fn calculate_reward(&self, input: &RewardInput) -> U256 {
        let scaled = self.base.saturating_mul(U256::from(input.time_span)) / U256::from(self.target_span);
        scaled.clamp(self.min, self.max)
    }
}

/// Which calculator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardEra {
    RampUp,
    Fixed,
    TimeVarying,
}

/// Fork-aware calculator selection.
///
/// | Height | Mining | Staking |
/// |--------|--------|---------|
/// | before hybrid | ramp-up | ramp-up |
/// | hybrid | fixed | fixed |
/// | after signature swap | time-varying | fixed |
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    fork: ForkUtility,
    ramp_up: RampUpRewardsCalculator,
    fixed: FixedRewardsCalculator,
    time_varying: TimeVaryingRewardsCalculator,
}

impl RewardPolicy {
    pub fn new(fork: ForkUtility, config: &RewardConfig) -> Self {
        Self {
            fork,
            ramp_up: RampUpRewardsCalculator::from_config(config),
            fixed: FixedRewardsCalculator::new(config.fixed_reward),
            time_varying: TimeVaryingRewardsCalculator::from_config(config),
        }
    }

    pub fn era(&self, seal: SealType, height: u64) -> RewardEra {
        if !self.fork.is_hybrid_consensus_active(height) {
            RewardEra::RampUp
        } else if seal == SealType::Mining && self.fork.is_signature_swap_active(height) {
            RewardEra::TimeVarying
        } else {
            RewardEra::Fixed
        }
    }

    pub fn calculator(&self, seal: SealType, height: u64) -> &dyn RewardsCalculator {
        match self.era(seal, height) {
            RewardEra::RampUp => &self.ramp_up,
            RewardEra::Fixed => &self.fixed,
            RewardEra::TimeVarying => &self.time_varying,
        }
    }

    pub fn calculate_reward(&self, seal: SealType, input: &RewardInput) -> U256 {
        self.calculator(seal, input.height).calculate_reward(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fork::{ForkActivation, ForkConfig};
    use proptest::prelude::*;

    const START: u64 = 748_994_641_621_655_092;
    const BLOCK_REWARD: u64 = 1_497_989_283_243_258_292;
    const UPPER_BOUND: u64 = 259_200;
    const FIXED: u64 = 4_500_000_000_000_000_000;

    fn aion() -> RampUpRewardsCalculator {
        RampUpRewardsCalculator::new(U256::from(START), U256::from(BLOCK_REWARD), UPPER_BOUND)
    }

    fn reward(calc: &dyn RewardsCalculator, height: u64) -> U256 {
        calc.calculate_reward(&RewardInput::at_height(height))
    }

    fn policy() -> RewardPolicy {
        let fork = ForkUtility::new(
            ForkConfig::default()
                .with_hybrid_fork(ForkActivation::new(2))
                .with_signature_swap_fork(ForkActivation::new(5)),
        );
        RewardPolicy::new(fork, &RewardConfig::default())
    }

    #[test]
    fn test_ramp_up_known_values() {
        let calc = aion();
        assert_eq!(calc.slope(), U256::from(2_889_639_821_071u64));
        assert_eq!(reward(&calc, 0), U256::from(START));
        assert_eq!(reward(&calc, 1), U256::from(748_997_531_261_476_163u64));
        assert_eq!(reward(&calc, UPPER_BOUND), U256::from(BLOCK_REWARD));
        assert_eq!(reward(&calc, UPPER_BOUND + 1), U256::from(BLOCK_REWARD));
        assert_eq!(reward(&calc, u64::MAX), U256::from(BLOCK_REWARD));
    }

    #[test]
    fn test_ramp_up_boundary_step_when_span_not_divisible() {
        let calc = RampUpRewardsCalculator::new(U256::from(100u64), U256::from(1_000u64), 7);
        assert_eq!(calc.slope(), U256::from(128u64));
        assert_eq!(reward(&calc, 7), U256::from(996u64));
        assert!(reward(&calc, 7) < reward(&calc, 8));
        assert_eq!(reward(&calc, 8), U256::from(1_000u64));
        assert_eq!(reward(&calc, 8), reward(&calc, 1_000));
    }

    #[test]
    fn test_ramp_up_degenerate_bound() {
        let calc = RampUpRewardsCalculator::new(U256::from(5u64), U256::from(9u64), 0);
        assert_eq!(reward(&calc, 0), U256::from(5u64));
        assert_eq!(reward(&calc, 1), U256::from(9u64));
    }

    proptest! {
        #[test]
        fn prop_ramp_up_monotonic_and_capped(h in 0u64..400_000) {
            let calc = aion();
            let here = reward(&calc, h);
            let next = reward(&calc, h + 1);
            prop_assert!(here <= next);
            prop_assert!(next <= U256::from(BLOCK_REWARD));
            if h > UPPER_BOUND {
                prop_assert_eq!(here, U256::from(BLOCK_REWARD));
            }
        }

        #[test]
        fn prop_time_varying_monotonic(span in 0u64..1_000) {
            let calc = TimeVaryingRewardsCalculator::from_config(&RewardConfig::default());
            let input = |s| RewardInput { height: 10, time_span: s };
            prop_assert!(calc.calculate_reward(&input(span)) <= calc.calculate_reward(&input(span + 1)));
        }
    }

    #[test]
    fn test_time_varying_clamps() {
        let calc = TimeVaryingRewardsCalculator::from_config(&RewardConfig::default());
        let at = |s| calc.calculate_reward(&RewardInput { height: 10, time_span: s });

        assert_eq!(at(10), U256::from(FIXED));
        assert_eq!(at(0), U256::from(1_125_000_000_000_000_000u64));
        assert_eq!(at(15), U256::from(6_750_000_000_000_000_000u64));
        assert_eq!(at(10_000), U256::from(9_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_policy_routes_by_fork_and_seal() {
        let policy = policy();
        assert_eq!(policy.era(SealType::Mining, 1), RewardEra::RampUp);
        assert_eq!(policy.era(SealType::Mining, 2), RewardEra::Fixed);
        assert_eq!(policy.era(SealType::Staking, 4), RewardEra::Fixed);
        assert_eq!(policy.era(SealType::Mining, 5), RewardEra::TimeVarying);
        assert_eq!(policy.era(SealType::Staking, 5), RewardEra::Fixed);
    }

    #[test]
    fn test_policy_amounts() {
        let policy = policy();
        assert_eq!(
            policy.calculate_reward(SealType::Mining, &RewardInput::at_height(1)),
            U256::from(748_997_531_261_476_163u64)
        );
        assert_eq!(
            policy.calculate_reward(SealType::Staking, &RewardInput::at_height(3)),
            U256::from(FIXED)
        );
        assert_eq!(
            policy.calculate_reward(
                SealType::Mining,
                &RewardInput {
                    height: 6,
                    time_span: 10
                }
            ),
            U256::from(FIXED)
        );
    }
}
