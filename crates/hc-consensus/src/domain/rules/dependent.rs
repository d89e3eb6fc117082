//! Parent-dependent rules.

use super::{fail, DependentHeaderRule, RuleError};
use crate::domain::difficulty::DifficultyCalculator;
use shared_types::BlockHeader;

/// `difficulty` equals what the calculator derives from the parent.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyRule<C> {
    calculator: C,
}

impl<C: DifficultyCalculator> DifficultyRule<C> {
    pub fn new(calculator: C) -> Self {
        Self { calculator }
    }
}

impl<C: DifficultyCalculator> DependentHeaderRule for DifficultyRule<C> {
    fn name(&self) -> &'static str {
        "DifficultyRule"
    }

    fn validate(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        errors: &mut Vec<RuleError>,
    ) -> bool {
        let expected = self.calculator.calculate_difficulty(header, parent);
        if header.difficulty() != expected {
            return fail(
                errors,
                self.name(),
                format!(
                    "difficulty ({}) does not match expected ({})",
                    header.difficulty(),
                    expected
                ),
            );
        }
        true
    }
}

/// Energy limit floor and per-block adjustment bound.
///
/// Valid when `energyLimit >= lower_bound` and
/// `|energyLimit - parent.energyLimit| <= parent.energyLimit / divisor`.
#[derive(Debug, Clone, Copy)]
pub struct EnergyLimitRule {
    divisor: u64,
    lower_bound: u64,
}

impl EnergyLimitRule {
    /// `divisor` must be non-zero; `ChainConfig::validate` enforces it.
    pub fn new(divisor: u64, lower_bound: u64) -> Self {
        Self {
            divisor: divisor.max(1),
            lower_bound,
        }
    }
}

impl DependentHeaderRule for EnergyLimitRule {
    fn name(&self) -> &'static str {
        "EnergyLimitRule"
    }

    fn validate(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        errors: &mut Vec<RuleError>,
    ) -> bool {
        let energy_limit = header.energy_limit();
        let parent_quotient = parent.energy_limit() / self.divisor;

        if energy_limit < self.lower_bound {
            return fail(
                errors,
                self.name(),
                format!(
                    "energyLimit ({}) lower than lower bound ({})",
                    energy_limit, self.lower_bound
                ),
            );
        }

        let delta = energy_limit.abs_diff(parent.energy_limit());
        if delta > parent_quotient {
            return fail(
                errors,
                self.name(),
                format!(
                    "energyLimit ({}) of current block has delta ({}) greater than bounds ({})",
                    energy_limit, delta, parent_quotient
                ),
            );
        }
        true
    }
}

/// `number == parent.number + 1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParentNumberRule;

impl DependentHeaderRule for ParentNumberRule {
    fn name(&self) -> &'static str {
        "ParentNumberRule"
    }

    fn validate(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        errors: &mut Vec<RuleError>,
    ) -> bool {
        if Some(header.number()) != parent.number().checked_add(1) {
            return fail(
                errors,
                self.name(),
                format!(
                    "blockNumber ({}) is not parent's ({}) + 1",
                    header.number(),
                    parent.number()
                ),
            );
        }
        true
    }
}

/// `timestamp > parent.timestamp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampRule;

impl DependentHeaderRule for TimestampRule {
    fn name(&self) -> &'static str {
        "TimestampRule"
    }

    fn validate(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        errors: &mut Vec<RuleError>,
    ) -> bool {
        if header.timestamp() <= parent.timestamp() {
            return fail(
                errors,
                self.name(),
                format!(
                    "timestamp ({}) is not greater than parent timestamp ({})",
                    header.timestamp(),
                    parent.timestamp()
                ),
            );
        }
        true
    }
}
