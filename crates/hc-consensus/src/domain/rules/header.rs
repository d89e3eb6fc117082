//! Self-contained rules.

use super::{fail, HeaderRule, RuleError};
use shared_types::{BlockHeader, Seal, SealType, U256};

/// `energy_consumed <= energy_limit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnergyConsumedRule;

impl HeaderRule for EnergyConsumedRule {
    fn name(&self) -> &'static str {
        "EnergyConsumedRule"
    }

    fn validate(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) -> bool {
        if header.energy_consumed() > header.energy_limit() {
            return fail(
                errors,
                self.name(),
                format!(
                    "energyConsumed ({}) exceeds energyLimit ({})",
                    header.energy_consumed(),
                    header.energy_limit()
                ),
            );
        }
        true
    }
}

/// Bounded extra data.
#[derive(Debug, Clone, Copy)]
pub struct ExtraDataRule {
    max_size: usize,
}

impl ExtraDataRule {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl HeaderRule for ExtraDataRule {
    fn name(&self) -> &'static str {
        "ExtraDataRule"
    }

    fn validate(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) -> bool {
        let size = header.extra_data().len();
        if size > self.max_size {
            return fail(
                errors,
                self.name(),
                format!("extraData size ({}) exceeds maximum ({})", size, self.max_size),
            );
        }
        true
    }
}

/// `difficulty >= minimum`.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyBoundsRule {
    minimum: U256,
}

impl DifficultyBoundsRule {
    pub fn new(minimum: U256) -> Self {
        Self { minimum }
    }
}

impl HeaderRule for DifficultyBoundsRule {
    fn name(&self) -> &'static str {
        "DifficultyBoundsRule"
    }

    fn validate(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) -> bool {
        if header.difficulty() < self.minimum {
            return fail(
                errors,
                self.name(),
                format!(
                    "difficulty ({}) lower than minimum ({})",
                    header.difficulty(),
                    self.minimum
                ),
            );
        }
        true
    }
}

/// Staking headers require hybrid consensus at the header's height.
#[derive(Debug, Clone, Copy)]
pub struct SealTypeRule {
    hybrid_active: bool,
}

impl SealTypeRule {
    pub fn new(hybrid_active: bool) -> Self {
        Self { hybrid_active }
    }
}

impl HeaderRule for SealTypeRule {
    fn name(&self) -> &'static str {
        "SealTypeRule"
    }

    fn validate(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) -> bool {
        if header.seal_type() == SealType::Staking && !self.hybrid_active {
            return fail(
                errors,
                self.name(),
                format!(
                    "staking block at height {} before hybrid consensus activation",
                    header.number()
                ),
            );
        }
        true
    }
}

/// Staking seed length for the active signature scheme.
#[derive(Debug, Clone, Copy)]
pub struct StakingSeedRule {
    expected_len: usize,
}

impl StakingSeedRule {
    pub fn new(expected_len: usize) -> Self {
        Self { expected_len }
    }
}

impl HeaderRule for StakingSeedRule {
    fn name(&self) -> &'static str {
        "StakingSeedRule"
    }

    fn validate(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) -> bool {
        match header.seal() {
            Seal::Staking { seed, .. } if seed.len() != self.expected_len => fail(
                errors,
                self.name(),
                format!(
                    "seed length ({}) does not match expected ({})",
                    seed.len(),
                    self.expected_len
                ),
            ),
            _ => true,
        }
    }
}
