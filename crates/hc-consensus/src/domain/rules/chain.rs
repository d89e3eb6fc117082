//! Rule composition and fork-aware rule-set selection.

use super::{
    DependentHeaderRule, DifficultyBoundsRule, DifficultyRule, EnergyConsumedRule,
    EnergyLimitRule, ExtraDataRule, HeaderRule, ParentNumberRule, RuleError, RuleResult,
    SealTypeRule, StakingSeedRule, TimestampRule,
};
use crate::domain::config::{DifficultyConfig, EnergyConfig};
use crate::domain::difficulty::TimeAdjustedDifficultyCalculator;
use crate::domain::fork::ForkUtility;
use shared_types::{BlockHeader, SealType, U256, SIGNATURE_SEED_LEN, VRF_SEED_LEN};

/// Ordered rules combined by logical AND.
#[derive(Default)]
pub struct RuleChain {
    header_rules: Vec<Box<dyn HeaderRule>>,
    dependent_rules: Vec<Box<dyn DependentHeaderRule>>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl HeaderRule + 'static) -> Self {
        self.header_rules.push(Box::new(rule));
        self
    }

    pub fn with_dependent_rule(mut self, rule: impl DependentHeaderRule + 'static) -> Self {
        self.dependent_rules.push(Box::new(rule));
        self
    }

    /// Names of the held rules, self-contained first.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.header_rules
            .iter()
            .map(|r| r.name())
            .chain(self.dependent_rules.iter().map(|r| r.name()))
            .collect()
    }

    /// Run the self-contained rules only.
    pub fn validate_header(&self, header: &BlockHeader) -> RuleResult {
        let mut errors = Vec::new();
        self.run_header_rules(header, &mut errors);
        RuleResult::from_errors(errors)
    }

    /// Run every rule against `header` and its direct `parent`.
    pub fn validate(&self, header: &BlockHeader, parent: &BlockHeader) -> RuleResult {
        let mut errors = Vec::new();
        self.run_header_rules(header, &mut errors);
        for rule in &self.dependent_rules {
            rule.validate(header, parent, &mut errors);
        }
        RuleResult::from_errors(errors)
    }

    fn run_header_rules(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) {
        for rule in &self.header_rules {
            rule.validate(header, errors);
        }
    }
}

impl std::fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleChain")
            .field("rules", &self.rule_names())
            .finish()
    }
}

/// Builds the rule chain for a seal type at a height.
#[derive(Debug, Clone)]
pub struct RuleChainFactory {
    fork: ForkUtility,
    energy: EnergyConfig,
    difficulty: DifficultyConfig,
}

impl RuleChainFactory {
    pub fn new(fork: ForkUtility, energy: EnergyConfig, difficulty: DifficultyConfig) -> Self {
        Self {
            fork,
            energy,
            difficulty,
        }
    }

    /// Rules for a `seal` header at `height`.
    ///
    /// Both seal types share the energy, extra-data, difficulty and parent
    /// rules; the expected difficulty uses the target time of `seal`.
    /// Staking headers add the seal-type gate and the seed length of the
    /// scheme active at `height`.
    pub fn header_rules(&self, seal: SealType, height: u64) -> RuleChain {
        let mut chain = RuleChain::new()
            .with_rule(EnergyConsumedRule)
            .with_rule(ExtraDataRule::new(self.energy.max_extra_data_size))
            .with_rule(DifficultyBoundsRule::new(U256::from(
                self.difficulty.minimum_difficulty,
            )));

        if seal == SealType::Staking {
            let seed_len = if self.fork.is_signature_swap_active(height) {
                VRF_SEED_LEN
            } else {
                SIGNATURE_SEED_LEN
            };
            chain = chain
                .with_rule(SealTypeRule::new(self.fork.is_hybrid_consensus_active(height)))
                .with_rule(StakingSeedRule::new(seed_len));
        }

        chain
            .with_dependent_rule(ParentNumberRule)
            .with_dependent_rule(TimestampRule)
            .with_dependent_rule(EnergyLimitRule::new(
                self.energy.limit_divisor,
                self.energy.lower_bound,
            ))
            .with_dependent_rule(DifficultyRule::new(
                TimeAdjustedDifficultyCalculator::for_seal(&self.difficulty, seal),
            ))
    }

    /// Validate `header` against `parent` with the rules for its seal and height.
    pub fn validate(&self, header: &BlockHeader, parent: &BlockHeader) -> RuleResult {
        self.header_rules(header.seal_type(), header.number())
            .validate(header, parent)
    }
}
