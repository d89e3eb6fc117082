//! # Header Rules
//!
//! Composable header-validation predicates.
//!
//! Rules come in two shapes: [`HeaderRule`] sees only the header,
//! [`DependentHeaderRule`] sees the header and its direct parent. A
//! [`RuleChain`] runs every rule it holds and collects each failure, so one
//! pass reports all violations.
//!
//! ## Module Structure
//!
//! - `header` - Self-contained rules
//! - `dependent` - Parent-dependent rules
//! - `chain` - `RuleChain` and the fork-aware `RuleChainFactory`

mod chain;
mod dependent;
mod header;


pub use chain::{RuleChain, RuleChainFactory};
pub use dependent::{DifficultyRule, EnergyLimitRule, ParentNumberRule, TimestampRule};
pub use header::{
    DifficultyBoundsRule, EnergyConsumedRule, ExtraDataRule, SealTypeRule, StakingSeedRule,
};

use shared_types::BlockHeader;

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    /// Name of the failing rule.
    pub rule: &'static str,
    /// Cause, with the observed values.
    pub message: String,
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Outcome of validating one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult {
    Pass,
    /// Every violation, in rule order.
    Fail(Vec<RuleError>),
}

impl RuleResult {
    pub fn from_errors(errors: Vec<RuleError>) -> Self {
        if errors.is_empty() {
            RuleResult::Pass
        } else {
            RuleResult::Fail(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, RuleResult::Pass)
    }

    pub fn errors(&self) -> &[RuleError] {
        match self {
            RuleResult::Pass => &[],
            RuleResult::Fail(errors) => errors,
        }
    }

    pub fn into_errors(self) -> Vec<RuleError> {
        match self {
            RuleResult::Pass => Vec::new(),
            RuleResult::Fail(errors) => errors,
        }
    }
}

/// Rule over a header's own fields.
pub trait HeaderRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Append a diagnostic to `errors` and return `false` on violation.
    fn validate(&self, header: &BlockHeader, errors: &mut Vec<RuleError>) -> bool;
}

/// Rule over a header and its direct parent.
pub trait DependentHeaderRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Append a diagnostic to `errors` and return `false` on violation.
    fn validate(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        errors: &mut Vec<RuleError>,
    ) -> bool;
}

pub(crate) fn fail(errors: &mut Vec<RuleError>, rule: &'static str, message: String) -> bool {
    errors.push(RuleError { rule, message });
    false
}
