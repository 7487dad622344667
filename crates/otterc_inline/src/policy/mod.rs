//! Decision policies
//!
//! Both policies answer the same question for a call edge. The advisor picks
//! exactly one of them per compilation and holds it as an [`ActivePolicy`].

pub mod predefined;
pub mod stochastic;

pub use predefined::PredefinedPolicy;
pub use stochastic::StochasticPolicy;

use crate::config::AdvisorMode;
use crate::error::Result;
use crate::key::CallEdgeKey;
use crate::record::DecisionSummary;

/// Capability shared by every decision policy.
pub trait InlinePolicy {
    /// Inline verdict for `edge`.
    fn advise(&mut self, edge: &CallEdgeKey) -> Result<bool>;

    /// Counts over the decisions this policy holds.
    fn summary(&self) -> DecisionSummary;
}

/// The policy selected for a compilation.
#[derive(Debug)]
pub enum ActivePolicy {
    Stochastic(StochasticPolicy),
    Predefined(PredefinedPolicy),
}

impl ActivePolicy {
    pub fn mode(&self) -> AdvisorMode {
        match self {
            Self::Stochastic(_) => AdvisorMode::Stochastic,
            Self::Predefined(_) => AdvisorMode::Predefined,
        }
    }
}

impl InlinePolicy for ActivePolicy {
    fn advise(&mut self, edge: &CallEdgeKey) -> Result<bool> {
        match self {
            Self::Stochastic(policy) => policy.advise(edge),
            Self::Predefined(policy) => policy.advise(edge),
        }
    }

    fn summary(&self) -> DecisionSummary {
        match self {
            Self::Stochastic(policy) => InlinePolicy::summary(policy),
            Self::Predefined(policy) => InlinePolicy::summary(policy),
        }
    }
}
