//! Host-facing inline advisor
//!
//! The host inliner builds one [`InlineAdvisor`] per compilation, asks it for
//! a verdict on every candidate call edge in traversal order and tears it down
//! once the compilation unit is done. Stochastic sessions are written to the
//! configured document on teardown.

use std::fmt;

use tracing::{error, info};

use crate::config::{AdvisorConfig, AdvisorMode};
use crate::error::{AdvisorError, Result};
use crate::key::{CallEdgeKey, CallSite};
use crate::policy::{ActivePolicy, InlinePolicy, PredefinedPolicy, StochasticPolicy};
use crate::record::{DecisionRecord, DecisionSummary};

/// Lifecycle of an advisor. An advisor that has not selected a policy yet
/// does not exist as a value, so a live advisor starts out `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorState {
    Active,
    Finalized,
}

impl AdvisorState {
    pub fn name(self) -> &'static str {
        match self {
            AdvisorState::Active => "active",
            AdvisorState::Finalized => "finalized",
        }
    }
}

impl fmt::Display for AdvisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adapter between the host inliner and the selected policy.
#[derive(Debug)]
pub struct InlineAdvisor {
    config: AdvisorConfig,
    policy: ActivePolicy,
    state: AdvisorState,
}

impl InlineAdvisor {
    /// Pick the policy for this compilation. The choice is final.
    pub fn select(config: AdvisorConfig) -> Result<Self> {
        let policy = match config.mode {
            AdvisorMode::Predefined => {
                info!(path = %config.config_path.display(), "using predefined inline advisor");
                ActivePolicy::Predefined(PredefinedPolicy::load(&config.config_path)?)
            }
            AdvisorMode::Stochastic => {
                let seed = config.resolved_seed();
                info!(
                    seed,
                    path = %config.config_path.display(),
                    "using stochastic inline advisor"
                );
                ActivePolicy::Stochastic(StochasticPolicy::new(seed).with_pretty(config.pretty))
            }
        };

        Ok(Self {
            config,
            policy,
            state: AdvisorState::Active,
        })
    }

    /// Verdict for one call edge.
    pub fn decide(&mut self, edge: &CallEdgeKey) -> Result<bool> {
        self.ensure_active("decide")?;
        self.policy.advise(edge)
    }

    pub fn decide_call_site<C: CallSite + ?Sized>(&mut self, site: &C) -> Result<bool> {
        self.decide(&site.edge_key())
    }

    /// Forget the last stochastic decision because the host did not act on
    /// it. Predefined sessions have nothing to forget.
    pub fn undo_last(&mut self) -> Result<Option<DecisionRecord>> {
        self.ensure_active("undo_last")?;
        Ok(match &mut self.policy {
            ActivePolicy::Stochastic(policy) => policy.undo_last(),
            ActivePolicy::Predefined(_) => None,
        })
    }

    /// Finish the compilation. Stochastic sessions are written to the config
    /// path; calling this again afterwards does nothing.
    pub fn teardown(&mut self) -> Result<()> {
        if self.state == AdvisorState::Finalized {
            return Ok(());
        }
        self.state = AdvisorState::Finalized;

        match &self.policy {
            ActivePolicy::Stochastic(policy) => policy.finalize_to_path(&self.config.config_path),
            ActivePolicy::Predefined(policy) => {
                info!(entries = policy.len(), "predefined inline session finished");
                Ok(())
            }
        }
    }

    pub fn state(&self) -> AdvisorState {
        self.state
    }

    pub fn mode(&self) -> AdvisorMode {
        self.policy.mode()
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn policy(&self) -> &ActivePolicy {
        &self.policy
    }

    /// Seed driving a stochastic session.
    pub fn seed(&self) -> Option<u64> {
        match &self.policy {
            ActivePolicy::Stochastic(policy) => Some(policy.seed()),
            ActivePolicy::Predefined(_) => None,
        }
    }

    pub fn summary(&self) -> DecisionSummary {
        self.policy.summary()
    }

    fn ensure_active(&self, operation: &'static str) -> Result<()> {
        match self.state {
            AdvisorState::Active => Ok(()),
            state => Err(AdvisorError::InvalidState {
                operation,
                state: state.name(),
            }),
        }
    }
}

impl Drop for InlineAdvisor {
    fn drop(&mut self) {
        if self.state != AdvisorState::Active {
            return;
        }
        if let Err(err) = self.teardown() {
            error!(error = %err, "failed to store inline config on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::key::SourceLoc;
    use std::fs;

    fn edge(callee: &str, line: u32, column: u32) -> CallEdgeKey {
        CallEdgeKey::from_call_site("f", callee, [SourceLoc::new(line, column)])
    }

    #[test]
    fn test_record_then_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inline.json");
        let e1 = edge("g", 10, 3);
        let e2 = edge("h", 12, 5);

        let mut recorder = InlineAdvisor::select(AdvisorConfig::stochastic(42, &path)).unwrap();
        let d1 = recorder.decide(&e1).unwrap();
        let d2 = recorder.decide(&e2).unwrap();
        recorder.teardown().unwrap();
        assert_eq!(recorder.state(), AdvisorState::Finalized);

        let mut replayer = InlineAdvisor::select(AdvisorConfig::predefined(&path)).unwrap();
        assert_eq!(replayer.mode(), AdvisorMode::Predefined);
        assert_eq!(replayer.decide(&e2).unwrap(), d2);
        assert_eq!(replayer.decide(&e1).unwrap(), d1);
        assert!(matches!(
            replayer.decide(&edge("k", 1, 1)),
            Err(AdvisorError::UnknownEdge { .. })
        ));
    }

    #[test]
    fn test_decide_after_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let mut advisor =
            InlineAdvisor::select(AdvisorConfig::stochastic(1, dir.path().join("a.json"))).unwrap();
        advisor.teardown().unwrap();

        let err = advisor.decide(&edge("g", 1, 1)).unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidState { operation: "decide", .. }));
        assert!(advisor.undo_last().is_err());
    }

    #[test]
    fn test_second_teardown_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        let mut advisor = InlineAdvisor::select(AdvisorConfig::stochastic(1, &path)).unwrap();
        advisor.decide(&edge("g", 1, 1)).unwrap();
        advisor.teardown().unwrap();

        fs::remove_file(&path).unwrap();
        advisor.teardown().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_undo_last_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        let mut advisor = InlineAdvisor::select(AdvisorConfig::stochastic(8, &path)).unwrap();
        advisor.decide(&edge("g", 1, 1)).unwrap();
        advisor.decide(&edge("h", 2, 1)).unwrap();
        let undone = advisor.undo_last().unwrap().unwrap();
        assert_eq!(undone.edge, edge("h", 2, 1));
        advisor.teardown().unwrap();

        let records = codec::decode_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].edge, edge("g", 1, 1));
    }

    #[test]
    fn test_drop_flushes_stochastic_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.json");
        {
            let mut advisor = InlineAdvisor::select(AdvisorConfig::stochastic(3, &path)).unwrap();
            advisor.decide(&edge("g", 4, 2)).unwrap();
        }

        let records = codec::decode_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_failed_teardown_still_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let mut advisor = InlineAdvisor::select(AdvisorConfig::stochastic(2, &path)).unwrap();
        advisor.decide(&edge("g", 1, 1)).unwrap();

        let err = advisor.teardown().unwrap_err();
        assert!(matches!(err, AdvisorError::ConfigStore { .. }));
        assert_eq!(advisor.state(), AdvisorState::Finalized);

        advisor.teardown().unwrap();
        assert!(advisor.decide(&edge("h", 2, 1)).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_write_on_drop_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("dropped.json");
        {
            let mut advisor = InlineAdvisor::select(AdvisorConfig::stochastic(2, &path)).unwrap();
            advisor.decide(&edge("g", 1, 1)).unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_predefined_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = InlineAdvisor::select(AdvisorConfig::predefined(dir.path().join("none.json")))
            .unwrap_err();
        assert!(matches!(err, AdvisorError::ConfigLoad { .. }));
    }

    #[test]
    fn test_predefined_teardown_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        fs::write(
            &path,
            r#"{"CGEdges":[{"caller":"f","callee":"g","location":[[1,1]],"decision":true}]}"#,
        )
        .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let mut advisor = InlineAdvisor::select(AdvisorConfig::predefined(&path)).unwrap();
        assert!(advisor.decide(&edge("g", 1, 1)).unwrap());
        assert!(advisor.undo_last().unwrap().is_none());
        assert_eq!(advisor.seed(), None);
        advisor.teardown().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }
}
