//! Regression comparison between two recorded sessions

use ahash::AHashMap;

use crate::key::CallEdgeKey;
use crate::record::DecisionRecord;

/// An edge recorded in both sessions with different verdicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlippedDecision {
    pub edge: CallEdgeKey,
    pub baseline: bool,
    pub candidate: bool,
}

/// Differences between a baseline and a candidate decision table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    pub matching: usize,
    pub flipped: Vec<FlippedDecision>,
    pub only_in_baseline: Vec<DecisionRecord>,
    pub only_in_candidate: Vec<DecisionRecord>,
}

impl ConfigDiff {
    pub fn is_identical(&self) -> bool {
        self.flipped.is_empty() && self.only_in_baseline.is_empty() && self.only_in_candidate.is_empty()
    }
}

/// Compare two tables edge by edge. Results follow the candidate's order for
/// flipped and candidate-only edges, and the baseline's order otherwise.
pub fn compare(baseline: &[DecisionRecord], candidate: &[DecisionRecord]) -> ConfigDiff {
    let baseline_index: AHashMap<&CallEdgeKey, bool> = baseline
        .iter()
        .map(|record| (&record.edge, record.decision))
        .collect();
    let candidate_index: AHashMap<&CallEdgeKey, bool> = candidate
        .iter()
        .map(|record| (&record.edge, record.decision))
        .collect();

    let mut diff = ConfigDiff::default();

    for record in candidate {
        match baseline_index.get(&record.edge) {
            Some(&decision) if decision == record.decision => diff.matching += 1,
            Some(&decision) => diff.flipped.push(FlippedDecision {
                edge: record.edge.clone(),
                baseline: decision,
                candidate: record.decision,
            }),
            None => diff.only_in_candidate.push(record.clone()),
        }
    }

    diff.only_in_baseline = baseline
        .iter()
        .filter(|record| !candidate_index.contains_key(&record.edge))
        .cloned()
        .collect();

    diff
}
