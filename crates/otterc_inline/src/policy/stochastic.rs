use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ahash::AHashMap;
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::InlinePolicy;
use crate::codec;
use crate::error::{AdvisorError, Result};
use crate::key::CallEdgeKey;
use crate::record::{DecisionRecord, DecisionSummary};

/// Seeded random inliner that records every verdict it hands out.
///
/// The generator is ChaCha8, whose output stream is fixed for a given seed on
/// every platform. Feeding the same sequence of edges to a policy built from
/// the same seed yields the same sequence of decisions.
#[derive(Debug)]
pub struct StochasticPolicy {
    seed: u64,
    rng: ChaCha8Rng,
    coin: Uniform<u8>,
    log: Vec<DecisionRecord>,
    occurrences: AHashMap<CallEdgeKey, usize>,
    pretty: bool,
}

impl StochasticPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            coin: Uniform::new_inclusive(0, 1),
            log: Vec::new(),
            occurrences: AHashMap::new(),
            pretty: false,
        }
    }

    /// Pretty-print the document written by [`finalize`](Self::finalize).
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Draw one bit for `edge`, log it and return it.
    pub fn decide(&mut self, edge: CallEdgeKey) -> bool {
        let decision = self.coin.sample(&mut self.rng) == 1;
        debug!(edge = %edge, decision, "stochastic inline decision");

        let seen = self.occurrences.entry(edge.clone()).or_insert(0);
        *seen += 1;
        if *seen == 2 {
            warn!(
                edge = %edge,
                "edge decided more than once; the recorded config will not replay"
            );
        }

        self.log.push(DecisionRecord::new(edge, decision));
        decision
    }

    /// Drop the most recent decision. The generator is not rewound, so the
    /// next decision still consumes a fresh bit.
    pub fn undo_last(&mut self) -> Option<DecisionRecord> {
        let record = self.log.pop()?;
        if let Some(seen) = self.occurrences.get_mut(&record.edge) {
            *seen -= 1;
            if *seen == 0 {
                self.occurrences.remove(&record.edge);
            }
        }
        debug!(edge = %record.edge, "undid last inline decision");
        Some(record)
    }

    /// Encode the log and write it to `sink`.
    pub fn finalize<W: Write>(&self, sink: W) -> Result<()> {
        codec::write_records(sink, &self.log, self.pretty).map_err(|source| {
            AdvisorError::ConfigStore {
                target: "output sink".to_string(),
                source,
            }
        })
    }

    /// Write the log to `path`, replacing any previous document. A `path`
    /// of `-` writes to stdout.
    pub fn finalize_to_path(&self, path: &Path) -> Result<()> {
        self.finalize_to_path_or(path, || io::stdout().lock())
    }

    fn finalize_to_path_or<W, F>(&self, path: &Path, stdout: F) -> Result<()>
    where
        W: Write,
        F: FnOnce() -> W,
    {
        if codec::is_stdio(path) {
            self.finalize(stdout())?;
        } else {
            let store_error = |source| AdvisorError::ConfigStore {
                target: path.display().to_string(),
                source,
            };

            let file = File::create(path).map_err(store_error)?;
            codec::write_records(BufWriter::new(file), &self.log, self.pretty)
                .map_err(store_error)?;
        }

        info!(
            path = %path.display(),
            seed = self.seed,
            summary = %self.summary(),
            "stored inline config"
        );
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Decisions made so far, in the order they were made.
    pub fn records(&self) -> &[DecisionRecord] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn summary(&self) -> DecisionSummary {
        DecisionSummary::from_records(&self.log)
    }
}

impl InlinePolicy for StochasticPolicy {
    fn advise(&mut self, edge: &CallEdgeKey) -> Result<bool> {
        Ok(self.decide(edge.clone()))
    }

    fn summary(&self) -> DecisionSummary {
        Self::summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::SourceLoc;

    fn edges(count: u32) -> Vec<CallEdgeKey> {
        (0..count)
            .map(|idx| CallEdgeKey::from_call_site("main", format!("callee_{idx}"), [SourceLoc::new(idx + 1, 4)]))
            .collect()
    }

    fn run(seed: u64, edges: &[CallEdgeKey]) -> Vec<bool> {
        let mut policy = StochasticPolicy::new(seed);
        edges.iter().cloned().map(|edge| policy.decide(edge)).collect()
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let edges = edges(64);
        assert_eq!(run(42, &edges), run(42, &edges));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let edges = edges(64);
        assert_ne!(run(1, &edges), run(2, &edges));
    }

    #[test]
    fn test_both_outcomes_drawn() {
        let decisions = run(7, &edges(256));
        assert!(decisions.iter().any(|&d| d));
        assert!(decisions.iter().any(|&d| !d));
    }

    #[test]
    fn test_log_preserves_order() {
        let edges = edges(5);
        let mut policy = StochasticPolicy::new(3);
        let decisions: Vec<bool> = edges.iter().cloned().map(|e| policy.decide(e)).collect();

        assert_eq!(policy.len(), 5);
        for ((record, edge), decision) in policy.records().iter().zip(&edges).zip(decisions) {
            assert_eq!(&record.edge, edge);
            assert_eq!(record.decision, decision);
        }
    }

    #[test]
    fn test_undo_last_keeps_generator_state() {
        let edges = edges(3);
        let expected = run(11, &edges);

        let mut policy = StochasticPolicy::new(11);
        policy.decide(edges[0].clone());
        policy.decide(edges[1].clone());
        let undone = policy.undo_last().unwrap();
        assert_eq!(undone.edge, edges[1]);
        assert_eq!(policy.len(), 1);

        // The third draw is the same one an undisturbed run makes.
        assert_eq!(policy.decide(edges[2].clone()), expected[2]);
        assert_eq!(policy.records()[1].edge, edges[2]);
    }

    #[test]
    fn test_undo_on_empty_log() {
        let mut policy = StochasticPolicy::new(0);
        assert!(policy.undo_last().is_none());
        assert!(policy.is_empty());
    }

    #[test]
    fn test_finalize_writes_log() {
        let mut policy = StochasticPolicy::new(5);
        for edge in edges(4) {
            policy.decide(edge);
        }

        let mut sink = Vec::new();
        policy.finalize(&mut sink).unwrap();
        let decoded = codec::read_records(sink.as_slice()).unwrap();
        assert_eq!(decoded, policy.records());
    }

    #[test]
    fn test_dash_writes_to_stdout() {
        let mut policy = StochasticPolicy::new(21);
        for edge in edges(3) {
            policy.decide(edge);
        }

        let mut stdout = Vec::new();
        let sink = &mut stdout;
        policy
            .finalize_to_path_or(Path::new("-"), move || sink)
            .unwrap();

        assert_eq!(codec::read_records(stdout.as_slice()).unwrap(), policy.records());
    }

    #[test]
    fn test_finalize_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = StochasticPolicy::new(1).finalize_to_path(&path).unwrap_err();
        assert!(matches!(err, AdvisorError::ConfigStore { .. }));
    }
}
