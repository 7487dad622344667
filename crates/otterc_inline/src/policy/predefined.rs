use std::fs;
use std::io::{self, Read};
use std::path::Path;

use ahash::AHashMap;
use tracing::{debug, info};

use super::InlinePolicy;
use crate::codec;
use crate::error::{AdvisorError, Result};
use crate::key::CallEdgeKey;
use crate::record::{DecisionRecord, DecisionSummary};

/// Replays a recorded decision table.
///
/// Lookups are exact: an edge that is not in the table means the compilation
/// being replayed is not the one that was recorded, and that is an error.
#[derive(Debug, Clone)]
pub struct PredefinedPolicy {
    records: Vec<DecisionRecord>,
    index: AHashMap<CallEdgeKey, bool>,
}

impl PredefinedPolicy {
    /// Load the table stored at `path`, or read it from stdin when `path`
    /// is `-`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_or_read(path, || io::stdin().lock())
    }

    fn load_or_read<R, F>(path: &Path, stdin: F) -> Result<Self>
    where
        R: Read,
        F: FnOnce() -> R,
    {
        let policy = if codec::is_stdio(path) {
            Self::from_reader(stdin())?
        } else {
            let text = fs::read_to_string(path).map_err(|source| AdvisorError::ConfigLoad {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_records(codec::decode_str(&text)?)?
        };

        info!(
            path = %path.display(),
            summary = %policy.summary(),
            "loaded inline config"
        );
        Ok(policy)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_records(codec::read_records(reader)?)
    }

    /// Build the lookup table. Each edge may appear only once.
    pub fn from_records(records: Vec<DecisionRecord>) -> Result<Self> {
        let mut index = AHashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if index.insert(record.edge.clone(), record.decision).is_some() {
                return Err(AdvisorError::malformed(format!(
                    "duplicate edge {} at entry {idx}",
                    record.edge
                )));
            }
        }

        Ok(Self { records, index })
    }

    /// Recorded verdict for `edge`.
    pub fn decide(&self, edge: &CallEdgeKey) -> Result<bool> {
        let decision = self
            .index
            .get(edge)
            .copied()
            .ok_or_else(|| AdvisorError::UnknownEdge { edge: edge.clone() })?;
        debug!(edge = %edge, decision, "predefined inline decision");
        Ok(decision)
    }

    pub fn contains(&self, edge: &CallEdgeKey) -> bool {
        self.index.contains_key(edge)
    }

    /// Table entries in document order.
    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> DecisionSummary {
        DecisionSummary::from_records(&self.records)
    }
}

impl InlinePolicy for PredefinedPolicy {
    fn advise(&mut self, edge: &CallEdgeKey) -> Result<bool> {
        self.decide(edge)
    }

    fn summary(&self) -> DecisionSummary {
        Self::summary(self)
    }
}
