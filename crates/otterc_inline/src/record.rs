use std::fmt;

use crate::key::CallEdgeKey;

/// One inlining verdict for one call edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionRecord {
    pub edge: CallEdgeKey,
    pub decision: bool,
}

impl DecisionRecord {
    pub fn new(edge: CallEdgeKey, decision: bool) -> Self {
        Self { edge, decision }
    }
}

impl From<(CallEdgeKey, bool)> for DecisionRecord {
    fn from((edge, decision): (CallEdgeKey, bool)) -> Self {
        Self { edge, decision }
    }
}

/// Inlined/declined counts over a decision table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionSummary {
    pub total: usize,
    pub inlined: usize,
    pub declined: usize,
}

impl DecisionSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DecisionRecord>,
    {
        records
            .into_iter()
            .fold(Self::default(), |mut summary, record| {
                summary.record(record.decision);
                summary
            })
    }

    pub fn record(&mut self, decision: bool) {
        self.total += 1;
        if decision {
            self.inlined += 1;
        } else {
            self.declined += 1;
        }
    }

    /// Share of edges that were inlined, in percent.
    pub fn inline_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.inlined as f64 / self.total as f64) * 100.0
        }
    }
}

impl fmt::Display for DecisionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} edges, {} inlined, {} declined ({:.1}% inlined)",
            self.total,
            self.inlined,
            self.declined,
            self.inline_percentage()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::SourceLoc;

    #[test]
    fn test_summary_counts() {
        let records: Vec<DecisionRecord> = [true, false, true, true]
            .into_iter()
            .enumerate()
            .map(|(idx, decision)| {
                let edge = CallEdgeKey::from_call_site(
                    "f",
                    format!("g{idx}"),
                    [SourceLoc::new(idx as u32 + 1, 1)],
                );
                DecisionRecord::new(edge, decision)
            })
            .collect();

        let summary = DecisionSummary::from_records(&records);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.inlined, 3);
        assert_eq!(summary.declined, 1);
        assert!((summary.inline_percentage() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DecisionSummary::default();
        assert_eq!(summary.inline_percentage(), 0.0);
        assert_eq!(summary.to_string(), "0 edges, 0 inlined, 0 declined (0.0% inlined)");
    }
}
