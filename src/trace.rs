//! Call-edge traces
//!
//! A trace stands in for the host inliner's traversal: the calls it would ask
//! about, in the order it would ask.
//!
//! ```json
//! { "calls": [ { "caller": "main", "callee": "parse", "location": [[10, 3]] } ] }
//! ```

use anyhow::{Context, Result, bail};
use otterc_inline::{CallSite, SourceLoc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedCall {
    pub caller: String,
    pub callee: String,
    pub location: Vec<SourceLoc>,
}

impl CallSite for TracedCall {
    fn caller_name(&self) -> &str {
        &self.caller
    }

    fn callee_name(&self) -> &str {
        &self.callee
    }

    fn location_chain(&self) -> Vec<SourceLoc> {
        self.location.clone()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CallTrace {
    pub calls: Vec<TracedCall>,
}

impl CallTrace {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read trace file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid trace file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let trace: CallTrace =
            serde_json::from_str(content).context("failed to parse call trace")?;

        if let Some(idx) = trace.calls.iter().position(|call| call.location.is_empty()) {
            bail!("call {idx} has an empty location array");
        }

        Ok(trace)
    }
}
