//! Call edge identity
//!
//! A call edge is one call instruction observed at one point of the
//! optimisation pipeline. Its identity is the caller, the callee and the full
//! chain of source locations the call went through while being inlined.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `line:column` pair. Serialised as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl From<(u32, u32)> for SourceLoc {
    fn from((line, column): (u32, u32)) -> Self {
        Self { line, column }
    }
}

impl From<SourceLoc> for (u32, u32) {
    fn from(loc: SourceLoc) -> Self {
        (loc.line, loc.column)
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Identity of a call site.
///
/// `location_chain` is ordered innermost first: element 0 is the location of
/// the call instruction itself, each following element is the location it was
/// inlined at, walking outwards to the function that now contains it.
///
/// Equality covers both names and every element of the chain. Two calls that
/// share a line and column after inlining are still told apart by their
/// callee.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallEdgeKey {
    caller_name: String,
    callee_name: String,
    location_chain: Vec<SourceLoc>,
}

impl CallEdgeKey {
    /// Key for a call observed by the host inliner.
    pub fn from_call_site(
        caller: impl Into<String>,
        callee: impl Into<String>,
        location_chain: impl IntoIterator<Item = SourceLoc>,
    ) -> Self {
        Self {
            caller_name: caller.into(),
            callee_name: callee.into(),
            location_chain: location_chain.into_iter().collect(),
        }
    }

    /// Key rebuilt from the fields of a recorded config entry.
    pub fn from_descriptor_fields(
        caller_name: String,
        callee_name: String,
        location_chain: Vec<SourceLoc>,
    ) -> Self {
        Self {
            caller_name,
            callee_name,
            location_chain,
        }
    }

    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }

    pub fn caller_name(&self) -> &str {
        &self.caller_name
    }

    pub fn callee_name(&self) -> &str {
        &self.callee_name
    }

    pub fn location_chain(&self) -> &[SourceLoc] {
        &self.location_chain
    }

    /// Location of the call instruction itself.
    pub fn head_location(&self) -> Option<SourceLoc> {
        self.location_chain.first().copied()
    }

    /// Whether the call reached its current caller through earlier inlining.
    pub fn is_inlined(&self) -> bool {
        self.location_chain.len() > 1
    }
}

impl fmt::Display for CallEdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.caller_name, self.callee_name)?;
        for (idx, loc) in self.location_chain.iter().enumerate() {
            if idx > 0 {
                write!(f, "@")?;
            }
            write!(f, "{loc}")?;
        }
        Ok(())
    }
}

/// Call site abstraction the host inliner exposes for each candidate call.
pub trait CallSite {
    fn caller_name(&self) -> &str;

    fn callee_name(&self) -> &str;

    /// Source locations of the call, innermost first.
    fn location_chain(&self) -> Vec<SourceLoc>;

    fn edge_key(&self) -> CallEdgeKey {
        CallEdgeKey::from_call_site(
            self.caller_name(),
            self.callee_name(),
            self.location_chain(),
        )
    }
}

impl CallSite for CallEdgeKey {
    fn caller_name(&self) -> &str {
        &self.caller_name
    }

    fn callee_name(&self) -> &str {
        &self.callee_name
    }

    fn location_chain(&self) -> Vec<SourceLoc> {
        self.location_chain.clone()
    }

    fn edge_key(&self) -> CallEdgeKey {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(caller: &str, callee: &str, chain: &[(u32, u32)]) -> CallEdgeKey {
        CallEdgeKey::from_call_site(caller, callee, chain.iter().copied().map(SourceLoc::from))
    }

    #[test]
    fn test_equal_keys() {
        let a = edge("f", "g", &[(10, 3), (4, 1)]);
        let b = CallEdgeKey::from_descriptor_fields(
            "f".to_string(),
            "g".to_string(),
            vec![SourceLoc::new(10, 3), SourceLoc::new(4, 1)],
        );
        assert!(a.equals(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_location_different_callee() {
        let a = edge("f", "g", &[(10, 3)]);
        let b = edge("f", "h", &[(10, 3)]);
        assert!(!a.equals(&b));
    }

    #[test]
    fn test_same_head_different_chain() {
        let a = edge("f", "g", &[(10, 3), (20, 1)]);
        let b = edge("f", "g", &[(10, 3), (21, 1)]);
        let c = edge("f", "g", &[(10, 3)]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.head_location(), b.head_location());
    }

    #[test]
    fn test_display() {
        let key = edge("main", "helper", &[(12, 5), (3, 9)]);
        assert_eq!(key.to_string(), "main:helper:12:5@3:9");
        assert!(key.is_inlined());
    }

    #[test]
    fn test_call_site_edge_key() {
        struct Site;

        impl CallSite for Site {
            fn caller_name(&self) -> &str {
                "f"
            }

            fn callee_name(&self) -> &str {
                "g"
            }

            fn location_chain(&self) -> Vec<SourceLoc> {
                vec![SourceLoc::new(1, 2)]
            }
        }

        assert_eq!(Site.edge_key(), edge("f", "g", &[(1, 2)]));
    }
}
