use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::key::CallEdgeKey;

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Failures surfaced by the inline advisor.
///
/// Every variant is fatal for the compilation that hit it. Whether to abort
/// the process is left to the caller.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("can't open inline config {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't write inline config to {target}: {source}")]
    ConfigStore {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed inline config: {reason}")]
    MalformedConfig { reason: String },

    #[error("can't find the config for edge {edge}")]
    UnknownEdge { edge: CallEdgeKey },

    #[error("`{operation}` is not valid while the advisor is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("invalid value `{value}` for {name}")]
    InvalidSetting { name: &'static str, value: String },
}

impl AdvisorError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedConfig {
            reason: reason.into(),
        }
    }

    /// Edge that caused the failure, if any.
    pub fn edge(&self) -> Option<&CallEdgeKey> {
        match self {
            Self::UnknownEdge { edge } => Some(edge),
            _ => None,
        }
    }
}
