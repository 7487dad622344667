//! Reproducible inlining decisions
//!
//! The LLVM inliner asks an advisor whether to inline each candidate call.
//! This crate answers that question in one of two ways: by flipping a seeded
//! coin and recording the outcome, or by replaying a previously recorded
//! table. Recorded tables are JSON documents (see [`codec`]) so sessions can
//! be searched, replayed and compared across compiler runs.

pub mod advisor;
pub mod codec;
pub mod compare;
pub mod config;
pub mod error;
pub mod key;
pub mod policy;
pub mod record;

pub use crate::advisor::{AdvisorState, InlineAdvisor};
pub use crate::codec::{ConfigDocument, EdgeEntry};
pub use crate::compare::{ConfigDiff, FlippedDecision, compare};
pub use crate::config::{AdvisorConfig, AdvisorMode};
pub use crate::error::{AdvisorError, Result};
pub use crate::key::{CallEdgeKey, CallSite, SourceLoc};
pub use crate::policy::{ActivePolicy, InlinePolicy, PredefinedPolicy, StochasticPolicy};
pub use crate::record::{DecisionRecord, DecisionSummary};
