//! Error types for the reconciliation core.
//!
//! The core algorithms are total over their domains: a missing adjacency or
//! an absent dimension/predicate combination is an empty set, never an
//! error. What remains are configuration problems, I/O on local documents,
//! failures bubbling up from the external query layer, and unknown
//! relationship identifiers in explain mode.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Every violation found in the configuration, not just the first.
    #[error("invalid configuration: {}", .problems.join("; "))]
    InvalidConfig { problems: Vec<String> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the external query layer.
    #[error("query source error: {0}")]
    Source(anyhow::Error),

    /// Diagnostic operations report unknown identifiers instead of aborting.
    #[error("unknown relationship: {0}")]
    UnknownRelationship(String),
}

// anyhow::Error is not a std Error, so it cannot be a #[from] source.
impl From<anyhow::Error> for ModelError {
    fn from(e: anyhow::Error) -> Self {
        ModelError::Source(e)
    }
}
