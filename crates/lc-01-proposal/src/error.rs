//! Error types for proposal construction

use thiserror::Error;

/// Errors raised while building or signing a proposal.
///
/// Per-peer failures during fan-out are not errors of this kind; they are
/// reported as `NodeOutcome::Failed` entries.
#[derive(Debug, Error)]
pub enum ProposalError {
    /// Required field missing for this operation kind
    #[error("{kind} proposal is missing {field}")]
    MissingField { kind: &'static str, field: &'static str },

    /// Contract name, version or path is empty
    #[error("Invalid contract id: {reason}")]
    InvalidContract { reason: String },

    /// Proposal wait budget of zero
    #[error("Proposal wait time must be greater than zero")]
    ZeroWaitTime,

    /// Proposal could not be serialized for signing
    #[error("Proposal encoding failed: {0}")]
    Encoding(String),
}

/// Result type for proposal operations
pub type ProposalResult<T> = Result<T, ProposalError>;
