//! Error types for endorsement evaluation and policy loading

use thiserror::Error;

/// Endorsement failures.
///
/// Both decision failures are fatal for the attempt. Nothing here is retried
/// or resolved automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndorsementError {
    /// More than one successful result group: non-deterministic contract or
    /// divergent ledger state among peers.
    #[error("Inconsistent responses: {groups} disagreeing result groups ({detail})")]
    InconsistentResponses { groups: usize, detail: String },

    /// The usable responses do not satisfy the policy.
    #[error("Insufficient endorsements: {reason}")]
    InsufficientEndorsements { reason: String },

    /// Policy descriptor could not be parsed
    #[error("Invalid endorsement policy: {reason}")]
    InvalidPolicy { reason: String },

    /// Policy descriptor file could not be read
    #[error("Cannot read policy file {path}: {reason}")]
    PolicyIo { path: String, reason: String },
}

/// Result type for endorsement operations
pub type EndorsementResult<T> = Result<T, EndorsementError>;
