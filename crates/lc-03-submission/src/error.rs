//! Error types for transaction submission and commit

use shared_types::{TransactionId, ValidationCode};
use thiserror::Error;

/// Submission and commit failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Submission attempted without a satisfied decision. A programming
    /// error; nothing was sent.
    #[error("Precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    /// No ordering node configured for the channel
    #[error("No orderer available for channel {channel}")]
    NoOrderers { channel: String },

    /// The transaction id is already awaiting commit
    #[error("Transaction {tx_id} is already awaiting commit")]
    DuplicateTransaction { tx_id: TransactionId },

    /// Envelope could not be serialized
    #[error("Envelope encoding failed: {0}")]
    Encoding(String),

    /// The ledger rejected the transaction
    #[error("Transaction {tx_id} invalidated in block {block_number}: {code}")]
    Invalid {
        tx_id: TransactionId,
        code: ValidationCode,
        block_number: u64,
    },

    /// The local wait ended before any commit event was seen
    #[error(
        "Transaction {tx_id}: final state unknown after {waited_ms}ms, manual reconciliation required"
    )]
    TimedOut { tx_id: TransactionId, waited_ms: u64 },
}

/// Result type for submission operations
pub type SubmissionResult<T> = Result<T, SubmissionError>;
