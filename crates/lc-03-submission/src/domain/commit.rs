//! Commit state machine
//!
//! ```text
//!            ┌──────────────→ Committed { block }
//!  Pending ──┼──────────────→ Invalid { code, block }
//!            └──────────────→ TimedOut
//! ```
//!
//! All three outcomes are terminal. Only the [`CommitWaiter`] dispatch task
//! writes the state; a [`CommitFuture`] only observes it.
//!
//! [`CommitWaiter`]: crate::service::waiter::CommitWaiter

use crate::error::{SubmissionError, SubmissionResult};
use shared_types::{TransactionId, ValidationCode};
use std::time::Duration;
use tokio::sync::watch;

/// Where a submitted transaction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Pending,
    Committed {
        block_number: u64,
    },
    Invalid {
        code: ValidationCode,
        block_number: u64,
    },
    /// The local wait ended. The ledger-side outcome is unknown.
    TimedOut {
        waited: Duration,
    },
}

impl CommitState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The validation code, when the ledger has ruled.
    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            Self::Committed { .. } => Some(ValidationCode::Valid),
            Self::Invalid { code, .. } => Some(*code),
            Self::Pending | Self::TimedOut { .. } => None,
        }
    }
}

/// Handle on one submitted transaction.
///
/// Created at submission time, resolved exactly once, never reused.
#[derive(Debug, Clone)]
pub struct CommitFuture {
    tx_id: TransactionId,
    state: watch::Receiver<CommitState>,
}

impl CommitFuture {
    pub(crate) fn new(tx_id: TransactionId, state: watch::Receiver<CommitState>) -> Self {
        Self { tx_id, state }
    }

    pub fn tx_id(&self) -> &TransactionId {
        &self.tx_id
    }

    /// Current state, without waiting.
    pub fn state(&self) -> CommitState {
        *self.state.borrow()
    }

    /// Wait until the state is terminal.
    ///
    /// If the waiter shuts down first the outcome is unknown and reported as
    /// `TimedOut` with a zero wait.
    pub async fn wait(&mut self) -> CommitState {
        let resolved = match self.state.wait_for(CommitState::is_terminal).await {
            Ok(state) => Some(*state),
            Err(_) => None,
        };

        match resolved.unwrap_or_else(|| *self.state.borrow()) {
            CommitState::Pending => CommitState::TimedOut {
                waited: Duration::ZERO,
            },
            state => state,
        }
    }

    /// Wait and map the outcome to a result carrying the block number.
    ///
    /// # Errors
    ///
    /// `Invalid` with the validation code, or `TimedOut` (unknown outcome).
    pub async fn into_result(mut self) -> SubmissionResult<u64> {
        match self.wait().await {
            CommitState::Committed { block_number } => Ok(block_number),
            CommitState::Invalid { code, block_number } => Err(SubmissionError::Invalid {
                tx_id: self.tx_id,
                code,
                block_number,
            }),
            CommitState::TimedOut { waited } => Err(SubmissionError::TimedOut {
                tx_id: self.tx_id,
                waited_ms: waited.as_millis() as u64,
            }),
            CommitState::Pending => Err(SubmissionError::TimedOut {
                tx_id: self.tx_id,
                waited_ms: 0,
            }),
        }
    }
}
