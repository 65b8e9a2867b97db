//! Driving ports (Inbound API)

use crate::domain::commit::CommitFuture;
use crate::error::SubmissionResult;
use lc_01_proposal::SignedProposal;
use lc_02_endorsement::EndorsementDecision;
use shared_types::NodeEndpoint;
use std::time::Duration;

/// Submission API consumed by the contract service.
pub trait TransactionSubmission: Send + Sync {
    /// Build the envelope, start the broadcast to every orderer and return a
    /// pending future. Never waits for commit.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` (no I/O performed) when `decision` is not
    /// satisfied, `NoOrderers` when `orderers` is empty.
    fn submit(
        &self,
        decision: &EndorsementDecision,
        proposal: &SignedProposal,
        orderers: &[NodeEndpoint],
        commit_wait: Duration,
    ) -> SubmissionResult<CommitFuture>;
}
