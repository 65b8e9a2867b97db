//! # Commit Flows
//!
//! Endorsement decision → envelope → orderer broadcast → block event.
//!
//! ```text
//! decision ──submit──→ RecordingOrderer        (acknowledgement only)
//!    │
//!    └── CommitFuture ◀── CommitWaiter ◀── BlockEvent (published by the test)
//! ```
//!
//! The orderer never decides the outcome: every future here is resolved by
//! an event the test publishes, or by its deadline.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{
        block_with, four_peers, invoke_proposal, orderer, RecordingOrderer, Reply, ScriptedPeers,
        TestIdentity,
    };
    use lc_01_proposal::{ResponseAggregator, ResponseCollector, SignedProposal};
    use lc_02_endorsement::{AgreeingThreshold, EndorsementDecision, EndorsementEvaluator, PolicyEvaluator};
    use lc_03_submission::{
        CommitState, CommitWaiter, SubmissionError, TransactionSubmission, TransactionSubmitter,
    };
    use shared_bus::{EventPublisher, InMemoryEventFeed};
    use shared_types::ValidationCode;
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        feed: InMemoryEventFeed,
        orderer: Arc<RecordingOrderer>,
        submitter: TransactionSubmitter<RecordingOrderer>,
    }

    fn harness() -> Harness {
        let feed = InMemoryEventFeed::new();
        let orderer = Arc::new(RecordingOrderer::default());
        let submitter = TransactionSubmitter::new(
            Arc::clone(&orderer),
            Arc::new(CommitWaiter::spawn(&feed)),
            Arc::new(TestIdentity),
        );
        Harness {
            feed,
            orderer,
            submitter,
        }
    }

    async fn endorsed() -> (SignedProposal, EndorsementDecision) {
        let peers = ScriptedPeers::new(&[
            ("peer0.org1", Reply::Agree("moved")),
            ("peer1.org1", Reply::Agree("moved")),
            ("peer0.org2", Reply::Agree("moved")),
            ("peer1.org2", Reply::Agree("moved")),
        ]);
        let proposal = invoke_proposal();
        let collected = ResponseAggregator::new(Arc::new(peers))
            .collect(&proposal, &four_peers(), Duration::from_secs(5))
            .await;
        let decision = PolicyEvaluator::new().evaluate(&collected, &AgreeingThreshold::new(4));
        assert!(decision.is_satisfied());
        (proposal, decision)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_commit_event_resolves_future() {
        let h = harness();
        let (proposal, decision) = endorsed().await;

        let future = h
            .submitter
            .submit(
                &decision,
                &proposal,
                &[orderer("orderer0"), orderer("orderer1")],
                Duration::from_secs(30),
            )
            .unwrap();
        assert_eq!(future.state(), CommitState::Pending);

        settle().await;
        assert_eq!(h.orderer.received.lock().len(), 2);

        h.feed
            .publish(block_with(5, proposal.tx_id(), ValidationCode::Valid))
            .await;
        assert_eq!(future.into_result().await.unwrap(), 5);
        assert_eq!(h.submitter.waiter().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_commit_carries_validation_code() {
        let h = harness();
        let (proposal, decision) = endorsed().await;
        let future = h
            .submitter
            .submit(&decision, &proposal, &[orderer("orderer0")], Duration::from_secs(30))
            .unwrap();

        h.feed
            .publish(block_with(6, proposal.tx_id(), ValidationCode::MvccReadConflict))
            .await;
        let err = future.into_result().await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Invalid {
                code: ValidationCode::MvccReadConflict,
                block_number: 6,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_event_after_timeout_changes_nothing() {
        let h = harness();
        let (proposal, decision) = endorsed().await;
        let mut future = h
            .submitter
            .submit(&decision, &proposal, &[orderer("orderer0")], Duration::from_secs(2))
            .unwrap();

        let state = future.wait().await;
        assert!(matches!(state, CommitState::TimedOut { waited } if waited >= Duration::from_secs(2)));
        assert_eq!(h.submitter.waiter().pending_count(), 0);

        h.feed
            .publish(block_with(9, proposal.tx_id(), ValidationCode::Valid))
            .await;
        settle().await;
        assert!(matches!(future.state(), CommitState::TimedOut { .. }));
        assert!(matches!(
            future.into_result().await,
            Err(SubmissionError::TimedOut { .. })
        ));
    }

    #[tokio::test]
    async fn test_pending_transaction_cannot_be_submitted_twice() {
        let h = harness();
        let (proposal, decision) = endorsed().await;
        let orderers = [orderer("orderer0")];

        let _first = h
            .submitter
            .submit(&decision, &proposal, &orderers, Duration::from_secs(30))
            .unwrap();
        let second = h
            .submitter
            .submit(&decision, &proposal, &orderers, Duration::from_secs(30));
        assert!(matches!(
            second,
            Err(SubmissionError::DuplicateTransaction { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_orderer_is_rejected_before_registration() {
        let h = harness();
        let (proposal, decision) = endorsed().await;

        let result = h
            .submitter
            .submit(&decision, &proposal, &[], Duration::from_secs(30));
        assert!(matches!(result, Err(SubmissionError::NoOrderers { .. })));
        assert_eq!(h.submitter.waiter().pending_count(), 0);
    }
}
