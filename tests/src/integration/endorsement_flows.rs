//! # Endorsement Flows
//!
//! Proposal fan-out (lc-01) feeding the consistency grouper and policy
//! evaluator (lc-02).
//!
//! ```text
//! SignedProposal ──collect──→ [4 scripted peers] ──→ CollectedResponses
//!                                                          │
//!                                                 group + evaluate(policy)
//!                                                          ▼
//!                                                EndorsementDecision
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{four_peers, invoke_proposal, Reply, ScriptedPeers};
    use lc_01_proposal::{ResponseAggregator, ResponseCollector};
    use lc_02_endorsement::{
        AgreeingThreshold, DecisionReason, DistinctOrganizations, EndorsementError,
        EndorsementEvaluator, EndorsementPolicy, PolicyDescriptor, PolicyEvaluator,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const DEADLINE: Duration = Duration::from_secs(5);

    async fn decide(
        script: &[(&str, Reply)],
        policy: &dyn EndorsementPolicy,
    ) -> lc_02_endorsement::EndorsementDecision {
        let aggregator = ResponseAggregator::new(Arc::new(ScriptedPeers::new(script)));
        let collected = aggregator
            .collect(&invoke_proposal(), &four_peers(), DEADLINE)
            .await;
        PolicyEvaluator::new().evaluate(&collected, policy)
    }

    #[tokio::test]
    async fn test_three_agree_one_error_satisfies_threshold_three() {
        let decision = decide(
            &[
                ("peer0.org1", Reply::Agree("D")),
                ("peer1.org1", Reply::Agree("D")),
                ("peer0.org2", Reply::Agree("D")),
                ("peer1.org2", Reply::Fail),
            ],
            &AgreeingThreshold::new(3),
        )
        .await;

        assert!(decision.is_satisfied());
        let accepted = decision.accepted().unwrap();
        assert_eq!(accepted.len(), 3);
        assert_eq!(accepted.payload(), b"D");
        assert!(!accepted
            .signers()
            .iter()
            .any(|s| s.as_str() == "peer1.org2"));
    }

    #[tokio::test]
    async fn test_two_against_two_is_inconsistent_whatever_the_policy() {
        let script = [
            ("peer0.org1", Reply::Agree("D")),
            ("peer1.org1", Reply::Agree("D")),
            ("peer0.org2", Reply::Agree("E")),
            ("peer1.org2", Reply::Agree("E")),
        ];

        for policy in [
            Box::new(AgreeingThreshold::new(1)) as Box<dyn EndorsementPolicy>,
            Box::new(DistinctOrganizations::new(1)) as Box<dyn EndorsementPolicy>,
        ] {
            let decision = decide(&script, policy.as_ref()).await;
            assert!(!decision.is_satisfied());
            assert!(decision.accepted().is_none());
            assert!(matches!(
                decision.error(),
                Some(EndorsementError::InconsistentResponses { groups: 2, .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_every_peer_unreachable() {
        let decision = decide(&[], &AgreeingThreshold::new(1)).await;

        assert_eq!(
            decision.reason(),
            &DecisionReason::NoUsableResponses {
                queried: 4,
                transport_failures: 4,
                error_responses: 0,
            }
        );
        assert!(matches!(
            decision.error(),
            Some(EndorsementError::InsufficientEndorsements { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_past_deadline_counts_as_transport_failure() {
        let decision = decide(
            &[
                ("peer0.org1", Reply::Agree("D")),
                ("peer1.org1", Reply::Agree("D")),
                ("peer0.org2", Reply::Agree("D")),
                ("peer1.org2", Reply::Slow(DEADLINE * 2, "D")),
            ],
            &AgreeingThreshold::new(4),
        )
        .await;

        assert_eq!(
            decision.reason(),
            &DecisionReason::BelowMinimum {
                usable: 3,
                required: 4,
                transport_failures: 1,
            }
        );
        assert!(decision
            .error()
            .unwrap()
            .to_string()
            .contains("not enough endorsers"));
    }

    #[tokio::test]
    async fn test_signature_policy_needs_both_organisations() {
        let descriptor = PolicyDescriptor::parse(
            r#"
identities:
  - user1: { role: { name: member, mspId: Org1MSP } }
  - user2: { role: { name: member, mspId: Org2MSP } }
policy:
  2-of:
    - signed-by: user1
    - signed-by: user2
"#,
        )
        .unwrap();

        let org1_only = decide(
            &[
                ("peer0.org1", Reply::Agree("D")),
                ("peer1.org1", Reply::Agree("D")),
            ],
            descriptor.policy(),
        )
        .await;
        assert!(matches!(
            org1_only.reason(),
            DecisionReason::PolicyNotMet { endorsements: 2, .. }
        ));

        let both = decide(
            &[
                ("peer0.org1", Reply::Agree("D")),
                ("peer1.org2", Reply::Agree("D")),
            ],
            descriptor.policy(),
        )
        .await;
        assert!(both.is_satisfied());
    }
}
