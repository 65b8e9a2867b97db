//! # Endorsement Policy Evaluator
//!
//! Rules, applied in order:
//!
//! 1. More than one success group: `Inconsistent`. Group sizes are not
//!    compared.
//! 2. No success group: `NoUsableResponses`.
//! 3. Fewer endorsements than `policy.minimum_endorsers()`: `BelowMinimum`.
//! 4. Predicate rejects the group: `PolicyNotMet`.
//! 5. Otherwise the group is accepted.
//!
//! Error-status groups are degenerate. They are logged but neither endorse
//! nor count as disagreement.

use crate::domain::consistency::{group, ConsistencySet};
use crate::domain::decision::{DecisionReason, EndorsementDecision};
use crate::domain::policy::EndorsementPolicy;
use crate::ports::inbound::EndorsementEvaluator;
use lc_01_proposal::CollectedResponses;
use tracing::{debug, error, info, warn};

/// Stateless evaluator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl EndorsementEvaluator for PolicyEvaluator {
    fn evaluate_sets(
        &self,
        sets: Vec<ConsistencySet>,
        queried: usize,
        transport_failures: usize,
        policy: &dyn EndorsementPolicy,
    ) -> EndorsementDecision {
        let (mut success, degenerate): (Vec<_>, Vec<_>) =
            sets.into_iter().partition(ConsistencySet::is_success);

        for set in &degenerate {
            warn!(
                status = %set.status(),
                size = set.len(),
                "[lc-02] Endorsers returned error status"
            );
        }

        if success.len() > 1 {
            let groups: Vec<String> = success.iter().map(ConsistencySet::summary).collect();
            error!(
                groups = success.len(),
                detail = %groups.join("; "),
                "[lc-02] Endorsers disagree on the proposal result"
            );
            return EndorsementDecision::reject(None, DecisionReason::Inconsistent { groups });
        }

        let Some(candidate) = success.pop() else {
            let error_responses = degenerate.iter().map(ConsistencySet::len).sum();
            return EndorsementDecision::reject(
                None,
                DecisionReason::NoUsableResponses {
                    queried,
                    transport_failures,
                    error_responses,
                },
            );
        };

        let usable = candidate.verified().count();
        let required = policy.minimum_endorsers();
        if usable < required {
            warn!(
                usable,
                required,
                transport_failures,
                "[lc-02] Not enough endorsers"
            );
            return EndorsementDecision::reject(
                Some(candidate),
                DecisionReason::BelowMinimum {
                    usable,
                    required,
                    transport_failures,
                },
            );
        }

        let description = policy.describe();
        if !policy.is_satisfied_by(&candidate) {
            warn!(policy = %description, usable, "[lc-02] Endorsement policy not met");
            return EndorsementDecision::reject(
                Some(candidate),
                DecisionReason::PolicyNotMet {
                    policy: description,
                    endorsements: usable,
                },
            );
        }

        debug!(group = %candidate.summary(), "[lc-02] Accepted consistency set");
        info!(policy = %description, endorsements = usable, "[lc-02] Endorsement satisfied");
        EndorsementDecision::accept(candidate, description)
    }

    fn evaluate(
        &self,
        collected: &CollectedResponses,
        policy: &dyn EndorsementPolicy,
    ) -> EndorsementDecision {
        let sets = group(collected.responses());
        self.evaluate_sets(sets, collected.queried(), collected.failure_count(), policy)
    }
}
