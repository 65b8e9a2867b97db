//! Driving ports (Inbound API)

use crate::domain::consistency::ConsistencySet;
use crate::domain::decision::EndorsementDecision;
use crate::domain::policy::EndorsementPolicy;
use lc_01_proposal::CollectedResponses;

/// Policy-agnostic endorsement evaluation.
pub trait EndorsementEvaluator: Send + Sync {
    /// Decide over already-grouped sets.
    ///
    /// `queried` and `transport_failures` describe the fan-out the sets came
    /// from, so a shortfall caused by unreachable nodes can be reported as
    /// such.
    fn evaluate_sets(
        &self,
        sets: Vec<ConsistencySet>,
        queried: usize,
        transport_failures: usize,
        policy: &dyn EndorsementPolicy,
    ) -> EndorsementDecision;

    /// Group `collected` and decide.
    fn evaluate(
        &self,
        collected: &CollectedResponses,
        policy: &dyn EndorsementPolicy,
    ) -> EndorsementDecision;
}
