//! Endorsement decisions

use crate::domain::consistency::ConsistencySet;
use crate::error::EndorsementError;
use std::fmt;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    /// The single agreeing set satisfies the policy.
    Satisfied { policy: String, endorsements: usize },
    /// More than one success group.
    Inconsistent { groups: Vec<String> },
    /// No response with a success status.
    NoUsableResponses {
        queried: usize,
        transport_failures: usize,
        error_responses: usize,
    },
    /// Fewer usable endorsements than the policy could ever accept.
    BelowMinimum {
        usable: usize,
        required: usize,
        transport_failures: usize,
    },
    /// Enough endorsements, but the predicate rejects their membership.
    PolicyNotMet { policy: String, endorsements: usize },
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied {
                policy,
                endorsements,
            } => write!(f, "{endorsements} endorsements satisfy '{policy}'"),
            Self::Inconsistent { groups } => {
                write!(f, "{} disagreeing groups: {}", groups.len(), groups.join("; "))
            }
            Self::NoUsableResponses {
                queried,
                transport_failures,
                error_responses,
            } => write!(
                f,
                "no successful response from {queried} endorsers \
                 ({transport_failures} unreachable, {error_responses} error status)"
            ),
            Self::BelowMinimum {
                usable,
                required,
                transport_failures,
            } => write!(
                f,
                "not enough endorsers: {usable} usable, {required} required \
                 ({transport_failures} transport failures)"
            ),
            Self::PolicyNotMet {
                policy,
                endorsements,
            } => write!(f, "{endorsements} endorsements do not satisfy '{policy}'"),
        }
    }
}

/// Outcome of policy evaluation. Derived per attempt, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndorsementDecision {
    accepted: Option<ConsistencySet>,
    satisfied: bool,
    reason: DecisionReason,
}

impl EndorsementDecision {
    /// A satisfied decision over `set`.
    pub fn accept(set: ConsistencySet, policy: String) -> Self {
        let endorsements = set.len();
        Self {
            accepted: Some(set),
            satisfied: true,
            reason: DecisionReason::Satisfied {
                policy,
                endorsements,
            },
        }
    }

    /// An unsatisfied decision. `candidate` is the set that was looked at,
    /// if any.
    pub fn reject(candidate: Option<ConsistencySet>, reason: DecisionReason) -> Self {
        Self {
            accepted: candidate,
            satisfied: false,
            reason,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// The accepted set. `None` unless satisfied.
    pub fn accepted(&self) -> Option<&ConsistencySet> {
        if self.satisfied {
            self.accepted.as_ref()
        } else {
            None
        }
    }

    /// The largest success group, whether or not it was accepted.
    pub fn candidate(&self) -> Option<&ConsistencySet> {
        self.accepted.as_ref()
    }

    pub fn reason(&self) -> &DecisionReason {
        &self.reason
    }

    /// The error this decision represents, if it is not satisfied.
    pub fn error(&self) -> Option<EndorsementError> {
        match &self.reason {
            DecisionReason::Satisfied { .. } => None,
            DecisionReason::Inconsistent { groups } => {
                Some(EndorsementError::InconsistentResponses {
                    groups: groups.len(),
                    detail: groups.join("; "),
                })
            }
            other => Some(EndorsementError::InsufficientEndorsements {
                reason: other.to_string(),
            }),
        }
    }

    /// `Ok(self)` when satisfied, the matching error otherwise.
    pub fn into_result(self) -> Result<Self, EndorsementError> {
        match self.error() {
            None => Ok(self),
            Some(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_decision_hides_candidate() {
        let decision = EndorsementDecision::reject(
            None,
            DecisionReason::BelowMinimum {
                usable: 1,
                required: 3,
                transport_failures: 2,
            },
        );

        assert!(!decision.is_satisfied());
        assert!(decision.accepted().is_none());
        assert!(matches!(
            decision.into_result(),
            Err(EndorsementError::InsufficientEndorsements { reason }) if reason.contains("not enough endorsers")
        ));
    }

    #[test]
    fn test_inconsistent_maps_to_error() {
        let decision = EndorsementDecision::reject(
            None,
            DecisionReason::Inconsistent {
                groups: vec!["a".into(), "b".into()],
            },
        );

        assert!(matches!(
            decision.error(),
            Some(EndorsementError::InconsistentResponses { groups: 2, .. })
        ));
    }
}
