//! # Client Metrics
//!
//! Prometheus metrics for the endorsement and commit pipeline.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! client-runtime = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `lc_proposals_sent_total` - Counter of proposals sent, one per node
//! - `lc_transport_failures_total` - Counter of nodes that could not be used
//! - `lc_endorsement_decisions_total` - Counter of decisions (by outcome)
//! - `lc_commits_total` - Counter of commit outcomes (by outcome)
//! - `lc_listener_callback_failures_total` - Counter of failed listener callbacks
//! - `lc_endorsement_round_seconds` - Histogram of proposal fan-out durations

use lc_02_endorsement::DecisionReason;
use lc_03_submission::CommitState;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Proposals sent, one per targeted node
    pub static ref PROPOSALS_SENT: IntCounter = register_int_counter!(
        "lc_proposals_sent_total",
        "Total number of proposals sent to endorsing peers"
    )
    .expect("Failed to create PROPOSALS_SENT metric");

    /// Nodes that timed out, were unreachable or answered garbage
    pub static ref TRANSPORT_FAILURES: IntCounter = register_int_counter!(
        "lc_transport_failures_total",
        "Total number of transport failures during proposal fan-out"
    )
    .expect("Failed to create TRANSPORT_FAILURES metric");

    /// Endorsement decisions, labeled by outcome
    pub static ref DECISIONS: IntCounterVec = register_int_counter_vec!(
        "lc_endorsement_decisions_total",
        "Total number of endorsement decisions",
        &["outcome"]
    )
    .expect("Failed to create DECISIONS metric");

    /// Commit outcomes, labeled by outcome
    pub static ref COMMITS: IntCounterVec = register_int_counter_vec!(
        "lc_commits_total",
        "Total number of resolved commit futures",
        &["outcome"]
    )
    .expect("Failed to create COMMITS metric");

    /// Listener callbacks that returned an error or panicked
    pub static ref CALLBACK_FAILURES: IntCounter = register_int_counter!(
        "lc_listener_callback_failures_total",
        "Total number of failed listener callbacks"
    )
    .expect("Failed to create CALLBACK_FAILURES metric");

    /// Time to collect all proposal responses
    pub static ref ENDORSEMENT_ROUND: Histogram = register_histogram!(
        "lc_endorsement_round_seconds",
        "Time spent collecting proposal responses",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 20.0, 60.0]
    )
    .expect("Failed to create ENDORSEMENT_ROUND metric");
}

/// Label for a decision outcome.
pub fn decision_label(reason: &DecisionReason) -> &'static str {
    match reason {
        DecisionReason::Satisfied { .. } => "satisfied",
        DecisionReason::Inconsistent { .. } => "inconsistent",
        DecisionReason::NoUsableResponses { .. }
        | DecisionReason::BelowMinimum { .. }
        | DecisionReason::PolicyNotMet { .. } => "insufficient",
    }
}

/// Label for a commit outcome.
pub fn commit_label(state: &CommitState) -> &'static str {
    match state {
        CommitState::Pending => "pending",
        CommitState::Committed { .. } => "committed",
        CommitState::Invalid { .. } => "invalid",
        CommitState::TimedOut { .. } => "timed_out",
    }
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record one fan-out round
#[cfg(feature = "metrics")]
pub fn record_endorsement_round(sent: usize, transport_failures: usize, seconds: f64) {
    PROPOSALS_SENT.inc_by(sent as u64);
    TRANSPORT_FAILURES.inc_by(transport_failures as u64);
    ENDORSEMENT_ROUND.observe(seconds);
}

/// Record an endorsement decision
#[cfg(feature = "metrics")]
pub fn record_decision(reason: &DecisionReason) {
    DECISIONS.with_label_values(&[decision_label(reason)]).inc();
}

/// Record a resolved commit
#[cfg(feature = "metrics")]
pub fn record_commit(state: &CommitState) {
    COMMITS.with_label_values(&[commit_label(state)]).inc();
}

/// Record failed listener callbacks from one dispatched block
#[cfg(feature = "metrics")]
pub fn record_callback_failures(count: usize) {
    CALLBACK_FAILURES.inc_by(count as u64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_endorsement_round(_sent: usize, _transport_failures: usize, _seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_decision(_reason: &DecisionReason) {}

#[cfg(not(feature = "metrics"))]
pub fn record_commit(_state: &CommitState) {}

#[cfg(not(feature = "metrics"))]
pub fn record_callback_failures(_count: usize) {}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ValidationCode;
    use std::time::Duration;

    #[test]
    fn test_recording_never_panics() {
        record_endorsement_round(4, 1, 0.25);
        record_decision(&DecisionReason::Inconsistent { groups: Vec::new() });
        record_commit(&CommitState::Committed { block_number: 3 });
        record_callback_failures(2);
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            decision_label(&DecisionReason::BelowMinimum {
                usable: 1,
                required: 3,
                transport_failures: 2
            }),
            "insufficient"
        );
        assert_eq!(
            commit_label(&CommitState::Invalid {
                code: ValidationCode::MvccReadConflict,
                block_number: 9
            }),
            "invalid"
        );
        assert_eq!(
            commit_label(&CommitState::TimedOut {
                waited: Duration::from_secs(1)
            }),
            "timed_out"
        );
    }
}
