//! Error types for the client runtime

use lc_01_proposal::ProposalError;
use lc_02_endorsement::EndorsementError;
use lc_03_submission::SubmissionError;
use lc_04_event_registry::RegistryError;
use shared_types::{PeerRole, TransactionId};
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid configuration file: {0}")]
    Parse(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("No channel configured")]
    NoChannels,

    #[error("Default channel {0} is not configured")]
    UnknownChannel(String),

    #[error("Channel {channel} has no endorsing peer")]
    NoEndorsers { channel: String },

    #[error("Channel {channel} has no orderer")]
    NoOrderers { channel: String },

    #[error("Channel {channel} references unknown node {node}")]
    UnknownNode { channel: String, node: String },

    #[error("Timeout {name} must be greater than zero")]
    ZeroTimeout { name: &'static str },

    #[error("Identity has neither a signing key file nor an inline signing secret")]
    MissingSigningKey,

    #[error("Endorsement policy for {contract}: {source}")]
    Policy {
        contract: String,
        #[source]
        source: EndorsementError,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from contract operations.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    Endorsement(#[from] EndorsementError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("No {role:?} node on channel {channel}")]
    NoPeers { channel: String, role: PeerRole },

    /// The agreeing endorsements do not describe the requested execution.
    #[error("Unexpected endorsement for {tx_id}: {reason}")]
    UnexpectedResponse { tx_id: TransactionId, reason: String },
}

pub type ContractResult<T> = Result<T, ContractError>;
