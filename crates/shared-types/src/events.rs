//! # Ledger Events
//!
//! Notifications pushed by the peers' event feed once a block is committed.
//! The pipeline consumes and routes these; it never builds or mutates one
//! after receipt (the simulated network and tests are the only producers).

use crate::entities::{ChannelId, NodeId, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commit-time classification of a transaction.
///
/// Codes follow the ledger's numeric assignment so that unknown codes can
/// still be carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    Valid,
    NilEnvelope,
    BadPayload,
    BadCommonHeader,
    BadCreatorSignature,
    InvalidEndorserTransaction,
    DuplicateTxId,
    EndorsementPolicyFailure,
    MvccReadConflict,
    PhantomReadConflict,
    ExpiredChaincode,
    Other(u8),
}

impl ValidationCode {
    pub fn code(&self) -> u8 {
        match self {
            Self::Valid => 0,
            Self::NilEnvelope => 1,
            Self::BadPayload => 2,
            Self::BadCommonHeader => 3,
            Self::BadCreatorSignature => 4,
            Self::InvalidEndorserTransaction => 5,
            Self::DuplicateTxId => 9,
            Self::EndorsementPolicyFailure => 10,
            Self::MvccReadConflict => 11,
            Self::PhantomReadConflict => 12,
            Self::ExpiredChaincode => 15,
            Self::Other(code) => *code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Valid,
            1 => Self::NilEnvelope,
            2 => Self::BadPayload,
            3 => Self::BadCommonHeader,
            4 => Self::BadCreatorSignature,
            5 => Self::InvalidEndorserTransaction,
            9 => Self::DuplicateTxId,
            10 => Self::EndorsementPolicyFailure,
            11 => Self::MvccReadConflict,
            12 => Self::PhantomReadConflict,
            15 => Self::ExpiredChaincode,
            other => Self::Other(other),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Event emitted by a contract during execution (`setEvent`-style).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    pub tx_id: TransactionId,
    pub contract_name: String,
    pub event_name: String,
    pub payload: Vec<u8>,
}

/// Per-transaction outcome inside a committed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub tx_id: TransactionId,
    pub validation_code: ValidationCode,
    /// Contract events emitted by this transaction. Only delivered to
    /// listeners when the transaction is valid.
    pub chaincode_events: Vec<ChaincodeEvent>,
}

impl TransactionEvent {
    pub fn is_valid(&self) -> bool {
        self.validation_code.is_valid()
    }
}

/// A committed block as observed by one event source peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub channel: ChannelId,
    pub block_number: u64,
    /// Peer that delivered this event.
    pub source: NodeId,
    pub transactions: Vec<TransactionEvent>,
}

impl BlockEvent {
    pub fn transaction(&self, tx_id: &TransactionId) -> Option<&TransactionEvent> {
        self.transactions.iter().find(|tx| &tx.tx_id == tx_id)
    }

    /// Contract events of valid transactions, in block order.
    pub fn chaincode_events(&self) -> impl Iterator<Item = &ChaincodeEvent> {
        self.transactions
            .iter()
            .filter(|tx| tx.is_valid())
            .flat_map(|tx| tx.chaincode_events.iter())
    }

    /// Config blocks carry no transactions.
    pub fn is_config_block(&self) -> bool {
        self.transactions.is_empty()
    }
}
