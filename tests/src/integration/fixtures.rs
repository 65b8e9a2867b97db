//! Scripted transports and shared builders for the integration flows.

use async_trait::async_trait;
use lc_01_proposal::{
    OperationKind, PeerProposalClient, Proposal, ProposalResponse, ResponseStatus, SignedProposal,
};
use lc_03_submission::{OrdererClient, TransactionEnvelope};
use parking_lot::Mutex;
use shared_types::{
    BlockEvent, ChannelId, ContractId, Digest, IdentityProvider, MspId, NodeEndpoint, NodeId,
    PeerRole, SigningIdentity, TransactionEvent, TransactionId, TransportError,
    TransportProperties, ValidationCode,
};
use std::collections::HashMap;
use std::time::Duration;

pub const CHANNEL: &str = "mychannel";

pub fn channel() -> ChannelId {
    ChannelId::new(CHANNEL)
}

pub fn contract() -> ContractId {
    ContractId::new("example02", "v1", "github.com/example_cc")
}

pub struct TestIdentity;

impl IdentityProvider for TestIdentity {
    fn identity(&self) -> SigningIdentity {
        SigningIdentity {
            msp_id: MspId::new("Org1MSP"),
            name: "User1".into(),
            certificate: b"user1-cert".to_vec(),
        }
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        Digest::of(message).0.to_vec()
    }
}

/// What a scripted peer does with a proposal.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Success with this result (payload and read/write set derive from it).
    Agree(&'static str),
    /// Error status.
    Fail,
    Unreachable,
    /// Answers after the delay.
    Slow(Duration, &'static str),
}

/// Peers answering from a script, keyed by node name. Unknown nodes are
/// unreachable.
#[derive(Default)]
pub struct ScriptedPeers {
    replies: HashMap<NodeId, Reply>,
}

impl ScriptedPeers {
    pub fn new(script: &[(&str, Reply)]) -> Self {
        Self {
            replies: script
                .iter()
                .map(|(name, reply)| (NodeId::new(*name), reply.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl PeerProposalClient for ScriptedPeers {
    async fn send_proposal(
        &self,
        node: &NodeEndpoint,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError> {
        let reply = self
            .replies
            .get(&node.id)
            .cloned()
            .unwrap_or(Reply::Unreachable);

        let (status, result) = match reply {
            Reply::Agree(result) => (ResponseStatus::SUCCESS, result),
            Reply::Fail => (ResponseStatus::INTERNAL_ERROR, ""),
            Reply::Unreachable => {
                return Err(TransportError::Unreachable {
                    node: node.id.clone(),
                    reason: "connection refused".into(),
                })
            }
            Reply::Slow(delay, result) => {
                tokio::time::sleep(delay).await;
                (ResponseStatus::SUCCESS, result)
            }
        };

        Ok(ProposalResponse {
            origin: node.id.clone(),
            organization: node.msp_id.clone(),
            tx_id: proposal.tx_id().clone(),
            status,
            message: if status.is_success() {
                "OK".into()
            } else {
                "chaincode error".into()
            },
            payload: result.as_bytes().to_vec(),
            rw_set_digest: if result.is_empty() {
                Digest::empty()
            } else {
                Digest::of_parts([b"rw:".as_slice(), result.as_bytes()])
            },
            contract: proposal.proposal().contract().clone(),
            signature: node.id.as_str().as_bytes().to_vec(),
            verified: true,
        })
    }
}

/// Orderer that accepts everything and remembers what it saw.
#[derive(Default)]
pub struct RecordingOrderer {
    pub received: Mutex<Vec<(NodeId, TransactionId)>>,
}

#[async_trait]
impl OrdererClient for RecordingOrderer {
    async fn broadcast(
        &self,
        orderer: &NodeEndpoint,
        envelope: &TransactionEnvelope,
    ) -> Result<(), TransportError> {
        self.received
            .lock()
            .push((orderer.id.clone(), envelope.tx_id().clone()));
        Ok(())
    }
}

pub fn peer(name: &str, msp_id: &str) -> NodeEndpoint {
    NodeEndpoint {
        id: NodeId::new(name),
        url: format!("grpc://{name}:7051"),
        msp_id: MspId::new(msp_id),
        roles: PeerRole::all_peer_roles(),
        transport: TransportProperties::default(),
    }
}

pub fn orderer(name: &str) -> NodeEndpoint {
    NodeEndpoint {
        id: NodeId::new(name),
        url: format!("grpc://{name}:7050"),
        msp_id: MspId::new("OrdererMSP"),
        roles: [PeerRole::Orderer].into_iter().collect(),
        transport: TransportProperties::default(),
    }
}

/// `peer0.org1`, `peer1.org1`, `peer0.org2`, `peer1.org2`.
pub fn four_peers() -> Vec<NodeEndpoint> {
    vec![
        peer("peer0.org1", "Org1MSP"),
        peer("peer1.org1", "Org1MSP"),
        peer("peer0.org2", "Org2MSP"),
        peer("peer1.org2", "Org2MSP"),
    ]
}

pub fn invoke_proposal() -> SignedProposal {
    let proposal = Proposal::builder(OperationKind::Invoke, channel(), contract())
        .function("invoke")
        .args(["a", "b", "10"])
        .build()
        .unwrap();
    SignedProposal::sign(proposal, &TestIdentity).unwrap()
}

/// A block on [`CHANNEL`] holding one transaction.
pub fn block_with(block_number: u64, tx_id: &TransactionId, code: ValidationCode) -> BlockEvent {
    BlockEvent {
        channel: channel(),
        block_number,
        source: NodeId::new("peer0.org1"),
        transactions: vec![TransactionEvent {
            tx_id: tx_id.clone(),
            validation_code: code,
            chaincode_events: Vec::new(),
        }],
    }
}
