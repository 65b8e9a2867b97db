//! # Simulated Network
//!
//! An in-process channel with endorsing peers, an ordering service and an
//! event source, running the two-account transfer contract.
//!
//! ```text
//!  ContractService ──send_proposal──→ SimulatedPeer ──simulate──→ Ledger
//!        │                                                          ↑
//!        └──broadcast──→ orderer ──commit (MVCC)────────────────────┘
//!                           │
//!                           └──publish(BlockEvent)──→ InMemoryEventFeed
//! ```
//!
//! Faults can be injected per peer ([`PeerFault`]) and for the ordering
//! service ([`OrdererFault`]) to drive the failure paths of the pipeline.

mod example02;
mod ledger;
mod peer;

pub use example02::EVENT_NAME;

use crate::directory::StaticNodeDirectory;
use crate::identity::LocalIdentity;
use async_trait::async_trait;
use lc_01_proposal::{PeerProposalClient, ProposalResponse, SignedProposal};
use lc_03_submission::{OrdererClient, TransactionEnvelope};
use ledger::Ledger;
use parking_lot::Mutex;
use peer::SimulatedPeer;
use shared_bus::{EventPublisher, InMemoryEventFeed};
use shared_types::{
    BlockEvent, ChannelId, ContractId, MspId, NodeEndpoint, NodeId, PeerRole, TransactionEvent,
    TransportError, TransportProperties, ValidationCode,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Misbehaviour of one endorsing peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerFault {
    /// Connection refused.
    Unreachable,
    /// Answers after the given delay.
    Slow(Duration),
    /// Executes, but returns a different payload and read/write set.
    Divergent,
    /// Answers with an error status.
    ErrorStatus,
    /// Signs with garbage, so the response fails verification.
    BadSignature,
}

/// Misbehaviour of the ordering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdererFault {
    /// Connection refused.
    Unreachable,
    /// Accepts envelopes and never delivers a block.
    Drop,
    /// Orders every transaction with this validation code.
    Invalidate(ValidationCode),
}

pub struct SimulatedNetwork {
    channel: ChannelId,
    peers: BTreeMap<NodeId, SimulatedPeer>,
    orderers: Vec<NodeEndpoint>,
    ledger: Ledger,
    feed: Arc<InMemoryEventFeed>,
    orderer_fault: Mutex<Option<OrdererFault>>,
}

impl SimulatedNetwork {
    pub fn builder(channel: impl Into<String>) -> SimulatedNetworkBuilder {
        SimulatedNetworkBuilder {
            channel: ChannelId::new(channel),
            peers: Vec::new(),
            orderers: Vec::new(),
            transport: TransportProperties::default(),
        }
    }

    /// Two organisations with two peers each and one orderer.
    pub fn example(channel: impl Into<String>) -> Arc<Self> {
        Self::builder(channel)
            .peer("peer0.org1", "Org1MSP")
            .peer("peer1.org1", "Org1MSP")
            .peer("peer0.org2", "Org2MSP")
            .peer("peer1.org2", "Org2MSP")
            .orderer("orderer0")
            .build()
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn feed(&self) -> &Arc<InMemoryEventFeed> {
        &self.feed
    }

    /// Directory listing every simulated node on the channel.
    pub fn directory(&self) -> StaticNodeDirectory {
        let mut directory = StaticNodeDirectory::new();
        for peer in self.peers.values() {
            directory.add_peer(&self.channel, peer.endpoint.clone());
        }
        for orderer in &self.orderers {
            directory.add_orderer(&self.channel, orderer.clone());
        }
        directory
    }

    pub fn peer_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.peers.keys()
    }

    /// Inject (or with `None` clear) a fault on one peer.
    pub fn set_peer_fault(&self, peer: &NodeId, fault: Option<PeerFault>) {
        if let Some(p) = self.peers.get(peer) {
            info!(peer = %peer, fault = ?fault, "Simulated peer fault set");
            *p.fault.lock() = fault;
        }
    }

    pub fn set_orderer_fault(&self, fault: Option<OrdererFault>) {
        info!(fault = ?fault, "Simulated orderer fault set");
        *self.orderer_fault.lock() = fault;
    }

    pub fn clear_faults(&self) {
        for peer in self.peers.values() {
            *peer.fault.lock() = None;
        }
        *self.orderer_fault.lock() = None;
    }

    /// Committed balance of an account.
    pub fn balance(&self, account: &str) -> Option<i64> {
        self.ledger.value(account)
    }

    /// Number of the next block to be cut.
    pub fn height(&self) -> u64 {
        self.ledger.height()
    }

    pub fn instantiated(&self) -> Option<ContractId> {
        self.ledger.instance()
    }

    pub fn installed_on(&self, peer: &NodeId) -> Vec<ContractId> {
        self.peers
            .get(peer)
            .map(|p| p.installed().into_iter().collect())
            .unwrap_or_default()
    }

    /// Publish a block for `transaction`, as the first peer would deliver it.
    async fn deliver(&self, block_number: u64, transaction: TransactionEvent) {
        let source = self
            .peers
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| NodeId::new("eventhub"));
        let block = BlockEvent {
            channel: self.channel.clone(),
            block_number,
            source,
            transactions: vec![transaction],
        };
        let receivers = self.feed.publish(block).await;
        debug!(block_number, receivers, "Simulated block delivered");
    }
}

#[async_trait]
impl PeerProposalClient for SimulatedNetwork {
    async fn send_proposal(
        &self,
        node: &NodeEndpoint,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError> {
        let peer = self
            .peers
            .get(&node.id)
            .ok_or_else(|| TransportError::Unreachable {
                node: node.id.clone(),
                reason: "no such peer".into(),
            })?;

        let fault = *peer.fault.lock();
        match fault {
            Some(PeerFault::Unreachable) => {
                return Err(TransportError::Unreachable {
                    node: node.id.clone(),
                    reason: "connection refused".into(),
                });
            }
            Some(PeerFault::Slow(delay)) => tokio::time::sleep(delay).await,
            _ => {}
        }

        if proposal.proposal().channel() != &self.channel {
            return Err(TransportError::Malformed {
                node: node.id.clone(),
                reason: format!("peer is not joined to {}", proposal.proposal().channel()),
            });
        }

        let mut response = peer.endorse(&self.ledger, proposal, fault);
        response.verified = peer.verify(&response);
        Ok(response)
    }
}

#[async_trait]
impl OrdererClient for SimulatedNetwork {
    async fn broadcast(
        &self,
        orderer: &NodeEndpoint,
        envelope: &TransactionEnvelope,
    ) -> Result<(), TransportError> {
        if !self.orderers.iter().any(|o| o.id == orderer.id) {
            return Err(TransportError::Unreachable {
                node: orderer.id.clone(),
                reason: "no such orderer".into(),
            });
        }
        if envelope.channel() != &self.channel {
            return Err(TransportError::Malformed {
                node: orderer.id.clone(),
                reason: format!("orderer does not serve {}", envelope.channel()),
            });
        }

        let fault = *self.orderer_fault.lock();
        let ordered = match fault {
            Some(OrdererFault::Unreachable) => {
                return Err(TransportError::Unreachable {
                    node: orderer.id.clone(),
                    reason: "connection refused".into(),
                });
            }
            Some(OrdererFault::Drop) => {
                self.ledger.forget(envelope.tx_id());
                None
            }
            Some(OrdererFault::Invalidate(code)) => self.ledger.reject(envelope.tx_id(), code),
            None => self.ledger.commit(envelope.tx_id()),
        };

        if let Some((block_number, transaction)) = ordered {
            self.deliver(block_number, transaction).await;
        }
        Ok(())
    }
}

pub struct SimulatedNetworkBuilder {
    channel: ChannelId,
    peers: Vec<(String, String)>,
    orderers: Vec<String>,
    transport: TransportProperties,
}

impl SimulatedNetworkBuilder {
    #[must_use]
    pub fn peer(mut self, name: impl Into<String>, msp_id: impl Into<String>) -> Self {
        self.peers.push((name.into(), msp_id.into()));
        self
    }

    #[must_use]
    pub fn orderer(mut self, name: impl Into<String>) -> Self {
        self.orderers.push(name.into());
        self
    }

    /// Transport properties given to every node.
    #[must_use]
    pub fn transport(mut self, transport: TransportProperties) -> Self {
        self.transport = transport;
        self
    }

    pub fn build(self) -> Arc<SimulatedNetwork> {
        let mut peers = BTreeMap::new();
        for (name, msp_id) in self.peers {
            let endpoint = NodeEndpoint {
                id: NodeId::new(&name),
                url: format!("sim://{name}"),
                msp_id: MspId::new(&msp_id),
                roles: PeerRole::all_peer_roles(),
                transport: self.transport.clone(),
            };
            // Peer keys are only known inside the simulation.
            let identity = match LocalIdentity::new(&msp_id, &name, Vec::new(), name.as_bytes()) {
                Ok(identity) => identity,
                Err(_) => continue,
            };
            peers.insert(endpoint.id.clone(), SimulatedPeer::new(endpoint, identity));
        }

        let orderers = self
            .orderers
            .into_iter()
            .map(|name| NodeEndpoint {
                id: NodeId::new(&name),
                url: format!("sim://{name}"),
                msp_id: MspId::new("OrdererMSP"),
                roles: [PeerRole::Orderer].into_iter().collect(),
                transport: self.transport.clone(),
            })
            .collect();

        Arc::new(SimulatedNetwork {
            channel: self.channel,
            peers,
            orderers,
            ledger: Ledger::default(),
            feed: Arc::new(InMemoryEventFeed::new()),
            orderer_fault: Mutex::new(None),
        })
    }
}
