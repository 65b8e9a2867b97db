//! Static node directory built from configuration

use crate::config::{NetworkConfig, TimeoutConfig};
use crate::error::{ConfigError, ConfigResult};
use shared_types::{ChannelId, MspId, NodeDirectory, NodeEndpoint, NodeId, PeerRole};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct ChannelMembers {
    peers: Vec<NodeId>,
    orderers: Vec<NodeId>,
}

/// Immutable view of the network: nodes by name, channel membership in
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct StaticNodeDirectory {
    nodes: HashMap<NodeId, NodeEndpoint>,
    channels: HashMap<ChannelId, ChannelMembers>,
}

impl StaticNodeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[network]` section. Orderer request timeouts are
    /// capped at `timeouts.orderer_send`.
    pub fn from_config(network: &NetworkConfig, timeouts: &TimeoutConfig) -> ConfigResult<Self> {
        let mut directory = Self::new();

        for (channel_name, channel) in &network.channels {
            let channel_id = ChannelId::new(channel_name);

            for name in &channel.peers {
                let peer = network
                    .peers
                    .get(name)
                    .ok_or_else(|| unknown(channel_name, name))?;
                directory.add_peer(
                    &channel_id,
                    NodeEndpoint {
                        id: NodeId::new(name),
                        url: peer.url.clone(),
                        msp_id: MspId::new(&peer.msp_id),
                        roles: peer.roles.iter().copied().map(PeerRole::from).collect(),
                        transport: peer.transport.properties(),
                    },
                );
            }

            for name in &channel.orderers {
                let orderer = network
                    .orderers
                    .get(name)
                    .ok_or_else(|| unknown(channel_name, name))?;
                let mut transport = orderer.transport.properties();
                transport.request_timeout = transport.request_timeout.min(timeouts.orderer_send());
                directory.add_orderer(
                    &channel_id,
                    NodeEndpoint {
                        id: NodeId::new(name),
                        url: orderer.url.clone(),
                        msp_id: MspId::new(&orderer.msp_id),
                        roles: [PeerRole::Orderer].into_iter().collect(),
                        transport,
                    },
                );
            }
        }

        Ok(directory)
    }

    /// Join a peer to `channel`. A node joined to several channels keeps the
    /// endpoint it was first added with.
    pub fn add_peer(&mut self, channel: &ChannelId, endpoint: NodeEndpoint) -> &mut Self {
        let id = endpoint.id.clone();
        self.nodes.entry(id.clone()).or_insert(endpoint);
        let members = self.channels.entry(channel.clone()).or_default();
        if !members.peers.contains(&id) {
            members.peers.push(id);
        }
        self
    }

    pub fn add_orderer(&mut self, channel: &ChannelId, endpoint: NodeEndpoint) -> &mut Self {
        let id = endpoint.id.clone();
        self.nodes.entry(id.clone()).or_insert(endpoint);
        let members = self.channels.entry(channel.clone()).or_default();
        if !members.orderers.contains(&id) {
            members.orderers.push(id);
        }
        self
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    fn resolve<'a>(&'a self, ids: &'a [NodeId]) -> impl Iterator<Item = &'a NodeEndpoint> + 'a {
        ids.iter().filter_map(|id| self.nodes.get(id))
    }
}

fn unknown(channel: &str, node: &str) -> ConfigError {
    ConfigError::UnknownNode {
        channel: channel.to_string(),
        node: node.to_string(),
    }
}

impl NodeDirectory for StaticNodeDirectory {
    fn endpoint(&self, node: &NodeId) -> Option<NodeEndpoint> {
        self.nodes.get(node).cloned()
    }

    fn peers(&self, channel: &ChannelId, role: PeerRole) -> Vec<NodeEndpoint> {
        self.channels
            .get(channel)
            .map(|members| {
                self.resolve(&members.peers)
                    .filter(|endpoint| endpoint.has_role(role))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn orderers(&self, channel: &ChannelId) -> Vec<NodeEndpoint> {
        self.channels
            .get(channel)
            .map(|members| self.resolve(&members.orderers).cloned().collect())
            .unwrap_or_default()
    }
}
