//! # Client Configuration
//!
//! Network layout, timeouts, the signing identity and endorsement policies,
//! loaded from TOML and then adjusted from the environment.
//!
//! ```toml
//! [network]
//! default_channel = "mychannel"
//!
//! [network.channels.mychannel]
//! peers = ["peer0.org1", "peer0.org2"]
//! orderers = ["orderer0"]
//!
//! [network.peers."peer0.org1"]
//! url = "grpc://peer0.org1:7051"
//! msp_id = "Org1MSP"
//!
//! [network.orderers.orderer0]
//! url = "grpc://orderer0:7050"
//! msp_id = "OrdererMSP"
//!
//! [timeouts]
//! commit_wait_ms = 300000
//!
//! [identity]
//! msp_id = "Org1MSP"
//! name = "User1"
//! signing_secret = "..."
//!
//! [policies.descriptors]
//! example02 = "policies/example02.yaml"
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LC_PROPOSAL_WAIT_MS` | `timeouts.proposal_wait_ms` |
//! | `LC_COMMIT_WAIT_MS` | `timeouts.commit_wait_ms` |
//! | `LC_CHANNEL` | `network.default_channel` |

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use shared_types::{PeerRole, TransportProperties};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub timeouts: TimeoutConfig,
    pub identity: IdentityConfig,
    pub policies: PolicyConfig,
}

impl ClientConfig {
    /// Read and parse a TOML file. Environment overrides are not applied.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> ConfigResult<Self> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `LC_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_millis(&lookup, "LC_PROPOSAL_WAIT_MS")? {
            self.timeouts.proposal_wait_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, "LC_COMMIT_WAIT_MS")? {
            self.timeouts.commit_wait_ms = ms;
        }
        if let Some(channel) = lookup("LC_CHANNEL").filter(|c| !c.is_empty()) {
            self.network.default_channel = Some(channel);
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// - no channel, or a default channel that does not exist
    /// - a channel without an endorsing peer or without an orderer
    /// - a channel naming a node that is not defined
    /// - a zero timeout
    /// - an identity without any signing key material
    pub fn validate(&self) -> ConfigResult<()> {
        self.timeouts.validate()?;
        self.network.validate()?;
        if self.identity.signing_key_file.is_none() && self.identity.signing_secret.is_none() {
            return Err(ConfigError::MissingSigningKey);
        }
        Ok(())
    }

    /// The channel operations default to: `network.default_channel`, else
    /// the first configured channel.
    pub fn default_channel(&self) -> Option<&str> {
        self.network
            .default_channel
            .as_deref()
            .or_else(|| self.network.channels.keys().next().map(String::as_str))
    }
}

fn parse_millis<F>(lookup: &F, var: &'static str) -> ConfigResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Some(ms)),
            _ => Err(ConfigError::InvalidEnv { var, value }),
        },
    }
}

/// Channels and the nodes serving them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub default_channel: Option<String>,
    pub channels: BTreeMap<String, ChannelConfig>,
    pub peers: BTreeMap<String, PeerConfig>,
    pub orderers: BTreeMap<String, OrdererConfig>,
}

impl NetworkConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if let Some(default) = &self.default_channel {
            if !self.channels.contains_key(default) {
                return Err(ConfigError::UnknownChannel(default.clone()));
            }
        }

        for (name, channel) in &self.channels {
            let unknown = channel
                .peers
                .iter()
                .find(|p| !self.peers.contains_key(*p))
                .or_else(|| {
                    channel
                        .orderers
                        .iter()
                        .find(|o| !self.orderers.contains_key(*o))
                });
            if let Some(node) = unknown {
                return Err(ConfigError::UnknownNode {
                    channel: name.clone(),
                    node: node.clone(),
                });
            }

            let has_endorser = channel
                .peers
                .iter()
                .filter_map(|p| self.peers.get(p))
                .any(|p| p.roles.contains(&PeerRoleConfig::EndorsingPeer));
            if !has_endorser {
                return Err(ConfigError::NoEndorsers {
                    channel: name.clone(),
                });
            }
            if channel.orderers.is_empty() {
                return Err(ConfigError::NoOrderers {
                    channel: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Node names joined to one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub peers: Vec<String>,
    pub orderers: Vec<String>,
}

/// Peer role as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeerRoleConfig {
    EndorsingPeer,
    ChaincodeQuery,
    LedgerQuery,
    EventSource,
}

impl From<PeerRoleConfig> for PeerRole {
    fn from(role: PeerRoleConfig) -> Self {
        match role {
            PeerRoleConfig::EndorsingPeer => PeerRole::EndorsingPeer,
            PeerRoleConfig::ChaincodeQuery => PeerRole::ChaincodeQuery,
            PeerRoleConfig::LedgerQuery => PeerRole::LedgerQuery,
            PeerRoleConfig::EventSource => PeerRole::EventSource,
        }
    }
}

fn all_roles() -> BTreeSet<PeerRoleConfig> {
    [
        PeerRoleConfig::EndorsingPeer,
        PeerRoleConfig::ChaincodeQuery,
        PeerRoleConfig::LedgerQuery,
        PeerRoleConfig::EventSource,
    ]
    .into_iter()
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub url: String,
    pub msp_id: String,
    /// Defaults to every peer role.
    #[serde(default = "all_roles")]
    pub roles: BTreeSet<PeerRoleConfig>,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererConfig {
    pub url: String,
    pub msp_id: String,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Per-node transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub request_timeout_ms: u64,
    pub max_message_size: usize,
    /// `None` disables keep-alive.
    pub keep_alive_ms: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let defaults = TransportProperties::default();
        Self {
            request_timeout_ms: defaults.request_timeout.as_millis() as u64,
            max_message_size: defaults.max_message_size,
            keep_alive_ms: defaults.keep_alive.map(|d| d.as_millis() as u64),
        }
    }
}

impl TransportConfig {
    pub fn properties(&self) -> TransportProperties {
        TransportProperties {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_message_size: self.max_message_size,
            keep_alive: self.keep_alive_ms.map(Duration::from_millis),
        }
    }
}

/// Wait budgets for the three phases of an ordered operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for collecting proposal responses.
    pub proposal_wait_ms: u64,
    /// Budget for the commit event after submission.
    pub commit_wait_ms: u64,
    /// Upper bound on a single orderer broadcast.
    pub orderer_send_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            proposal_wait_ms: 20_000,
            commit_wait_ms: 300_000,
            orderer_send_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn proposal_wait(&self) -> Duration {
        Duration::from_millis(self.proposal_wait_ms)
    }

    pub fn commit_wait(&self) -> Duration {
        Duration::from_millis(self.commit_wait_ms)
    }

    pub fn orderer_send(&self) -> Duration {
        Duration::from_millis(self.orderer_send_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("proposal_wait_ms", self.proposal_wait_ms),
            ("commit_wait_ms", self.commit_wait_ms),
            ("orderer_send_ms", self.orderer_send_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout { name });
            }
        }
        Ok(())
    }
}

/// The user operations run as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub msp_id: String,
    pub name: String,
    pub certificate_file: Option<PathBuf>,
    pub signing_key_file: Option<PathBuf>,
    /// Inline key material, for development networks.
    pub signing_secret: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            msp_id: "Org1MSP".to_string(),
            name: "User1".to_string(),
            certificate_file: None,
            signing_key_file: None,
            signing_secret: None,
        }
    }
}

/// Endorsement policy descriptor files, keyed by contract name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub descriptors: BTreeMap<String, PathBuf>,
}
