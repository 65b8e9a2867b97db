//! # Client Context
//!
//! Everything one contract operation needs to know about its caller and the
//! network, passed explicitly into every [`ContractService`] call:
//!
//! - the node directory (who endorses, who orders)
//! - the signing identity (who is asking)
//! - the endorsement policy store
//! - the wait budgets
//!
//! Contexts are cheap to clone. Two operations may run with different
//! identities against the same service by passing different contexts.
//!
//! [`ContractService`]: crate::contract::ContractService

use crate::config::{ClientConfig, TimeoutConfig};
use crate::directory::StaticNodeDirectory;
use crate::error::{ConfigError, ConfigResult};
use crate::identity::LocalIdentity;
use lc_02_endorsement::{InMemoryPolicyStore, PolicyStore};
use shared_types::{IdentityProvider, NodeDirectory};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ClientContext {
    directory: Arc<dyn NodeDirectory>,
    identity: Arc<dyn IdentityProvider>,
    policies: Arc<dyn PolicyStore>,
    timeouts: TimeoutConfig,
}

impl ClientContext {
    pub fn new(
        directory: Arc<dyn NodeDirectory>,
        identity: Arc<dyn IdentityProvider>,
        policies: Arc<dyn PolicyStore>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            directory,
            identity,
            policies,
            timeouts,
        }
    }

    /// Validate `config` and build the directory, identity and policy store
    /// it describes.
    pub fn from_config(config: &ClientConfig) -> ConfigResult<Self> {
        config.validate()?;

        let directory = StaticNodeDirectory::from_config(&config.network, &config.timeouts)?;
        let identity = LocalIdentity::from_config(&config.identity)?;

        let policies = InMemoryPolicyStore::new();
        for (contract, path) in &config.policies.descriptors {
            policies
                .load_descriptor(contract, path)
                .map_err(|source| ConfigError::Policy {
                    contract: contract.clone(),
                    source,
                })?;
        }

        info!(
            msp_id = %config.identity.msp_id,
            user = %config.identity.name,
            channels = config.network.channels.len(),
            policies = policies.len(),
            "Client context ready"
        );

        Ok(Self::new(
            Arc::new(directory),
            Arc::new(identity),
            Arc::new(policies),
            config.timeouts.clone(),
        ))
    }

    /// Same network and policies, different caller.
    #[must_use]
    pub fn with_identity(&self, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }

    /// Same caller, different network view.
    #[must_use]
    pub fn with_directory(&self, directory: Arc<dyn NodeDirectory>) -> Self {
        Self {
            directory,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_timeouts(&self, timeouts: TimeoutConfig) -> Self {
        Self {
            timeouts,
            ..self.clone()
        }
    }

    pub fn directory(&self) -> &Arc<dyn NodeDirectory> {
        &self.directory
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn policies(&self) -> &Arc<dyn PolicyStore> {
        &self.policies
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelConfig, OrdererConfig, PeerConfig, TransportConfig};
    use shared_types::{ChannelId, ContractId, PeerRole};

    const POLICY: &str = r#"
identities:
  - user1: { role: { name: member, mspId: Org1MSP } }
  - user2: { role: { name: member, mspId: Org2MSP } }
policy:
  2-of:
    - signed-by: user1
    - signed-by: user2
"#;

    fn config() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.network.channels.insert(
            "mychannel".into(),
            ChannelConfig {
                peers: vec!["peer0.org1".into()],
                orderers: vec!["orderer0".into()],
            },
        );
        config.network.peers.insert(
            "peer0.org1".into(),
            PeerConfig {
                url: "grpc://peer0.org1:7051".into(),
                msp_id: "Org1MSP".into(),
                roles: [crate::config::PeerRoleConfig::EndorsingPeer]
                    .into_iter()
                    .collect(),
                transport: TransportConfig::default(),
            },
        );
        config.network.orderers.insert(
            "orderer0".into(),
            OrdererConfig {
                url: "grpc://orderer0:7050".into(),
                msp_id: "OrdererMSP".into(),
                transport: TransportConfig::default(),
            },
        );
        config.identity.signing_secret = Some("dev".into());
        config
    }

    #[test]
    fn test_from_config_loads_policies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example02.yaml");
        std::fs::write(&path, POLICY).unwrap();

        let mut config = config();
        config.policies.descriptors.insert("example02".into(), path);
        let context = ClientContext::from_config(&config).unwrap();

        let policy = context
            .policies()
            .policy_for(&ContractId::new("example02", "v1", "gocc/example02"))
            .unwrap();
        assert_eq!(policy.minimum_endorsers(), 2);
        assert_eq!(
            context
                .directory()
                .peers(&ChannelId::new("mychannel"), PeerRole::EndorsingPeer)
                .len(),
            1
        );
        assert_eq!(context.identity().identity().name, "User1");
    }

    #[test]
    fn test_bad_policy_file_names_contract() {
        let mut config = config();
        config
            .policies
            .descriptors
            .insert("example02".into(), "/nonexistent/policy.yaml".into());

        assert!(matches!(
            ClientContext::from_config(&config),
            Err(ConfigError::Policy { contract, .. }) if contract == "example02"
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.identity.signing_secret = None;
        assert!(matches!(
            ClientContext::from_config(&config),
            Err(ConfigError::MissingSigningKey)
        ));
    }

    #[test]
    fn test_with_identity_keeps_network() {
        let context = ClientContext::from_config(&config()).unwrap();
        let admin = LocalIdentity::new("Org1MSP", "Admin", Vec::new(), b"admin").unwrap();

        let as_admin = context.with_identity(Arc::new(admin));
        assert_eq!(as_admin.identity().identity().name, "Admin");
        assert!(Arc::ptr_eq(as_admin.directory(), context.directory()));
    }
}
