//! # Contract Flows
//!
//! The whole client (config → context → contract service → event listeners)
//! against the simulated network.
//!
//! ```text
//! client.toml + example02.yaml
//!        │ load / apply_overrides
//!        ▼
//! ClientContext ──→ ContractService ──→ SimulatedNetwork (4 peers, 1 orderer)
//!                                              │ block events
//!                    ChannelEvents ◀───────────┘
//! ```

#[cfg(test)]
mod tests {
    use client_runtime::simulation::EVENT_NAME;
    use client_runtime::{
        ChannelEvents, ClientConfig, ClientContext, ConfigError, ContractError, ContractService,
        PeerFault, SimulatedNetwork,
    };
    use lc_02_endorsement::EndorsementError;
    use shared_types::{ChannelId, ContractId, NodeId};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    const CONFIG: &str = r#"
[network]
default_channel = "mychannel"

[network.channels.mychannel]
peers = ["peer0.org1", "peer1.org1", "peer0.org2", "peer1.org2"]
orderers = ["orderer0"]

[network.peers."peer0.org1"]
url = "grpc://peer0.org1:7051"
msp_id = "Org1MSP"

[network.peers."peer1.org1"]
url = "grpc://peer1.org1:8051"
msp_id = "Org1MSP"

[network.peers."peer0.org2"]
url = "grpc://peer0.org2:9051"
msp_id = "Org2MSP"

[network.peers."peer1.org2"]
url = "grpc://peer1.org2:10051"
msp_id = "Org2MSP"

[network.orderers.orderer0]
url = "grpc://orderer0:7050"
msp_id = "OrdererMSP"

[identity]
msp_id = "Org1MSP"
name = "User1"
signing_secret = "integration-secret"
"#;

    const POLICY: &str = r#"
identities:
  - user1: { role: { name: member, mspId: Org1MSP } }
  - user2: { role: { name: member, mspId: Org2MSP } }
policy:
  2-of:
    - signed-by: user1
    - signed-by: user2
"#;

    fn write_config(dir: &Path) -> std::path::PathBuf {
        let policy = dir.join("example02.yaml");
        std::fs::write(&policy, POLICY).unwrap();

        let config = dir.join("client.toml");
        std::fs::write(
            &config,
            format!(
                "{CONFIG}\n[policies.descriptors]\nexample02 = {:?}\n",
                policy.display().to_string()
            ),
        )
        .unwrap();
        config
    }

    struct Client {
        network: Arc<SimulatedNetwork>,
        service: ContractService,
        ctx: ClientContext,
        channel: ChannelId,
    }

    fn client(overrides: &[(&str, &str)]) -> (tempfile::TempDir, Client) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::load(write_config(dir.path())).unwrap();
        let vars: BTreeMap<String, String> = overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config
            .apply_overrides(|key: &str| vars.get(key).cloned())
            .unwrap();

        let channel = ChannelId::new(config.default_channel().unwrap());
        let network = SimulatedNetwork::example(channel.as_str());
        let ctx = ClientContext::from_config(&config)
            .unwrap()
            .with_directory(Arc::new(network.directory()));
        let service =
            ContractService::spawn(network.clone(), network.clone(), network.feed().as_ref());

        (
            dir,
            Client {
                network,
                service,
                ctx,
                channel,
            },
        )
    }

    fn example02() -> ContractId {
        ContractId::new("example02", "v1", "github.com/example_cc")
    }

    async fn deploy(client: &Client) {
        client
            .service
            .install(&client.ctx, &client.channel, &example02(), b"example02".to_vec())
            .await
            .unwrap();
        client
            .service
            .instantiate(
                &client.ctx,
                &client.channel,
                &example02(),
                None,
                "init",
                &["a", "100", "b", "100"],
            )
            .await
            .unwrap();
    }

    async fn transfer(client: &Client, amount: &str) -> Result<(), ContractError> {
        client
            .service
            .invoke(
                &client.ctx,
                &client.channel,
                &example02(),
                "invoke",
                &["a", "b", amount],
                BTreeMap::new(),
            )
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn test_configured_policy_tolerates_one_org2_peer_down() {
        let (_dir, client) = client(&[]);
        deploy(&client).await;

        client
            .network
            .set_peer_fault(&NodeId::new("peer0.org2"), Some(PeerFault::Unreachable));
        transfer(&client, "10").await.unwrap();

        assert_eq!(client.network.balance("a"), Some(90));
        assert_eq!(client.network.balance("b"), Some(110));
    }

    #[tokio::test]
    async fn test_configured_policy_needs_org2() {
        let (_dir, client) = client(&[]);
        deploy(&client).await;
        let height = client.network.height();

        for peer in ["peer0.org2", "peer1.org2"] {
            client
                .network
                .set_peer_fault(&NodeId::new(peer), Some(PeerFault::Unreachable));
        }
        let err = transfer(&client, "10").await.unwrap_err();

        assert!(matches!(
            err,
            ContractError::Endorsement(EndorsementError::InsufficientEndorsements { ref reason })
                if reason.contains("do not satisfy")
        ));
        assert_eq!(client.network.height(), height);
        assert_eq!(client.network.balance("a"), Some(100));
    }

    #[test]
    fn test_channel_override_must_name_configured_channel() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::load(write_config(dir.path())).unwrap();
        config
            .apply_overrides(|key: &str| (key == "LC_CHANNEL").then(|| "otherchannel".to_string()))
            .unwrap();

        assert_eq!(config.default_channel(), Some("otherchannel"));
        assert!(matches!(
            ClientContext::from_config(&config),
            Err(ConfigError::UnknownChannel(channel)) if channel == "otherchannel"
        ));
    }

    #[tokio::test]
    async fn test_commit_wait_override_applies() {
        let (_dir, client) = client(&[("LC_COMMIT_WAIT_MS", "1500")]);
        assert_eq!(
            client.ctx.timeouts().commit_wait(),
            Duration::from_millis(1500)
        );
    }

    #[tokio::test]
    async fn test_transfer_event_reaches_listener() {
        let (_dir, client) = client(&[]);
        let events = ChannelEvents::spawn(client.network.feed().as_ref());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = events
            .register_chaincode_event_listener(
                &client.channel,
                "example.*",
                EVENT_NAME,
                move |_, block, event| {
                    let _ = tx.send((block.block_number, event.tx_id.clone()));
                    Ok(())
                },
            )
            .unwrap();

        deploy(&client).await;
        let tx_id = client
            .service
            .invoke(
                &client.ctx,
                &client.channel,
                &example02(),
                "invoke",
                &["a", "b", "25"],
                BTreeMap::new(),
            )
            .await
            .unwrap();

        let (block_number, seen) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, tx_id);
        assert_eq!(block_number, client.network.height() - 1);

        events.unregister_chaincode_event_listener(handle).unwrap();
        assert!(!events.registry().contains(&handle));
    }
}
