//! # Ledger Client
//!
//! Runs the two-account transfer demo against an in-process network:
//!
//! 1. Register a listener for the contract's transfer events
//! 2. Install and instantiate `example02` (`init a 100 b 100`)
//! 3. Query `b`, move 100 from `a` to `b`, query `b` again
//! 4. Install the next version and upgrade to it
//!
//! ## Usage
//!
//! ```text
//! client-runtime [client.toml]
//! ```
//!
//! Without a configuration file a built-in identity and the default
//! timeouts are used. With one, its identity, timeouts, policies and
//! default channel apply (after `LC_*` environment overrides), while the
//! nodes are always the simulated ones.

use anyhow::{Context, Result};
use client_runtime::simulation::EVENT_NAME;
use client_runtime::{
    ChannelEvents, ClientConfig, ClientContext, ContractService, LocalIdentity,
    SimulatedNetwork, TimeoutConfig,
};
use lc_02_endorsement::InMemoryPolicyStore;
use lc_telemetry::{init_logging, TelemetryConfig};
use shared_types::{ChannelId, ContractId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CHANNEL: &str = "mychannel";
const CONTRACT_NAME: &str = "example02";
const CONTRACT_PATH: &str = "github.com/example_cc";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let mut config = ClientConfig::load(&path)
                .with_context(|| format!("Failed to load configuration from {path}"))?;
            config.apply_env_overrides()?;
            Some(config)
        }
        None => None,
    };

    let channel = ChannelId::new(
        config
            .as_ref()
            .and_then(ClientConfig::default_channel)
            .unwrap_or(DEFAULT_CHANNEL),
    );
    let network = SimulatedNetwork::example(channel.as_str());
    let directory = Arc::new(network.directory());

    let ctx = match &config {
        Some(config) => ClientContext::from_config(config)?.with_directory(directory),
        None => ClientContext::new(
            directory,
            Arc::new(LocalIdentity::new("Org1MSP", "User1", Vec::new(), b"user1-demo-secret")?),
            Arc::new(InMemoryPolicyStore::new()),
            TimeoutConfig::default(),
        ),
    };

    let service = ContractService::spawn(network.clone(), network.clone(), network.feed().as_ref());
    let events = ChannelEvents::spawn(network.feed().as_ref());

    let listener = events.register_chaincode_event_listener(
        &channel,
        ".*",
        EVENT_NAME,
        |handle, block, event| {
            info!(
                handle = %handle,
                block = block.block_number,
                tx_id = %event.tx_id,
                payload = %String::from_utf8_lossy(&event.payload),
                "Transfer event received"
            );
            Ok(())
        },
    )?;

    let v1 = ContractId::new(CONTRACT_NAME, "v1", CONTRACT_PATH);
    service
        .install(&ctx, &channel, &v1, b"example02 v1 package".to_vec())
        .await?;
    service
        .instantiate(&ctx, &channel, &v1, None, "init", &["a", "100", "b", "100"])
        .await?;

    let before = service.query(&ctx, &channel, &v1, "query", &["b"]).await?;
    info!(balance = %String::from_utf8_lossy(&before), "Balance of b before transfer");

    let tx_id = service
        .invoke(&ctx, &channel, &v1, "invoke", &["a", "b", "100"], BTreeMap::new())
        .await?;
    info!(tx_id = %tx_id, "Transfer committed");

    let after = service.query(&ctx, &channel, &v1, "query", &["b"]).await?;
    info!(balance = %String::from_utf8_lossy(&after), "Balance of b after transfer");

    let v2 = v1.with_version("v2");
    service
        .install(&ctx, &channel, &v2, b"example02 v2 package".to_vec())
        .await?;
    service
        .upgrade(&ctx, &channel, &v2, None, "init", &["a", "100", "b", "100"])
        .await?;
    info!(contract = %v2, height = network.height(), "Upgrade committed");

    events.unregister_chaincode_event_listener(listener)?;
    Ok(())
}
