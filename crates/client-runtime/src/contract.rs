//! # Contract Service
//!
//! Runs contract operations through the endorsement pipeline.
//!
//! | Operation | Peers | Policy | Ordered |
//! |-----------|-------|--------|---------|
//! | `install` | endorsing | every peer agrees | no |
//! | `instantiate` / `upgrade` | endorsing | every peer agrees | yes, waits for commit |
//! | `invoke` | endorsing | policy store, else every peer agrees | yes, waits for commit |
//! | `query` | chaincode query | every peer agrees | no |
//!
//! ```text
//!  Proposal ──sign──→ ResponseCollector ──→ EndorsementEvaluator
//!                                                 │ satisfied
//!                                                 ▼
//!                      CommitFuture ←── TransactionSubmitter ──→ orderers
//! ```
//!
//! Every call takes the [`ClientContext`] it runs under. The service itself
//! only owns the transport ports and the commit waiter.

use crate::context::ClientContext;
use crate::error::{ContractError, ContractResult};
use crate::metrics;
use lc_01_proposal::{
    OperationKind, PeerProposalClient, Proposal, ResponseAggregator, ResponseCollector,
    SignedProposal,
};
use lc_02_endorsement::{
    AgreeingThreshold, EndorsementDecision, EndorsementEvaluator, EndorsementPolicy,
    PolicyDescriptor, PolicyEvaluator,
};
use lc_03_submission::{
    CommitFuture, CommitWaiter, OrdererClient, TransactionSubmission, TransactionSubmitter,
};
use lc_telemetry::log_tx_event;
use shared_bus::EventFeed;
use shared_types::{ChannelId, ContractId, NodeEndpoint, PeerRole, TransactionId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// Transient key naming the kind of request, read by the peer.
pub const METHOD_KEY: &str = "method";

const INSTANTIATE_METHOD: &str = "InstantiateProposalRequest";
const UPGRADE_METHOD: &str = "UpgradeProposalRequest";
const TRANSACTION_METHOD: &str = "TransactionProposalRequest";

pub struct ContractService {
    collector: Arc<dyn ResponseCollector>,
    evaluator: Arc<dyn EndorsementEvaluator>,
    orderer: Arc<dyn OrdererClient>,
    waiter: Arc<CommitWaiter>,
}

impl ContractService {
    pub fn new(
        collector: Arc<dyn ResponseCollector>,
        evaluator: Arc<dyn EndorsementEvaluator>,
        orderer: Arc<dyn OrdererClient>,
        waiter: Arc<CommitWaiter>,
    ) -> Self {
        Self {
            collector,
            evaluator,
            orderer,
            waiter,
        }
    }

    /// Service over the given transports with the default aggregator and
    /// evaluator. Starts a commit waiter on `feed`, so it must be called from
    /// within a tokio runtime.
    pub fn spawn(
        peers: Arc<dyn PeerProposalClient>,
        orderer: Arc<dyn OrdererClient>,
        feed: &dyn EventFeed,
    ) -> Self {
        Self::new(
            Arc::new(ResponseAggregator::new(peers)),
            Arc::new(PolicyEvaluator::new()),
            orderer,
            Arc::new(CommitWaiter::spawn(feed)),
        )
    }

    pub fn waiter(&self) -> &Arc<CommitWaiter> {
        &self.waiter
    }

    /// Install `package` on every endorsing peer of `channel`.
    ///
    /// Nothing is ordered. Every peer must accept the package.
    pub async fn install(
        &self,
        ctx: &ClientContext,
        channel: &ChannelId,
        contract: &ContractId,
        package: Vec<u8>,
    ) -> ContractResult<ContractId> {
        let nodes = peers(ctx, channel, PeerRole::EndorsingPeer)?;
        let proposal = Proposal::builder(OperationKind::Install, channel.clone(), contract.clone())
            .package(package)
            .wait_time(ctx.timeouts().proposal_wait())
            .build()?;

        let (signed, _) = self
            .endorse(ctx, proposal, &nodes, &AgreeingThreshold::new(nodes.len()))
            .await?;
        log_tx_event!(
            info,
            "client",
            "Contract installed",
            signed.tx_id(),
            contract = %contract,
            peers = nodes.len()
        );
        Ok(contract.clone())
    }

    /// Instantiate an installed contract and wait for the commit.
    ///
    /// `policy` travels in the proposal and governs later invokes on the
    /// ledger side.
    pub async fn instantiate(
        &self,
        ctx: &ClientContext,
        channel: &ChannelId,
        contract: &ContractId,
        policy: Option<&PolicyDescriptor>,
        function: &str,
        args: &[&str],
    ) -> ContractResult<TransactionId> {
        self.deploy(
            ctx,
            OperationKind::Instantiate,
            INSTANTIATE_METHOD,
            channel,
            contract,
            policy,
            function,
            args,
        )
        .await
    }

    /// Switch the channel to another installed version of the contract and
    /// wait for the commit.
    pub async fn upgrade(
        &self,
        ctx: &ClientContext,
        channel: &ChannelId,
        contract: &ContractId,
        policy: Option<&PolicyDescriptor>,
        function: &str,
        args: &[&str],
    ) -> ContractResult<TransactionId> {
        self.deploy(
            ctx,
            OperationKind::Upgrade,
            UPGRADE_METHOD,
            channel,
            contract,
            policy,
            function,
            args,
        )
        .await
    }

    /// Endorse and submit a transaction without waiting for its commit.
    ///
    /// The endorsements must come from the requested contract and carry a
    /// read/write set, otherwise nothing is submitted.
    pub async fn invoke_async(
        &self,
        ctx: &ClientContext,
        channel: &ChannelId,
        contract: &ContractId,
        function: &str,
        args: &[&str],
        transient: BTreeMap<String, Vec<u8>>,
    ) -> ContractResult<CommitFuture> {
        let nodes = peers(ctx, channel, PeerRole::EndorsingPeer)?;
        let proposal = Proposal::builder(OperationKind::Invoke, channel.clone(), contract.clone())
            .function(function)
            .args(args.iter().copied())
            .transient_entry(METHOD_KEY, TRANSACTION_METHOD.as_bytes().to_vec())
            .transient(transient)
            .wait_time(ctx.timeouts().proposal_wait())
            .build()?;

        let policy = ctx
            .policies()
            .policy_for(contract)
            .unwrap_or_else(|| every_peer(nodes.len()));
        let (signed, decision) = self.endorse(ctx, proposal, &nodes, policy.as_ref()).await?;
        check_endorsed_execution(&signed, &decision, contract)?;

        self.submit(ctx, &signed, &decision)
    }

    /// Endorse, submit and wait for the commit.
    pub async fn invoke(
        &self,
        ctx: &ClientContext,
        channel: &ChannelId,
        contract: &ContractId,
        function: &str,
        args: &[&str],
        transient: BTreeMap<String, Vec<u8>>,
    ) -> ContractResult<TransactionId> {
        let future = self
            .invoke_async(ctx, channel, contract, function, args, transient)
            .await?;
        Self::wait_for_commit(future).await
    }

    /// Evaluate a read-only function. Every query peer must answer with the
    /// same payload, which is returned. Nothing is ordered.
    pub async fn query(
        &self,
        ctx: &ClientContext,
        channel: &ChannelId,
        contract: &ContractId,
        function: &str,
        args: &[&str],
    ) -> ContractResult<Vec<u8>> {
        let nodes = peers(ctx, channel, PeerRole::ChaincodeQuery)?;
        let proposal = Proposal::builder(OperationKind::Query, channel.clone(), contract.clone())
            .function(function)
            .args(args.iter().copied())
            .wait_time(ctx.timeouts().proposal_wait())
            .build()?;

        let (signed, decision) = self
            .endorse(ctx, proposal, &nodes, &AgreeingThreshold::new(nodes.len()))
            .await?;
        let payload = decision
            .accepted()
            .map(|set| set.payload().to_vec())
            .ok_or_else(|| ContractError::UnexpectedResponse {
                tx_id: signed.tx_id().clone(),
                reason: "satisfied query carries no result".into(),
            })?;
        Ok(payload)
    }

    /// Wait for `future` to resolve and map the outcome.
    ///
    /// # Errors
    ///
    /// `Submission(Invalid)` when the ledger rejected the transaction,
    /// `Submission(TimedOut)` when its final state is unknown.
    pub async fn wait_for_commit(mut future: CommitFuture) -> ContractResult<TransactionId> {
        let state = future.wait().await;
        metrics::record_commit(&state);

        let tx_id = future.tx_id().clone();
        let block_number = future.into_result().await?;
        log_tx_event!(info, "client", "Transaction committed", tx_id, block = block_number);
        Ok(tx_id)
    }

    #[allow(clippy::too_many_arguments)]
    async fn deploy(
        &self,
        ctx: &ClientContext,
        kind: OperationKind,
        method: &str,
        channel: &ChannelId,
        contract: &ContractId,
        policy: Option<&PolicyDescriptor>,
        function: &str,
        args: &[&str],
    ) -> ContractResult<TransactionId> {
        let nodes = peers(ctx, channel, PeerRole::EndorsingPeer)?;
        let mut builder = Proposal::builder(kind, channel.clone(), contract.clone())
            .function(function)
            .args(args.iter().copied())
            .transient_entry(METHOD_KEY, method.as_bytes().to_vec())
            .wait_time(ctx.timeouts().proposal_wait());
        if let Some(policy) = policy {
            builder = builder.endorsement_policy(policy.to_bytes());
        }

        let (signed, decision) = self
            .endorse(ctx, builder.build()?, &nodes, &AgreeingThreshold::new(nodes.len()))
            .await?;
        let future = self.submit(ctx, &signed, &decision)?;
        let tx_id = Self::wait_for_commit(future).await?;

        info!(
            tx_id = %tx_id,
            contract = %contract,
            kind = %kind,
            channel = %channel,
            "Contract deployed"
        );
        Ok(tx_id)
    }

    /// Sign, fan out and decide. A decision that is not satisfied becomes
    /// the matching endorsement error.
    async fn endorse(
        &self,
        ctx: &ClientContext,
        proposal: Proposal,
        nodes: &[NodeEndpoint],
        policy: &dyn EndorsementPolicy,
    ) -> ContractResult<(SignedProposal, EndorsementDecision)> {
        let signed = SignedProposal::sign(proposal, ctx.identity().as_ref())?;

        let started = Instant::now();
        let collected = self
            .collector
            .collect(&signed, nodes, signed.proposal().wait_time())
            .await;
        metrics::record_endorsement_round(
            collected.queried(),
            collected.failure_count(),
            started.elapsed().as_secs_f64(),
        );

        let decision = self.evaluator.evaluate(&collected, policy);
        metrics::record_decision(decision.reason());

        if let Some(error) = decision.error() {
            log_tx_event!(
                warn,
                "client",
                "Endorsement rejected",
                signed.tx_id(),
                kind = %signed.proposal().kind(),
                reason = %decision.reason()
            );
            return Err(error.into());
        }
        Ok((signed, decision))
    }

    fn submit(
        &self,
        ctx: &ClientContext,
        signed: &SignedProposal,
        decision: &EndorsementDecision,
    ) -> ContractResult<CommitFuture> {
        let orderers = ctx.directory().orderers(signed.proposal().channel());
        let submitter = TransactionSubmitter::new(
            Arc::clone(&self.orderer),
            Arc::clone(&self.waiter),
            Arc::clone(ctx.identity()),
        );
        Ok(submitter.submit(decision, signed, &orderers, ctx.timeouts().commit_wait())?)
    }
}

fn peers(
    ctx: &ClientContext,
    channel: &ChannelId,
    role: PeerRole,
) -> ContractResult<Vec<NodeEndpoint>> {
    let nodes = ctx.directory().peers(channel, role);
    if nodes.is_empty() {
        return Err(ContractError::NoPeers {
            channel: channel.to_string(),
            role,
        });
    }
    Ok(nodes)
}

fn every_peer(nodes: usize) -> Arc<dyn EndorsementPolicy> {
    Arc::new(AgreeingThreshold::new(nodes))
}

fn check_endorsed_execution(
    signed: &SignedProposal,
    decision: &EndorsementDecision,
    contract: &ContractId,
) -> ContractResult<()> {
    let unexpected = |reason: String| ContractError::UnexpectedResponse {
        tx_id: signed.tx_id().clone(),
        reason,
    };

    let accepted = decision
        .accepted()
        .ok_or_else(|| unexpected("satisfied decision carries no endorsements".into()))?;

    if let Some(other) = accepted.responses().iter().find(|r| r.contract != *contract) {
        return Err(unexpected(format!(
            "{} executed {} instead of {}",
            other.origin, other.contract, contract
        )));
    }
    if accepted.rw_set_digest().is_empty() {
        return Err(unexpected("endorsement has an empty read/write set".into()));
    }
    Ok(())
}
