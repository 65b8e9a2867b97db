//! Proposal model
//!
//! A `Proposal` is built once per logical operation and never mutated
//! afterwards. Signing wraps it into a `SignedProposal` that carries the
//! transaction id every peer response must echo.

use crate::error::{ProposalError, ProposalResult};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use shared_types::{ChannelId, ContractId, IdentityProvider, SigningIdentity, TransactionId};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default proposal wait budget.
pub const DEFAULT_PROPOSAL_WAIT: Duration = Duration::from_secs(20);

/// Nonce length used for transaction id derivation.
pub const NONCE_LEN: usize = 24;

/// What the proposal asks the peers to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Install,
    Instantiate,
    Upgrade,
    Invoke,
    Query,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Instantiate => "instantiate",
            Self::Upgrade => "upgrade",
            Self::Invoke => "invoke",
            Self::Query => "query",
        }
    }

    /// Operations whose endorsed result is submitted for ordering.
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Instantiate | Self::Upgrade | Self::Invoke)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical contract operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    kind: OperationKind,
    channel: ChannelId,
    contract: ContractId,
    function: String,
    args: Vec<Vec<u8>>,
    transient: BTreeMap<String, Vec<u8>>,
    wait_time: Duration,
    /// Contract package bytes (install only).
    package: Option<Vec<u8>>,
    /// Endorsement policy descriptor (instantiate / upgrade only).
    endorsement_policy: Option<Vec<u8>>,
}

impl Proposal {
    pub fn builder(kind: OperationKind, channel: ChannelId, contract: ContractId) -> ProposalBuilder {
        ProposalBuilder::new(kind, channel, contract)
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Argument `index` as UTF-8, if present and valid.
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .and_then(|a| std::str::from_utf8(a).ok())
    }

    /// Transient data is passed to the contract but never written to the
    /// ledger.
    pub fn transient(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.transient
    }

    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    pub fn package(&self) -> Option<&[u8]> {
        self.package.as_deref()
    }

    pub fn endorsement_policy(&self) -> Option<&[u8]> {
        self.endorsement_policy.as_deref()
    }
}

/// Builder for [`Proposal`].
#[derive(Debug, Clone)]
pub struct ProposalBuilder {
    kind: OperationKind,
    channel: ChannelId,
    contract: ContractId,
    function: String,
    args: Vec<Vec<u8>>,
    transient: BTreeMap<String, Vec<u8>>,
    wait_time: Duration,
    package: Option<Vec<u8>>,
    endorsement_policy: Option<Vec<u8>>,
}

impl ProposalBuilder {
    fn new(kind: OperationKind, channel: ChannelId, contract: ContractId) -> Self {
        Self {
            kind,
            channel,
            contract,
            function: String::new(),
            args: Vec::new(),
            transient: BTreeMap::new(),
            wait_time: DEFAULT_PROPOSAL_WAIT,
            package: None,
            endorsement_policy: None,
        }
    }

    #[must_use]
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    /// Append string arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().as_bytes().to_vec()));
        self
    }

    /// Append one raw argument.
    #[must_use]
    pub fn arg_bytes(mut self, arg: Vec<u8>) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn transient_entry(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.transient.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn transient(mut self, map: BTreeMap<String, Vec<u8>>) -> Self {
        self.transient.extend(map);
        self
    }

    #[must_use]
    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    #[must_use]
    pub fn package(mut self, package: Vec<u8>) -> Self {
        self.package = Some(package);
        self
    }

    #[must_use]
    pub fn endorsement_policy(mut self, descriptor: Vec<u8>) -> Self {
        self.endorsement_policy = Some(descriptor);
        self
    }

    /// Validate and freeze the proposal.
    pub fn build(self) -> ProposalResult<Proposal> {
        let kind = self.kind.as_str();

        if self.contract.name.is_empty() {
            return Err(ProposalError::InvalidContract {
                reason: "empty name".into(),
            });
        }
        if self.contract.version.is_empty() {
            return Err(ProposalError::InvalidContract {
                reason: format!("contract {} has empty version", self.contract.name),
            });
        }
        if self.wait_time.is_zero() {
            return Err(ProposalError::ZeroWaitTime);
        }

        match self.kind {
            OperationKind::Install => {
                if self.package.is_none() {
                    return Err(ProposalError::MissingField {
                        kind,
                        field: "package",
                    });
                }
                if self.contract.path.is_empty() {
                    return Err(ProposalError::MissingField { kind, field: "path" });
                }
            }
            OperationKind::Instantiate
            | OperationKind::Upgrade
            | OperationKind::Invoke
            | OperationKind::Query => {
                if self.function.is_empty() {
                    return Err(ProposalError::MissingField {
                        kind,
                        field: "function",
                    });
                }
            }
        }

        Ok(Proposal {
            kind: self.kind,
            channel: self.channel,
            contract: self.contract,
            function: self.function,
            args: self.args,
            transient: self.transient,
            wait_time: self.wait_time,
            package: self.package,
            endorsement_policy: self.endorsement_policy,
        })
    }
}

/// Header bytes that are signed together with the proposal body.
#[derive(Serialize)]
struct SignedHeader<'a> {
    tx_id: &'a TransactionId,
    nonce: &'a [u8],
    creator: &'a SigningIdentity,
    proposal: &'a Proposal,
}

/// A proposal bound to a creator, a nonce and a transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedProposal {
    proposal: Proposal,
    tx_id: TransactionId,
    nonce: Vec<u8>,
    creator: SigningIdentity,
    bytes: Vec<u8>,
    signature: Vec<u8>,
}

impl SignedProposal {
    /// Sign with a fresh random nonce.
    pub fn sign(proposal: Proposal, identity: &dyn IdentityProvider) -> ProposalResult<Self> {
        let mut nonce = vec![0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self::sign_with_nonce(proposal, identity, nonce)
    }

    /// Sign with a caller-provided nonce (deterministic ids in tests).
    pub fn sign_with_nonce(
        proposal: Proposal,
        identity: &dyn IdentityProvider,
        nonce: Vec<u8>,
    ) -> ProposalResult<Self> {
        let creator = identity.identity();
        let tx_id = TransactionId::compute(&nonce, &creator.creator_bytes());

        let header = SignedHeader {
            tx_id: &tx_id,
            nonce: &nonce,
            creator: &creator,
            proposal: &proposal,
        };
        let bytes =
            bincode::serialize(&header).map_err(|e| ProposalError::Encoding(e.to_string()))?;
        let signature = identity.sign(&bytes);

        Ok(Self {
            proposal,
            tx_id,
            nonce,
            creator,
            bytes,
            signature,
        })
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    pub fn tx_id(&self) -> &TransactionId {
        &self.tx_id
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn creator(&self) -> &SigningIdentity {
        &self.creator
    }

    /// Exact bytes covered by the signature.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Size on the wire.
    pub fn encoded_len(&self) -> usize {
        self.bytes.len() + self.signature.len()
    }
}
