//! Transaction envelopes
//!
//! An envelope can only be built from a satisfied decision, and only from
//! endorsements for the same transaction id as the proposal.

use crate::error::{SubmissionError, SubmissionResult};
use lc_01_proposal::{ProposalResponse, SignedProposal};
use lc_02_endorsement::{ConsistencySet, EndorsementDecision};
use serde::Serialize;
use shared_types::{ChannelId, ContractId, IdentityProvider, NodeId, TransactionId};

/// One endorser's signature carried in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endorsement {
    pub endorser: NodeId,
    pub signature: Vec<u8>,
}

#[derive(Serialize)]
struct EnvelopePayload<'a> {
    tx_id: &'a TransactionId,
    channel: &'a ChannelId,
    contract: &'a ContractId,
    proposal: &'a [u8],
    proposal_signature: &'a [u8],
    result: &'a [u8],
    endorsements: &'a [Endorsement],
}

/// Signed transaction handed to the ordering service. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    tx_id: TransactionId,
    channel: ChannelId,
    contract: ContractId,
    accepted: ConsistencySet,
    endorsements: Vec<Endorsement>,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl TransactionEnvelope {
    /// Build and sign the envelope for `proposal` from `decision`.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` if the decision is not satisfied or its
    /// endorsements belong to a different transaction.
    pub fn from_decision(
        decision: &EndorsementDecision,
        proposal: &SignedProposal,
        identity: &dyn IdentityProvider,
    ) -> SubmissionResult<Self> {
        if !decision.is_satisfied() {
            return Err(SubmissionError::PreconditionFailed {
                reason: format!("decision not satisfied: {}", decision.reason()),
            });
        }
        let accepted = decision
            .accepted()
            .cloned()
            .ok_or_else(|| SubmissionError::PreconditionFailed {
                reason: "satisfied decision carries no consistency set".into(),
            })?;

        let tx_id = proposal.tx_id().clone();
        if let Some(stray) = accepted.responses().iter().find(|r| r.tx_id != tx_id) {
            return Err(SubmissionError::PreconditionFailed {
                reason: format!(
                    "endorsement from {} is for tx {}, expected {}",
                    stray.origin, stray.tx_id, tx_id
                ),
            });
        }

        let endorsements: Vec<Endorsement> = accepted
            .verified()
            .map(|r: &ProposalResponse| Endorsement {
                endorser: r.origin.clone(),
                signature: r.signature.clone(),
            })
            .collect();

        let channel = proposal.proposal().channel().clone();
        let contract = proposal.proposal().contract().clone();
        let payload = bincode::serialize(&EnvelopePayload {
            tx_id: &tx_id,
            channel: &channel,
            contract: &contract,
            proposal: proposal.bytes(),
            proposal_signature: proposal.signature(),
            result: accepted.payload(),
            endorsements: &endorsements,
        })
        .map_err(|e| SubmissionError::Encoding(e.to_string()))?;
        let signature = identity.sign(&payload);

        Ok(Self {
            tx_id,
            channel,
            contract,
            accepted,
            endorsements,
            payload,
            signature,
        })
    }

    pub fn tx_id(&self) -> &TransactionId {
        &self.tx_id
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    pub fn accepted(&self) -> &ConsistencySet {
        &self.accepted
    }

    pub fn endorsements(&self) -> &[Endorsement] {
        &self.endorsements
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn encoded_len(&self) -> usize {
        self.payload.len() + self.signature.len()
    }
}
