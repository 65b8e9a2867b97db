//! Simulated endorsing peer

use super::ledger::Ledger;
use super::PeerFault;
use crate::identity::LocalIdentity;
use lc_01_proposal::{OperationKind, ProposalResponse, ResponseStatus, SignedProposal};
use parking_lot::Mutex;
use shared_types::{ContractId, Digest, IdentityProvider, NodeEndpoint};
use std::collections::BTreeSet;

pub(crate) struct SimulatedPeer {
    pub endpoint: NodeEndpoint,
    identity: LocalIdentity,
    installed: Mutex<BTreeSet<ContractId>>,
    pub fault: Mutex<Option<PeerFault>>,
}

impl SimulatedPeer {
    pub fn new(endpoint: NodeEndpoint, identity: LocalIdentity) -> Self {
        Self {
            endpoint,
            identity,
            installed: Mutex::new(BTreeSet::new()),
            fault: Mutex::new(None),
        }
    }

    pub fn installed(&self) -> BTreeSet<ContractId> {
        self.installed.lock().clone()
    }

    /// Execute `signed` and return a signed response. Contract failures come
    /// back as error statuses, never as `Err`.
    pub fn endorse(
        &self,
        ledger: &Ledger,
        signed: &SignedProposal,
        fault: Option<PeerFault>,
    ) -> ProposalResponse {
        let proposal = signed.proposal();
        let mut response = ProposalResponse {
            origin: self.endpoint.id.clone(),
            organization: self.endpoint.msp_id.clone(),
            tx_id: signed.tx_id().clone(),
            status: ResponseStatus::SUCCESS,
            message: "OK".to_string(),
            payload: Vec::new(),
            rw_set_digest: Digest::empty(),
            contract: proposal.contract().clone(),
            signature: Vec::new(),
            verified: false,
        };

        if proposal.kind() == OperationKind::Install {
            if !self.installed.lock().insert(proposal.contract().clone()) {
                fail(
                    &mut response,
                    format!("contract {} already installed", proposal.contract()),
                );
            }
        } else {
            let installed = self.installed();
            match ledger.simulate(proposal, &installed) {
                Ok(simulated) => {
                    if proposal.kind().is_ordered() && fault != Some(PeerFault::Divergent) {
                        ledger.record(signed.tx_id(), proposal.kind(), &simulated);
                    }
                    response.payload = simulated.execution.payload.clone();
                    response.rw_set_digest = simulated.execution.rw_set_digest();
                    response.contract = simulated.contract;
                }
                Err(message) => fail(&mut response, message),
            }
        }

        match fault {
            Some(PeerFault::Divergent) => {
                let name = self.endpoint.id.as_str().as_bytes();
                response.payload.extend_from_slice(name);
                response.rw_set_digest =
                    Digest::of_parts([response.rw_set_digest.0.as_slice(), name]);
            }
            Some(PeerFault::ErrorStatus) => {
                fail(&mut response, "simulated endorsement failure".to_string())
            }
            _ => {}
        }

        response.signature = self.identity.sign(&signed_bytes(&response));
        if fault == Some(PeerFault::BadSignature) {
            response.signature = vec![0u8; response.signature.len()];
        }
        response
    }

    pub fn verify(&self, response: &ProposalResponse) -> bool {
        self.identity
            .verify(&signed_bytes(response), &response.signature)
    }
}

fn fail(response: &mut ProposalResponse, message: String) {
    response.status = ResponseStatus::INTERNAL_ERROR;
    response.message = message;
    response.payload.clear();
    response.rw_set_digest = Digest::empty();
}

/// The parts of a response the endorser signs.
fn signed_bytes(response: &ProposalResponse) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(response.tx_id.as_str().as_bytes());
    bytes.extend_from_slice(&response.status.0.to_be_bytes());
    bytes.extend_from_slice(&response.rw_set_digest.0);
    bytes.extend_from_slice(&response.payload);
    bytes
}
