//! Fixtures shared by the unit tests of this crate.

use lc_01_proposal::{OperationKind, Proposal, ProposalResponse, ResponseStatus, SignedProposal};
use lc_02_endorsement::{group, EndorsementDecision};
use shared_types::{
    ChannelId, ContractId, Digest, IdentityProvider, MspId, NodeId, SigningIdentity,
};

pub(crate) struct TestIdentity;

impl TestIdentity {
    pub(crate) const SIGNATURE: &'static [u8] = b"client-signature";
}

impl IdentityProvider for TestIdentity {
    fn identity(&self) -> SigningIdentity {
        SigningIdentity {
            msp_id: MspId::new("Org1MSP"),
            name: "User1".into(),
            certificate: b"cert".to_vec(),
        }
    }

    fn sign(&self, _message: &[u8]) -> Vec<u8> {
        Self::SIGNATURE.to_vec()
    }
}

pub(crate) fn signed_proposal() -> SignedProposal {
    let proposal = Proposal::builder(
        OperationKind::Invoke,
        ChannelId::new("mychannel"),
        ContractId::new("example02", "v1", "github.com/example_cc"),
    )
    .function("invoke")
    .args(["a", "b", "10"])
    .build()
    .unwrap();
    SignedProposal::sign(proposal, &TestIdentity).unwrap()
}

/// A satisfied decision over `endorsers` agreeing responses to `proposal`.
pub(crate) fn satisfied_decision(proposal: &SignedProposal, endorsers: usize) -> EndorsementDecision {
    let responses: Vec<ProposalResponse> = (0..endorsers)
        .map(|i| ProposalResponse {
            origin: NodeId::new(format!("peer{i}.org1")),
            organization: MspId::new("Org1MSP"),
            tx_id: proposal.tx_id().clone(),
            status: ResponseStatus::SUCCESS,
            message: String::new(),
            payload: b"ok".to_vec(),
            rw_set_digest: Digest::of(b"a:90,b:210"),
            contract: proposal.proposal().contract().clone(),
            signature: vec![i as u8],
            verified: true,
        })
        .collect();
    EndorsementDecision::accept(group(&responses).remove(0), "test policy".into())
}
