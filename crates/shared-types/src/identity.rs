//! # Identity Provider Port
//!
//! Supplies the signing identity used for proposals and envelopes. Enrollment
//! and credential storage live outside the pipeline.

use crate::entities::MspId;
use serde::{Deserialize, Serialize};

/// Public half of the signing identity, embedded in proposals as the creator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigningIdentity {
    pub msp_id: MspId,
    pub name: String,
    /// PEM certificate (or any opaque credential the network accepts).
    pub certificate: Vec<u8>,
}

impl SigningIdentity {
    /// Serialized creator bytes, as fed into transaction id derivation.
    pub fn creator_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.msp_id.0.len() + self.certificate.len());
        bytes.extend_from_slice(self.msp_id.0.as_bytes());
        bytes.extend_from_slice(&self.certificate);
        bytes
    }
}

/// Signs on behalf of the current user.
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> SigningIdentity;

    fn sign(&self, message: &[u8]) -> Vec<u8>;
}
