//! Local signing identity
//!
//! Signs with HMAC-SHA256 over a pre-shared key. Networks that need X.509
//! signatures plug in their own [`IdentityProvider`].

use crate::config::IdentityConfig;
use crate::error::{ConfigError, ConfigResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared_types::{IdentityProvider, MspId, SigningIdentity};
use std::fmt;
use std::path::Path;

type HmacSha256 = Hmac<Sha256>;

/// Identity whose key material is held in process.
#[derive(Clone)]
pub struct LocalIdentity {
    identity: SigningIdentity,
    mac: HmacSha256,
}

impl LocalIdentity {
    /// # Errors
    ///
    /// `MissingSigningKey` for an empty key.
    pub fn new(
        msp_id: impl Into<String>,
        name: impl Into<String>,
        certificate: Vec<u8>,
        key: &[u8],
    ) -> ConfigResult<Self> {
        if key.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|_| ConfigError::MissingSigningKey)?;
        let msp_id = MspId::new(msp_id);
        let name = name.into();
        let certificate = if certificate.is_empty() {
            format!("{msp_id}/{name}").into_bytes()
        } else {
            certificate
        };

        Ok(Self {
            identity: SigningIdentity {
                msp_id,
                name,
                certificate,
            },
            mac,
        })
    }

    /// Build from the `[identity]` section. A key file wins over an inline
    /// secret.
    pub fn from_config(config: &IdentityConfig) -> ConfigResult<Self> {
        let key = match (&config.signing_key_file, &config.signing_secret) {
            (Some(path), _) => read(path)?,
            (None, Some(secret)) => secret.as_bytes().to_vec(),
            (None, None) => return Err(ConfigError::MissingSigningKey),
        };
        let certificate = match &config.certificate_file {
            Some(path) => read(path)?,
            None => Vec::new(),
        };
        Self::new(&config.msp_id, &config.name, certificate, &key)
    }

    /// Check a signature produced by [`IdentityProvider::sign`].
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }
}

fn read(path: &Path) -> ConfigResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl IdentityProvider for LocalIdentity {
    fn identity(&self) -> SigningIdentity {
        self.identity.clone()
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for LocalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalIdentity")
            .field("msp_id", &self.identity.msp_id)
            .field("name", &self.identity.name)
            .finish_non_exhaustive()
    }
}
