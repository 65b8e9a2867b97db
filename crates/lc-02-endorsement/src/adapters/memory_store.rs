//! In-memory policy store keyed by contract name

use crate::domain::policy::EndorsementPolicy;
use crate::domain::signature_policy::PolicyDescriptor;
use crate::error::EndorsementResult;
use crate::ports::outbound::PolicyStore;
use parking_lot::RwLock;
use shared_types::ContractId;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Policies by contract name. Every version of a contract shares one policy.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<HashMap<String, Arc<dyn EndorsementPolicy>>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the policy for `contract_name`.
    pub fn insert(&self, contract_name: impl Into<String>, policy: Arc<dyn EndorsementPolicy>) {
        let name = contract_name.into();
        info!(contract = %name, policy = %policy.describe(), "[lc-02] Policy registered");
        self.policies.write().insert(name, policy);
    }

    /// Parse a YAML descriptor file and register it for `contract_name`.
    pub fn load_descriptor(
        &self,
        contract_name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> EndorsementResult<PolicyDescriptor> {
        let descriptor = PolicyDescriptor::load(path)?;
        self.insert(contract_name, Arc::new(descriptor.policy().clone()));
        Ok(descriptor)
    }

    pub fn remove(&self, contract_name: &str) -> bool {
        self.policies.write().remove(contract_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn policy_for(&self, contract: &ContractId) -> Option<Arc<dyn EndorsementPolicy>> {
        self.policies.read().get(&contract.name).cloned()
    }
}
