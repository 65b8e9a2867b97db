//! Driven ports (Outbound dependencies)

use crate::domain::policy::EndorsementPolicy;
use shared_types::ContractId;
use std::sync::Arc;

/// Supplies the endorsement policy for a contract.
///
/// Loaded externally (descriptor files, configuration) and only read here.
pub trait PolicyStore: Send + Sync {
    /// `None` when no policy is registered; callers then require every
    /// queried endorser to agree.
    fn policy_for(&self, contract: &ContractId) -> Option<Arc<dyn EndorsementPolicy>>;
}
