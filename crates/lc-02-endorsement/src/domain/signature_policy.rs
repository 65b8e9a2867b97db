//! # Signature Policies
//!
//! Declarative policies in the network's YAML descriptor format:
//!
//! ```yaml
//! identities:
//!   - user1: { role: { name: member, mspId: Org1MSP } }
//!   - user2: { role: { name: member, mspId: Org2MSP } }
//! policy:
//!   1-of:
//!     - signed-by: user1
//!     - signed-by: user2
//! ```
//!
//! A `signed-by` rule is met by any verified endorsement from the principal's
//! organisation. Roles are carried for the descriptor round trip but the
//! endorsement itself does not say which role signed, so only the MSP id is
//! matched. One endorsement may satisfy several `signed-by` rules.

use crate::domain::consistency::ConsistencySet;
use crate::domain::policy::EndorsementPolicy;
use crate::error::{EndorsementError, EndorsementResult};
use serde::Deserialize;
use serde_yaml::Value;
use shared_types::MspId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Above this many organisations `minimum_endorsers` stops searching.
const MAX_EXACT_ORGS: usize = 12;

/// Role named in a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalRole {
    Member,
    Admin,
    Peer,
    Client,
}

impl PrincipalRole {
    fn parse(name: &str) -> EndorsementResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "peer" => Ok(Self::Peer),
            "client" => Ok(Self::Client),
            other => Err(EndorsementError::InvalidPolicy {
                reason: format!("unknown role '{other}'"),
            }),
        }
    }
}

/// An organisation + role a signature must come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub msp_id: MspId,
    pub role: PrincipalRole,
}

/// Boolean combination of principals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignaturePolicy {
    SignedBy(Principal),
    NOutOf { n: usize, rules: Vec<SignaturePolicy> },
}

impl SignaturePolicy {
    /// Parse a YAML descriptor.
    pub fn from_yaml(source: &str) -> EndorsementResult<Self> {
        let doc: PolicyDocument =
            serde_yaml::from_str(source).map_err(|e| EndorsementError::InvalidPolicy {
                reason: e.to_string(),
            })?;

        let mut identities = BTreeMap::new();
        for entry in doc.identities {
            for (name, spec) in entry {
                let principal = Principal {
                    msp_id: MspId::new(spec.role.msp_id),
                    role: PrincipalRole::parse(&spec.role.name)?,
                };
                if identities.insert(name.clone(), principal).is_some() {
                    return Err(EndorsementError::InvalidPolicy {
                        reason: format!("identity '{name}' defined twice"),
                    });
                }
            }
        }

        Self::parse_rule(&doc.policy, &identities)
    }

    fn parse_rule(
        value: &Value,
        identities: &BTreeMap<String, Principal>,
    ) -> EndorsementResult<Self> {
        let invalid = |reason: String| EndorsementError::InvalidPolicy { reason };

        let mapping = value
            .as_mapping()
            .ok_or_else(|| invalid("policy rule must be a mapping".into()))?;
        if mapping.len() != 1 {
            return Err(invalid(format!(
                "policy rule must have exactly one key, found {}",
                mapping.len()
            )));
        }
        let Some((key, body)) = mapping.iter().next() else {
            return Err(invalid("empty policy rule".into()));
        };
        let key = key
            .as_str()
            .ok_or_else(|| invalid("policy rule key must be a string".into()))?;

        if key == "signed-by" {
            let name = body
                .as_str()
                .ok_or_else(|| invalid("signed-by expects an identity name".into()))?;
            let principal = identities
                .get(name)
                .cloned()
                .ok_or_else(|| invalid(format!("unknown identity '{name}'")))?;
            return Ok(Self::SignedBy(principal));
        }

        let n = key
            .strip_suffix("-of")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| invalid(format!("unknown policy rule '{key}'")))?;
        let children = body
            .as_sequence()
            .ok_or_else(|| invalid(format!("'{key}' expects a list of rules")))?;
        if n == 0 || n > children.len() {
            return Err(invalid(format!(
                "'{key}' cannot be met by {} rules",
                children.len()
            )));
        }

        let rules = children
            .iter()
            .map(|child| Self::parse_rule(child, identities))
            .collect::<EndorsementResult<Vec<_>>>()?;
        Ok(Self::NOutOf { n, rules })
    }

    fn evaluate(&self, organizations: &BTreeSet<MspId>) -> bool {
        match self {
            Self::SignedBy(p) => organizations.contains(&p.msp_id),
            Self::NOutOf { n, rules } => {
                rules.iter().filter(|r| r.evaluate(organizations)).count() >= *n
            }
        }
    }

    /// Organisations mentioned anywhere in the policy.
    pub fn organizations(&self) -> BTreeSet<MspId> {
        match self {
            Self::SignedBy(p) => BTreeSet::from([p.msp_id.clone()]),
            Self::NOutOf { rules, .. } => rules.iter().flat_map(Self::organizations).collect(),
        }
    }
}

impl fmt::Display for SignaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedBy(p) => write!(f, "{}", p.msp_id),
            Self::NOutOf { n, rules } => {
                write!(f, "{n}-of(")?;
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{rule}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl EndorsementPolicy for SignaturePolicy {
    fn is_satisfied_by(&self, set: &ConsistencySet) -> bool {
        self.evaluate(&set.organizations())
    }

    /// Smallest number of distinct organisations that satisfies the policy,
    /// found by trying organisation subsets in full. Large policies fall back
    /// to 1.
    fn minimum_endorsers(&self) -> usize {
        let orgs: Vec<MspId> = self.organizations().into_iter().collect();
        if orgs.len() > MAX_EXACT_ORGS {
            return 1;
        }

        (1u32..(1u32 << orgs.len()))
            .filter(|mask| {
                let chosen: BTreeSet<MspId> = orgs
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, org)| org.clone())
                    .collect();
                self.evaluate(&chosen)
            })
            .map(|mask| mask.count_ones() as usize)
            .min()
            .unwrap_or(1)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// A parsed policy together with its source text, which is what goes on the
/// wire in instantiate and upgrade proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDescriptor {
    source: String,
    policy: SignaturePolicy,
}

impl PolicyDescriptor {
    pub fn parse(source: impl Into<String>) -> EndorsementResult<Self> {
        let source = source.into();
        let policy = SignaturePolicy::from_yaml(&source)?;
        Ok(Self { source, policy })
    }

    pub fn load(path: impl AsRef<Path>) -> EndorsementResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| EndorsementError::PolicyIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(source)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn policy(&self) -> &SignaturePolicy {
        &self.policy
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.source.as_bytes().to_vec()
    }
}

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    identities: Vec<BTreeMap<String, IdentitySpec>>,
    policy: Value,
}

#[derive(Debug, Deserialize)]
struct IdentitySpec {
    role: RoleSpec,
}

#[derive(Debug, Deserialize)]
struct RoleSpec {
    name: String,
    #[serde(rename = "mspId")]
    msp_id: String,
}
