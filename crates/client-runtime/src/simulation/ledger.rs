//! Channel ledger shared by the simulated peers and orderer
//!
//! Peers simulate against the committed state and park the resulting
//! execution under the transaction id. The orderer later cuts a one
//! transaction block: it re-checks every read version (MVCC) and applies the
//! writes only if none changed in between.

use super::example02::{self, Execution};
use lc_01_proposal::{OperationKind, Proposal};
use parking_lot::Mutex;
use shared_types::{ChaincodeEvent, ContractId, TransactionEvent, TransactionId, ValidationCode};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Committed key/value state with the block number that last wrote each key.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    values: BTreeMap<String, (i64, u64)>,
}

impl WorldState {
    /// `(value, version)`.
    pub fn get(&self, key: &str) -> Option<(i64, u64)> {
        self.values.get(key).copied()
    }

    /// Version of `key`, 0 when absent.
    pub fn version(&self, key: &str) -> u64 {
        self.values.get(key).map_or(0, |(_, version)| *version)
    }

    pub fn apply(&mut self, writes: &BTreeMap<String, i64>, block_number: u64) {
        for (key, value) in writes {
            self.values.insert(key.clone(), (*value, block_number));
        }
    }

    /// Whether every read still sees the version it was simulated against.
    pub fn still_valid(&self, reads: &BTreeMap<String, u64>) -> bool {
        reads
            .iter()
            .all(|(key, version)| self.version(key) == *version)
    }
}

/// What a peer's simulation produced.
#[derive(Debug, Clone)]
pub struct Simulated {
    /// Contract that actually ran.
    pub contract: ContractId,
    pub execution: Execution,
}

#[derive(Debug)]
struct PendingTx {
    kind: OperationKind,
    contract: ContractId,
    execution: Execution,
}

#[derive(Debug, Default)]
struct LedgerState {
    world: WorldState,
    /// Next block number; block 0 is the genesis block.
    height: u64,
    instance: Option<ContractId>,
    pending: HashMap<TransactionId, PendingTx>,
    ordered: HashSet<TransactionId>,
}

#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                height: 1,
                ..LedgerState::default()
            }),
        }
    }
}

impl Ledger {
    /// Simulate a non-install proposal for a peer that has `installed`.
    pub fn simulate(
        &self,
        proposal: &Proposal,
        installed: &BTreeSet<ContractId>,
    ) -> Result<Simulated, String> {
        let state = self.state.lock();
        let requested = proposal.contract();
        let args: Vec<String> = proposal
            .args()
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect();

        let contract = match proposal.kind() {
            OperationKind::Install => {
                return Err("install is handled by the peer".to_string());
            }
            OperationKind::Instantiate => {
                if let Some(instance) = &state.instance {
                    return Err(format!("contract {} already instantiated", instance));
                }
                requested.clone()
            }
            OperationKind::Upgrade => match &state.instance {
                Some(instance) if instance.name != requested.name => {
                    return Err(format!("contract {} not instantiated", requested.name));
                }
                Some(instance) if instance.version == requested.version => {
                    return Err(format!("contract {} is already at this version", instance));
                }
                Some(_) => requested.clone(),
                None => return Err(format!("contract {} not instantiated", requested.name)),
            },
            OperationKind::Invoke | OperationKind::Query => match &state.instance {
                Some(instance) if instance.name == requested.name => instance.clone(),
                _ => return Err(format!("contract {} not instantiated", requested.name)),
            },
        };

        if !installed.contains(&contract) {
            return Err(format!("contract {} not installed on this peer", contract));
        }

        let execution = example02::execute(&state.world, proposal.function(), &args)?;
        Ok(Simulated {
            contract,
            execution,
        })
    }

    /// Park an endorsed execution until the orderer sees its envelope. The
    /// first execution recorded for a transaction wins.
    pub fn record(&self, tx_id: &TransactionId, kind: OperationKind, simulated: &Simulated) {
        self.state
            .lock()
            .pending
            .entry(tx_id.clone())
            .or_insert_with(|| PendingTx {
                kind,
                contract: simulated.contract.clone(),
                execution: simulated.execution.clone(),
            });
    }

    /// Validate and commit `tx_id` in a new block.
    ///
    /// `None` for a transaction that was already ordered.
    pub fn commit(&self, tx_id: &TransactionId) -> Option<(u64, TransactionEvent)> {
        let mut state = self.state.lock();
        if !state.ordered.insert(tx_id.clone()) {
            return None;
        }
        let block_number = state.height;
        state.height += 1;

        let Some(pending) = state.pending.remove(tx_id) else {
            return Some((
                block_number,
                transaction_event(tx_id, ValidationCode::InvalidEndorserTransaction, Vec::new()),
            ));
        };

        if !state.world.still_valid(&pending.execution.reads) {
            return Some((
                block_number,
                transaction_event(tx_id, ValidationCode::MvccReadConflict, Vec::new()),
            ));
        }

        state.world.apply(&pending.execution.writes, block_number);
        if matches!(
            pending.kind,
            OperationKind::Instantiate | OperationKind::Upgrade
        ) {
            state.instance = Some(pending.contract.clone());
        }

        let events = pending
            .execution
            .event
            .into_iter()
            .map(|(event_name, payload)| ChaincodeEvent {
                tx_id: tx_id.clone(),
                contract_name: pending.contract.name.clone(),
                event_name,
                payload,
            })
            .collect();
        Some((
            block_number,
            transaction_event(tx_id, ValidationCode::Valid, events),
        ))
    }

    /// Order `tx_id` but mark it invalid with `code`; no state changes.
    pub fn reject(
        &self,
        tx_id: &TransactionId,
        code: ValidationCode,
    ) -> Option<(u64, TransactionEvent)> {
        let mut state = self.state.lock();
        if !state.ordered.insert(tx_id.clone()) {
            return None;
        }
        state.pending.remove(tx_id);
        let block_number = state.height;
        state.height += 1;
        Some((block_number, transaction_event(tx_id, code, Vec::new())))
    }

    /// Drop a parked execution without ordering it.
    pub fn forget(&self, tx_id: &TransactionId) {
        self.state.lock().pending.remove(tx_id);
    }

    pub fn value(&self, key: &str) -> Option<i64> {
        self.state.lock().world.get(key).map(|(value, _)| value)
    }

    pub fn height(&self) -> u64 {
        self.state.lock().height
    }

    pub fn instance(&self) -> Option<ContractId> {
        self.state.lock().instance.clone()
    }
}

fn transaction_event(
    tx_id: &TransactionId,
    validation_code: ValidationCode,
    chaincode_events: Vec<ChaincodeEvent>,
) -> TransactionEvent {
    TransactionEvent {
        tx_id: tx_id.clone(),
        validation_code,
        chaincode_events,
    }
}
