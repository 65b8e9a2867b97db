//! Two-account transfer contract
//!
//! | Function | Args | Effect |
//! |----------|------|--------|
//! | `init` | `a 100 b 100 ..` | set every named account |
//! | `invoke` / `move` | `a b 10` | move 10 from a to b, emits [`EVENT_NAME`] |
//! | `query` | `b` | return b's balance as a decimal string |

use super::ledger::WorldState;
use shared_types::Digest;
use std::collections::BTreeMap;

/// Contract event emitted by every transfer.
pub const EVENT_NAME: &str = "example2_event_invoke";

/// Result of executing a function against a state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    pub payload: Vec<u8>,
    /// Key -> version observed.
    pub reads: BTreeMap<String, u64>,
    pub writes: BTreeMap<String, i64>,
    /// `(event name, payload)`.
    pub event: Option<(String, Vec<u8>)>,
}

impl Execution {
    /// Digest of the read/write set; empty when nothing was read or written.
    pub fn rw_set_digest(&self) -> Digest {
        if self.reads.is_empty() && self.writes.is_empty() {
            return Digest::empty();
        }
        Digest::of(format!("{:?}|{:?}", self.reads, self.writes).as_bytes())
    }
}

/// Run `function` against `state` without modifying it.
pub fn execute(state: &WorldState, function: &str, args: &[String]) -> Result<Execution, String> {
    match function {
        "init" => init(args),
        "invoke" | "move" => transfer(state, args),
        "query" => query(state, args),
        other => Err(format!(
            "Unknown function '{other}', expecting \"init\", \"invoke\" or \"query\""
        )),
    }
}

fn init(args: &[String]) -> Result<Execution, String> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(format!(
            "Incorrect number of arguments. Expecting name/value pairs, got {}",
            args.len()
        ));
    }

    let mut execution = Execution::default();
    for pair in args.chunks(2) {
        let value = parse_amount(&pair[1])?;
        execution.writes.insert(pair[0].clone(), value);
    }
    Ok(execution)
}

fn transfer(state: &WorldState, args: &[String]) -> Result<Execution, String> {
    let [from, to, amount] = args else {
        return Err(format!(
            "Incorrect number of arguments. Expecting 3, got {}",
            args.len()
        ));
    };
    let amount = parse_amount(amount)?;

    let mut execution = Execution::default();
    let from_balance = read(state, &mut execution, from)?;
    let to_balance = read(state, &mut execution, to)?;

    execution.writes.insert(from.clone(), from_balance - amount);
    execution.writes.insert(to.clone(), to_balance + amount);
    execution.event = Some((
        EVENT_NAME.to_string(),
        format!("{from}->{to}:{amount}").into_bytes(),
    ));
    Ok(execution)
}

fn query(state: &WorldState, args: &[String]) -> Result<Execution, String> {
    let [name] = args else {
        return Err(format!(
            "Incorrect number of arguments. Expecting name of the person to query, got {}",
            args.len()
        ));
    };

    let mut execution = Execution::default();
    let balance = read(state, &mut execution, name)?;
    execution.payload = balance.to_string().into_bytes();
    Ok(execution)
}

fn read(state: &WorldState, execution: &mut Execution, key: &str) -> Result<i64, String> {
    let (value, version) = state
        .get(key)
        .ok_or_else(|| format!("Nil amount for {key}"))?;
    execution.reads.insert(key.to_string(), version);
    Ok(value)
}

fn parse_amount(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("Expecting integer value, got '{raw}'"))
}
