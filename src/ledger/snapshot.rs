use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::ledger::{Ledger, LedgerError};
use crate::types::{Address, Int};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("could not read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Imports a JSON ledger snapshot: signups with their organization flag,
/// balances, and trust declarations.
pub fn import_from_json(file: &Path) -> Result<Ledger, SnapshotError> {
    let contents = read_to_string(file)?;
    parse_json(&contents)
}

pub fn parse_json(contents: &str) -> Result<Ledger, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_str(contents)?;

    let mut ledger = Ledger::new();
    for participant in &snapshot.participants {
        let address = Address::from(participant.id);
        if participant.organization {
            ledger.organization_signup(address);
        } else {
            ledger.signup(address);
        }
    }
    for participant in &snapshot.participants {
        let address = Address::from(participant.id);
        for balance in &participant.balances {
            ledger.set_balance(
                address,
                Address::from(balance.token),
                Int::from(balance.amount),
            )?;
        }
        for trust in &participant.trusts {
            let send_to = Address::from(trust.can_send_to);
            if send_to != address {
                ledger.trust(send_to, address, trust.limit_percentage)?;
            }
        }
    }
    Ok(ledger)
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a> {
    #[allow(dead_code)]
    block_number: &'a str,
    participants: Vec<JsonParticipant<'a>>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
struct JsonParticipant<'a> {
    id: &'a str,
    #[serde(default)]
    organization: bool,
    #[serde(default)]
    balances: Vec<JsonBalance<'a>>,
    #[serde(default)]
    trusts: Vec<JsonTrust<'a>>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
struct JsonBalance<'a> {
    token: &'a str,
    amount: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
struct JsonTrust<'a> {
    can_send_to: &'a str,
    limit_percentage: u8,
}
