mod db;
mod snapshot;

pub use db::{Ledger, LedgerError, Participant};
pub use snapshot::{import_from_json, parse_json, SnapshotError};
