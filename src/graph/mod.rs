use thiserror::Error;

use crate::types::{Address, Int};

pub mod adjacencies;
mod augmenting_path;
mod extract_transfers;
mod flow;
#[cfg(test)]
mod test;

pub use adjacencies::Adjacencies;
pub use flow::{compute_flow, FlowEngine};

/// A vertex of the single-capacity flow graph: a participant, or the
/// pseudo-node `(holder, token)` standing for the holder's spendable pool
/// of one token.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Node {
    Participant(Address),
    Pool(Address, Address),
}

impl Node {
    pub fn participant(&self) -> &Address {
        if let Node::Participant(address) = self {
            address
        } else {
            panic!("not a participant node")
        }
    }

    pub fn pool(&self) -> (&Address, &Address) {
        if let Node::Pool(holder, token) = self {
            (holder, token)
        } else {
            panic!("not a pool node")
        }
    }
}

/// Failures surfaced by the flow engine.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum FlowError {
    /// The used-edges map was not conservative: a wave fired no transfer
    /// while value was still parked somewhere other than the sink.
    #[error(
        "inconsistent flow from {flow_source} to {sink} (requested {requested}): \
         {stranded} units stranded"
    )]
    InconsistentFlow {
        flow_source: Address,
        sink: Address,
        requested: Int,
        stranded: Int,
    },
}
