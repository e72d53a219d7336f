//! Max-flow transfer planning over a trust-token capacity graph.
//!
//! Participants issue personal tokens and declare how much of others'
//! tokens they accept; the resulting directed capacity graph is searched
//! for the maximum transferable value between two participants, and the
//! result is emitted as an ordered sequence of token transfers that never
//! overdraws an intermediary.

pub mod graph;
pub mod io;
pub mod ledger;
pub mod types;
