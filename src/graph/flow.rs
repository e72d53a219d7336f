use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::graph::adjacencies::{Adjacencies, CapacityMap};
use crate::graph::augmenting_path::augmenting_path;
use crate::graph::extract_transfers::extract_transfers;
use crate::graph::{FlowError, Node};
use crate::types::edge::EdgeDB;
use crate::types::{Address, Edge, Int};

/// The flow engine: computes maximum flows and transfer plans, keeping the
/// adjacency map cached between calls.
///
/// The engine is single-threaded and does no I/O. Callers sharing one
/// engine across threads serialise access themselves; the cache rebuilds
/// whenever the edge set's fingerprint changes, so a stale cache needs a
/// mutation the fingerprint cannot see before `invalidate` is required.
#[derive(Default)]
pub struct FlowEngine {
    adjacencies: Adjacencies,
}

impl FlowEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.adjacencies.invalidate();
    }

    /// Computes the maximum flow from `source` to `sink`, capped at
    /// `requested`, and an ordered transfer sequence realising it.
    ///
    /// Augmenting paths are searched breadth-first over the residual
    /// capacities, widest first. Each found path is saturated, truncated
    /// to the remaining request, and the net flow over real edges is
    /// recorded in the used-edges map, which the extractor drains into
    /// transfers afterwards.
    pub fn compute_flow(
        &mut self,
        source: &Address,
        sink: &Address,
        edges: &EdgeDB,
        requested: Int,
    ) -> Result<(Int, Vec<Edge>), FlowError> {
        let adjacencies = self.adjacencies.build(edges);
        let mut capacities = adjacencies.clone();
        let mut used_edges: CapacityMap = BTreeMap::new();

        let mut flow = Int::zero();
        while flow < requested {
            let (mut new_flow, parents) = augmenting_path(source, sink, &capacities);
            if new_flow.is_zero() {
                break;
            }
            if flow.clone() + new_flow.clone() > requested {
                new_flow = requested.clone() - flow.clone();
            }
            flow += new_flow.clone();
            debug!(%new_flow, %flow, "augmenting path saturated");
            for window in parents.windows(2) {
                let [node, prev] = window else {
                    unreachable!()
                };
                *capacities
                    .entry(prev.clone())
                    .or_default()
                    .entry(node.clone())
                    .or_default() -= new_flow.clone();
                *capacities
                    .entry(node.clone())
                    .or_default()
                    .entry(prev.clone())
                    .or_default() += new_flow.clone();
                if is_real_edge(adjacencies, node, prev) {
                    // Travelling against a real edge cancels flow pushed
                    // over it earlier.
                    *used_edges
                        .entry(node.clone())
                        .or_default()
                        .entry(prev.clone())
                        .or_default() -= new_flow.clone();
                } else {
                    *used_edges
                        .entry(prev.clone())
                        .or_default()
                        .entry(node.clone())
                        .or_default() += new_flow.clone();
                }
            }
        }

        used_edges.retain(|_, outgoing| {
            outgoing.retain(|_, capacity| !capacity.is_zero());
            !outgoing.is_empty()
        });

        info!(%flow, "max flow computed");
        let transfers = if flow.is_zero() {
            vec![]
        } else {
            extract_transfers(source, sink, &flow, &requested, used_edges)?
        };
        info!(transfer_count = transfers.len(), "transfer plan extracted");
        Ok((flow, transfers))
    }
}

/// Computes a flow with a fresh engine. Callers that recompute over the
/// same edge set should hold a [`FlowEngine`] instead to reuse its cache.
pub fn compute_flow(
    source: &Address,
    sink: &Address,
    edges: &EdgeDB,
    requested: Int,
) -> Result<(Int, Vec<Edge>), FlowError> {
    FlowEngine::new().compute_flow(source, sink, edges, requested)
}

fn is_real_edge(adjacencies: &CapacityMap, from: &Node, to: &Node) -> bool {
    adjacencies
        .get(from)
        .and_then(|outgoing| outgoing.get(to))
        .map_or(false, |capacity| !capacity.is_zero())
}
