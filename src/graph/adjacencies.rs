use std::collections::BTreeMap;

use tracing::debug;

use crate::graph::Node;
use crate::types::edge::{EdgeDB, Fingerprint};
use crate::types::{Edge, Int};

/// Two-level capacity map `Node -> (Node -> Int)`.
///
/// Ordered maps throughout: iteration order is visible in the output, so a
/// hash-ordered container would break run-to-run determinism.
pub type CapacityMap = BTreeMap<Node, BTreeMap<Node, Int>>;

fn pseudo_node(edge: &Edge) -> Node {
    Node::Pool(edge.from, edge.token)
}

/// Builds the adjacency map from an edge set and keeps it cached, keyed by
/// the edge set's fingerprint. A call with an unchanged edge set is free.
#[derive(Default)]
pub struct Adjacencies {
    cached: Option<(Fingerprint, CapacityMap)>,
}

impl Adjacencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, edges: &EdgeDB) -> &CapacityMap {
        let fingerprint = edges.fingerprint();
        let stale = match &self.cached {
            Some((cached, _)) => *cached != fingerprint,
            None => true,
        };
        if stale {
            debug!(edge_count = edges.edge_count(), "building adjacencies");
            self.cached = Some((fingerprint, build_adjacencies(edges)));
        }
        match &self.cached {
            Some((_, adjacencies)) => adjacencies,
            None => unreachable!(),
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

fn build_adjacencies(edges: &EdgeDB) -> CapacityMap {
    let mut adjacencies = CapacityMap::new();
    for edge in edges.iter() {
        let pool = pseudo_node(edge);
        // One edge from the sender to its pool, as wide as the largest
        // contributing capacity (the sender's balance in that token).
        let gate = adjacencies
            .entry(Node::Participant(edge.from))
            .or_default()
            .entry(pool.clone())
            .or_default();
        if edge.capacity > *gate {
            *gate = edge.capacity.clone();
        }
        // Another edge from the pool to the recipient with the trust
        // capacity. Unique per (from, token, to), so plain insertion.
        adjacencies
            .entry(pool)
            .or_default()
            .insert(Node::Participant(edge.to), edge.capacity.clone());
    }
    adjacencies
}
