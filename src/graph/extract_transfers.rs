use std::collections::BTreeMap;

use tracing::debug;

use crate::graph::adjacencies::CapacityMap;
use crate::graph::{FlowError, Node};
use crate::types::{Address, Edge, Int};

/// Drains the used-edges map into an ordered transfer list.
///
/// Balances start with the whole amount at the source and follow the
/// emitted transfers. The list is built in waves: a chain a->b->c needs
/// a->b to land before b can forward, so each wave emits what the current
/// balances allow and then balances are re-examined.
pub fn extract_transfers(
    source: &Address,
    sink: &Address,
    amount: &Int,
    requested: &Int,
    mut used_edges: CapacityMap,
) -> Result<Vec<Edge>, FlowError> {
    let mut transfers: Vec<Edge> = Vec::new();
    let mut balances: BTreeMap<Address, Int> = BTreeMap::new();
    balances.insert(*source, amount.clone());

    while !balances.is_empty() && (balances.len() > 1 || balances.keys().next() != Some(sink)) {
        let wave = extract_next_transfers(&mut used_edges, &mut balances);
        balances.retain(|_, balance| !balance.is_zero());
        if wave.is_empty() {
            let stranded = balances
                .iter()
                .filter(|(account, _)| *account != sink)
                .fold(Int::zero(), |acc, (_, balance)| acc + balance.clone());
            return Err(FlowError::InconsistentFlow {
                flow_source: *source,
                sink: *sink,
                requested: requested.clone(),
                stranded,
            });
        }
        debug!(wave_size = wave.len(), "extracted transfer wave");
        transfers.extend(wave);
    }

    Ok(transfers)
}

/// One wave: every transfer the current balances can cover, in canonical
/// map order. When an edge cannot fire yet and the wave already holds a
/// transfer, the wave is returned at once so balances are reconsidered
/// before the edge is retried.
fn extract_next_transfers(
    used_edges: &mut CapacityMap,
    balances: &mut BTreeMap<Address, Int>,
) -> Vec<Edge> {
    let mut transfers: Vec<Edge> = Vec::new();

    let accounts: Vec<Address> = balances.keys().cloned().collect();
    for account in &accounts {
        let pools: Vec<Node> = used_edges
            .get(&Node::Participant(*account))
            .map(|outgoing| outgoing.keys().cloned().collect())
            .unwrap_or_default();
        for pool in pools {
            let successors: Vec<(Node, Int)> = used_edges
                .get(&pool)
                .map(|outgoing| {
                    outgoing
                        .iter()
                        .map(|(node, capacity)| (node.clone(), capacity.clone()))
                        .collect()
                })
                .unwrap_or_default();
            for (to_node, capacity) in successors {
                if capacity.is_zero() {
                    continue;
                }
                let balance = balances.get(account).cloned().unwrap_or_default();
                if balance < capacity {
                    // Not enough balance yet; a later transfer tops this
                    // account up before the edge is drained.
                    if !transfers.is_empty() {
                        return transfers;
                    }
                    continue;
                }
                let (from, token) = pool.pool();
                let to = to_node.participant();
                transfers.push(Edge {
                    from: *from,
                    to: *to,
                    token: *token,
                    capacity: capacity.clone(),
                });
                *balances.entry(*account).or_default() -= capacity.clone();
                *balances.entry(*to).or_default() += capacity.clone();
                if let Some(outgoing) = used_edges.get_mut(&pool) {
                    outgoing.insert(to_node.clone(), Int::zero());
                }
            }
        }
    }

    transfers
}
