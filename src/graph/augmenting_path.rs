use std::cmp::min;
use std::collections::{BTreeMap, VecDeque};

use crate::graph::adjacencies::CapacityMap;
use crate::graph::Node;
use crate::types::{Address, Int};

/// Breadth-first search for a source-to-sink path of positive residual
/// capacity. Neighbours are visited in descending `(capacity, node)` order,
/// which fixes the discovered path for a given residual state. Returns the
/// bottleneck flow and the path traced sink back to source; zero flow and
/// an empty path when no path exists.
pub fn augmenting_path(
    source: &Address,
    sink: &Address,
    capacities: &CapacityMap,
) -> (Int, Vec<Node>) {
    let source_node = Node::Participant(*source);
    let sink_node = Node::Participant(*sink);
    if *source == *sink || !capacities.contains_key(&source_node) {
        return (Int::zero(), vec![]);
    }
    let mut parent: BTreeMap<Node, Node> = BTreeMap::new();
    let mut queue = VecDeque::<(Node, Int)>::new();
    queue.push_back((source_node.clone(), Int::max_value()));
    while let Some((node, flow)) = queue.pop_front() {
        let Some(outgoing) = capacities.get(&node) else {
            continue;
        };
        for (target, capacity) in sorted_by_capacity(outgoing) {
            if !parent.contains_key(&target) && !capacity.is_zero() {
                parent.insert(target.clone(), node.clone());
                let new_flow = min(flow.clone(), capacity);
                if target == sink_node {
                    return (new_flow, trace(&parent, &source_node, &sink_node));
                }
                queue.push_back((target, new_flow));
            }
        }
    }
    (Int::zero(), vec![])
}

fn sorted_by_capacity(outgoing: &BTreeMap<Node, Int>) -> Vec<(Node, Int)> {
    let mut result: Vec<(Node, Int)> = outgoing
        .iter()
        .map(|(node, capacity)| (node.clone(), capacity.clone()))
        .collect();
    result.sort_unstable_by(|(a_node, a_cap), (b_node, b_cap)| {
        (b_cap, b_node).cmp(&(a_cap, a_node))
    });
    result
}

fn trace(parent: &BTreeMap<Node, Node>, source: &Node, sink: &Node) -> Vec<Node> {
    let mut path = vec![sink.clone()];
    let mut node = sink;
    while node != source {
        node = &parent[node];
        path.push(node.clone());
    }
    path
}
