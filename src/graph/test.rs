use std::collections::BTreeMap;

use crate::graph::extract_transfers::extract_transfers;
use crate::graph::{compute_flow, FlowEngine, FlowError, Node};
use crate::types::edge::EdgeDB;
use crate::types::{Address, Edge, Int};

fn addresses() -> (Address, Address, Address, Address, Address, Address) {
    (
        Address::from("0x11C7e86fF693e9032A0F41711b5581a04b26Be2E"),
        Address::from("0x22cEDde51198D1773590311E2A340DC06B24cB37"),
        Address::from("0x33cEDde51198D1773590311E2A340DC06B24cB37"),
        Address::from("0x447EDde51198D1773590311E2A340DC06B24cB37"),
        Address::from("0x55c16ce62d26fd51582a646e2e30a3267b1e6d7e"),
        Address::from("0x66c16ce62d26fd51582a646e2e30a3267b1e6d7e"),
    )
}

fn edge(from: Address, to: Address, token: Address, capacity: u64) -> Edge {
    Edge {
        from,
        to,
        token,
        capacity: Int::from(capacity),
    }
}

fn build_edges(input: Vec<Edge>) -> EdgeDB {
    EdgeDB::new(input)
}

/// Replays `transfers` in order and checks them against the flow contract:
/// no sender ever overdraws (only the source spends value it never
/// received), every intermediary nets to zero, the sink ends up with
/// exactly `flow`, and no `(from, to, token)` total exceeds the original
/// edge capacity.
fn assert_realisable(
    source: &Address,
    sink: &Address,
    flow: &Int,
    transfers: &[Edge],
    edges: &EdgeDB,
) {
    let mut balances: BTreeMap<Address, Int> = BTreeMap::new();
    balances.insert(*source, flow.clone());
    for transfer in transfers {
        let available = balances.get(&transfer.from).cloned().unwrap_or_default();
        assert!(
            available >= transfer.capacity,
            "transfer overdraws {}",
            transfer.from
        );
        *balances.entry(transfer.from).or_default() -= transfer.capacity.clone();
        *balances.entry(transfer.to).or_default() += transfer.capacity.clone();
    }
    balances.retain(|_, balance| !balance.is_zero());
    if flow.is_zero() {
        assert!(balances.is_empty());
    } else {
        assert_eq!(balances, BTreeMap::from([(*sink, flow.clone())]));
    }

    let mut spent: BTreeMap<(Address, Address, Address), Int> = BTreeMap::new();
    for transfer in transfers {
        *spent
            .entry((transfer.from, transfer.to, transfer.token))
            .or_default() += transfer.capacity.clone();
    }
    for ((from, to, token), total) in &spent {
        let original = edges
            .iter()
            .find(|e| e.from == *from && e.to == *to && e.token == *token)
            .map(|e| e.capacity.clone());
        match original {
            Some(capacity) => assert!(*total <= capacity, "trust capacity exceeded"),
            None => panic!("transfer along an edge that does not exist"),
        }
    }
}

#[test]
fn direct() {
    let (a, b, ..) = addresses();
    let edges = build_edges(vec![edge(a, b, a, 100)]);
    let result = compute_flow(&a, &b, &edges, Int::from(100u64)).unwrap();
    assert_eq!(
        result,
        (Int::from(100u64), vec![edge(a, b, a, 100)])
    );
}

#[test]
fn request_cap() {
    let (a, b, ..) = addresses();
    let edges = build_edges(vec![edge(a, b, a, 100)]);
    let result = compute_flow(&a, &b, &edges, Int::from(30u64)).unwrap();
    assert_eq!(result, (Int::from(30u64), vec![edge(a, b, a, 30)]));
}

#[test]
fn chain() {
    let (a, b, c, ..) = addresses();
    let edges = build_edges(vec![edge(a, b, a, 50), edge(b, c, b, 40)]);
    let (flow, transfers) = compute_flow(&a, &c, &edges, Int::from(100u64)).unwrap();
    assert_eq!(flow, Int::from(40u64));
    // b can only forward after receiving, so the order is fixed.
    assert_eq!(transfers, vec![edge(a, b, a, 40), edge(b, c, b, 40)]);
    assert_realisable(&a, &c, &flow, &transfers, &edges);
}

#[test]
fn parallel_paths() {
    let (a, b, c, d, ..) = addresses();
    let edges = build_edges(vec![
        edge(a, b, a, 60),
        edge(a, c, a, 60),
        edge(b, d, b, 30),
        edge(c, d, c, 30),
    ]);
    let (flow, mut transfers) = compute_flow(&a, &d, &edges, Int::from(100u64)).unwrap();
    assert_eq!(flow, Int::from(60u64));
    assert_realisable(&a, &d, &flow, &transfers, &edges);
    transfers.sort();
    assert_eq!(
        transfers,
        vec![
            edge(a, b, a, 30),
            edge(a, c, a, 30),
            edge(b, d, b, 30),
            edge(c, d, c, 30),
        ]
    );
}

#[test]
fn diamond() {
    let (a, b, c, d, t1, t2) = addresses();
    let edges = build_edges(vec![
        edge(a, b, t1, 10),
        edge(a, c, t2, 7),
        edge(b, d, t2, 9),
        edge(c, d, t1, 8),
    ]);
    let (flow, transfers) = compute_flow(&a, &d, &edges, Int::max_value()).unwrap();
    assert_eq!(flow, Int::from(16u64));
    assert_realisable(&a, &d, &flow, &transfers, &edges);

    let (capped_flow, capped) = compute_flow(&a, &d, &edges, Int::from(6u64)).unwrap();
    assert_eq!(capped_flow, Int::from(6u64));
    assert_eq!(capped, vec![edge(a, b, t1, 6), edge(b, d, t2, 6)]);
}

#[test]
fn source_gate_bottleneck() {
    let (a, b, c, d, ..) = addresses();
    // Both outgoing edges share the pool (a x a): total outflow is bounded
    // by the gate, the max of the two, not their sum.
    let edges = build_edges(vec![
        edge(a, b, a, 80),
        edge(a, c, a, 80),
        edge(b, d, b, 100),
        edge(c, d, c, 100),
    ]);
    let (flow, transfers) = compute_flow(&a, &d, &edges, Int::max_value()).unwrap();
    assert_eq!(flow, Int::from(80u64));
    assert_realisable(&a, &d, &flow, &transfers, &edges);
    let out_of_a = transfers
        .iter()
        .filter(|t| t.from == a)
        .fold(Int::zero(), |acc, t| acc + t.capacity.clone());
    assert_eq!(out_of_a, Int::from(80u64));
}

#[test]
fn no_path() {
    let (a, b, c, d, ..) = addresses();
    let edges = build_edges(vec![edge(a, b, a, 10), edge(c, d, c, 10)]);
    let result = compute_flow(&a, &d, &edges, Int::max_value()).unwrap();
    assert_eq!(result, (Int::zero(), vec![]));
}

#[test]
fn source_equals_sink() {
    let (a, b, ..) = addresses();
    let edges = build_edges(vec![edge(a, b, a, 10)]);
    let result = compute_flow(&a, &a, &edges, Int::max_value()).unwrap();
    assert_eq!(result, (Int::zero(), vec![]));
}

#[test]
fn zero_request() {
    let (a, b, ..) = addresses();
    let edges = build_edges(vec![edge(a, b, a, 10)]);
    let result = compute_flow(&a, &b, &edges, Int::zero()).unwrap();
    assert_eq!(result, (Int::zero(), vec![]));
}

#[test]
fn deterministic_across_runs() {
    let (a, b, c, d, ..) = addresses();
    let input = vec![
        edge(a, b, a, 60),
        edge(a, c, a, 60),
        edge(b, d, b, 30),
        edge(c, d, c, 30),
        edge(b, c, b, 11),
    ];
    let first = compute_flow(&a, &d, &build_edges(input.clone()), Int::max_value()).unwrap();
    let second = compute_flow(&a, &d, &build_edges(input), Int::max_value()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn engine_tracks_edge_set_changes() {
    let (a, b, ..) = addresses();
    let mut engine = FlowEngine::new();
    let before = build_edges(vec![edge(a, b, a, 10)]);
    let after = build_edges(vec![edge(a, b, a, 25)]);
    let (flow, _) = engine
        .compute_flow(&a, &b, &before, Int::max_value())
        .unwrap();
    assert_eq!(flow, Int::from(10u64));
    let (flow, _) = engine
        .compute_flow(&a, &b, &after, Int::max_value())
        .unwrap();
    assert_eq!(flow, Int::from(25u64));
}

#[test]
fn non_conservative_used_edges_is_an_error() {
    let (a, b, c, ..) = addresses();
    // Value is parked at a but the only used edge starts at b's pool.
    let mut used_edges = BTreeMap::new();
    used_edges
        .entry(Node::Participant(b))
        .or_insert_with(BTreeMap::new)
        .insert(Node::Pool(b, b), Int::from(10u64));
    used_edges
        .entry(Node::Pool(b, b))
        .or_insert_with(BTreeMap::new)
        .insert(Node::Participant(c), Int::from(10u64));
    let result = extract_transfers(&a, &c, &Int::from(10u64), &Int::from(10u64), used_edges);
    assert_eq!(
        result,
        Err(FlowError::InconsistentFlow {
            flow_source: a,
            sink: c,
            requested: Int::from(10u64),
            stranded: Int::from(10u64),
        })
    );
}
