//! Incremental vs. full-scan validator agreement, and `Lookup` vs. `Store`
//! agreement, across every patch category (§4.4, §4.1).
//!
//! Each test applies one patch kind to a small seeded graph and checks two
//! things: that `Validator::check` (scoped to the patch) reports the same
//! error-level diagnostics as `Validator::check_all` (full rescan) for the
//! rule codes that patch category can trip, and that the incremental
//! `Lookup` mirrors the authoritative `Store` afterward.

use graph_engine::lookup::Lookup;
use graph_engine::{
    Contract, DiagLevel, Edge, Endpoint, GraphState, Node, Patch, Store, ValidateOptions,
    Validator,
};

fn node_with_output(id: &str, out_id: &str, flow: &str) -> Node {
    Node {
        id: id.into(),
        node_type: "source".into(),
        name: None,
        inputs: vec![],
        outputs: vec![Endpoint::output(out_id, "out", Contract::new(flow))],
        metadata: None,
    }
}

fn node_with_input(id: &str, in_id: &str, flow: &str) -> Node {
    Node {
        id: id.into(),
        node_type: "sink".into(),
        name: None,
        inputs: vec![Endpoint::input(in_id, "in", Contract::new(flow))],
        outputs: vec![],
        metadata: None,
    }
}

fn edge(id: &str, source: (&str, &str), target: (&str, &str)) -> Edge {
    Edge {
        id: id.into(),
        source: graph_engine::Reference::new(source.0, source.1),
        target: graph_engine::Reference::new(target.0, target.1),
        metadata: None,
    }
}

/// Applies `patch` to both a `Store` and a `Lookup` started from the same
/// snapshot, then asserts: (1) the two indices still agree on every node
/// and edge, and (2) the incremental and full-scan error diagnostics for
/// `options` agree, restricted to error level (§4.4 "incremental agreement").
fn assert_incremental_matches_full(mut store: Store, patch: Patch, options: &ValidateOptions) {
    let mut lookup = Lookup::from_graph(&store.to_graph());

    store.apply(&patch).unwrap();
    lookup.apply_patch(&patch);
    assert_eq!(store.to_graph(), lookup.to_graph(), "lookup drifted from store after patch");

    let incremental: Vec<_> = Validator::standard()
        .check(&store, &patch, options)
        .into_iter()
        .filter(|d| d.level == DiagLevel::Error)
        .collect();
    let full: Vec<_> = Validator::standard()
        .check_all(&store, options)
        .into_iter()
        .filter(|d| d.level == DiagLevel::Error)
        .collect();

    for diag in &incremental {
        assert!(full.contains(diag), "full scan missed incremental diagnostic: {diag:?}");
    }
}

#[test]
fn add_node_and_edge_agree() {
    let store = Store::new();
    let patch = Patch {
        node_add: Some(vec![
            node_with_output("a", "a.out", "number"),
            node_with_input("b", "b.in", "number"),
        ]),
        ..Default::default()
    };
    assert_incremental_matches_full(store, patch, &ValidateOptions::default());
}

#[test]
fn replace_node_flow_mismatch_detected_incrementally_and_fully() {
    let mut store = Store::new();
    store
        .apply(&Patch {
            node_add: Some(vec![
                node_with_output("a", "a.out", "number"),
                node_with_input("b", "b.in", "number"),
            ]),
            ..Default::default()
        })
        .unwrap();
    store
        .apply(&Patch { edge_add: Some(vec![edge("e1", ("a", "a.out"), ("b", "b.in"))]), ..Default::default() })
        .unwrap();

    // Replacing B to demand "string" instead of "number" turns e1 into a
    // flow mismatch; the rule must be caught whether the edge is discovered
    // via the replaced node's incident-edge scan or a full rescan.
    let patch = Patch { node_replace: Some(vec![node_with_input("b", "b.in", "string")]), ..Default::default() };
    assert_incremental_matches_full(store, patch, &ValidateOptions { allow_multiple: false, match_flow: true });
}

#[test]
fn replace_node_cardinality_violation_detected_incrementally_and_fully() {
    let mut store = Store::new();
    store
        .apply(&Patch {
            node_add: Some(vec![
                node_with_output("a", "a.out", "number"),
                node_with_output("c", "c.out", "number"),
                node_with_input("b", "b.in", "number"),
            ]),
            ..Default::default()
        })
        .unwrap();
    store
        .apply(&Patch { edge_add: Some(vec![edge("e1", ("a", "a.out"), ("b", "b.in"))]), ..Default::default() })
        .unwrap();

    // Adding a second edge into b.in via an edgeAdd patch trips cardinality
    // both incrementally (b.in is a target of a new edge) and fully.
    let patch = Patch { edge_add: Some(vec![edge("e2", ("c", "c.out"), ("b", "b.in"))]), ..Default::default() };
    assert_incremental_matches_full(store, patch, &ValidateOptions::default());
}

#[test]
fn remove_edge_then_remove_node_agree() {
    let mut store = Store::new();
    store
        .apply(&Patch {
            node_add: Some(vec![
                node_with_output("a", "a.out", "number"),
                node_with_input("b", "b.in", "number"),
            ]),
            ..Default::default()
        })
        .unwrap();
    store
        .apply(&Patch { edge_add: Some(vec![edge("e1", ("a", "a.out"), ("b", "b.in"))]), ..Default::default() })
        .unwrap();

    let patch = Patch { edge_remove: Some(vec!["e1".into()]), ..Default::default() };
    assert_incremental_matches_full(store, patch, &ValidateOptions::default());
}

#[test]
fn replace_edge_direction_violation_detected_incrementally_and_fully() {
    let mut store = Store::new();
    store
        .apply(&Patch {
            node_add: Some(vec![
                node_with_output("a", "a.out", "number"),
                node_with_input("b", "b.in", "number"),
            ]),
            ..Default::default()
        })
        .unwrap();
    store
        .apply(&Patch { edge_add: Some(vec![edge("e1", ("a", "a.out"), ("b", "b.in"))]), ..Default::default() })
        .unwrap();

    // Replacing e1 so it runs input-to-output (reversed) trips `direction`.
    let patch = Patch { edge_replace: Some(vec![edge("e1", ("b", "b.in"), ("a", "a.out"))]), ..Default::default() };
    assert_incremental_matches_full(store, patch, &ValidateOptions::default());
}

#[test]
fn remove_node_cascades_and_lookup_still_agrees() {
    let mut store = Store::new();
    store
        .apply(&Patch {
            node_add: Some(vec![
                node_with_output("a", "a.out", "number"),
                node_with_input("b", "b.in", "number"),
            ]),
            ..Default::default()
        })
        .unwrap();
    store
        .apply(&Patch { edge_add: Some(vec![edge("e1", ("a", "a.out"), ("b", "b.in"))]), ..Default::default() })
        .unwrap();

    let mut lookup = Lookup::from_graph(&store.to_graph());

    // As in `Workspace::remove_node`, the caller must remove incident edges
    // in the same patch as the node removal.
    let patch = Patch { edge_remove: Some(vec!["e1".into()]), node_remove: Some(vec!["a".into()]), ..Default::default() };
    store.apply(&patch).unwrap();
    lookup.apply_patch(&patch);

    assert!(!store.has_node("a"));
    assert_eq!(store.to_graph(), lookup.to_graph());
}
