//! Impact analysis: given a patch and a pre-change [`GraphState`], compute
//! the sub-graph of nodes and edges a change could plausibly affect (§4.6).
//!
//! # Design
//!
//! Analysis happens in two stages, mirroring the base contract:
//!
//! 1. **Seed selection** — every node directly named by the patch (added,
//!    removed, replaced node ids; both endpoints of added/replaced edges;
//!    both endpoints of removed edges, resolved against the *pre-change*
//!    state the caller passes in — see the open question this crate
//!    resolves in `DESIGN.md`).
//! 2. **BFS propagation** — breadth-first from the seeds along
//!    upstream/downstream/both adjacency, depth-capped and haltable at
//!    `stopNodes`, using whichever [`ImpactSemantics`] the caller supplied
//!    (the default walks `GraphState::outgoing`/`incoming` directly).
//!
//! Both stages are exposed as trait methods so a caller can override just
//! one — e.g. a custom `seeds` that only reacts to a subset of patch
//! categories — without reimplementing the BFS loop, the same "hook one
//! seam, keep the surrounding loop" shape the base workspace uses for its
//! editor closures.

use crate::model::Edge;
use crate::patch::Patch;
use crate::store::GraphState;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Which adjacency to propagate along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upstream,
    Downstream,
    Both,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Both
    }
}

/// Options controlling impact analysis (§6 "Impact options").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactOptions {
    #[serde(default)]
    pub direction: Direction,
    /// Nonnegative hop cap; `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(default)]
    pub include_boundary: bool,
    #[serde(default)]
    pub stop_nodes: Vec<String>,
    #[serde(default = "default_true")]
    pub include_seeds: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ImpactOptions {
    fn default() -> Self {
        ImpactOptions {
            direction: Direction::Both,
            depth: None,
            include_boundary: false,
            stop_nodes: Vec::new(),
            include_seeds: true,
        }
    }
}

/// The induced sub-graph an impact analysis produced: the visited node ids
/// (in BFS discovery order) and the edges `include_boundary` pulled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpactResult {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

impl ImpactResult {
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }
}

/// The three seams a caller may override to implement a custom impact
/// relationship (e.g. only traversing edges tagged `impact=true`). Default
/// methods implement the §4.6 default semantics over any [`GraphState`].
pub trait ImpactSemantics {
    /// Seed node ids: default union described in §4.6 — `nodeRemove`,
    /// `nodeAdd`/`nodeReplace` ids, both endpoints of added/replaced edges,
    /// and both endpoints of removed edges resolved via `state` (which
    /// must be the *pre-change* store/lookup — see module docs).
    fn seeds(&self, state: &dyn GraphState, patch: &Patch) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut push = |id: String, seen: &mut HashSet<String>, ordered: &mut Vec<String>| {
            if seen.insert(id.clone()) {
                ordered.push(id);
            }
        };

        for id in patch.node_remove() {
            push(id.clone(), &mut seen, &mut ordered);
        }
        for node in patch.node_add() {
            push(node.id.clone(), &mut seen, &mut ordered);
        }
        for node in patch.node_replace() {
            push(node.id.clone(), &mut seen, &mut ordered);
        }
        for edge in patch.edge_add().iter().chain(patch.edge_replace()) {
            push(edge.source.node_id.clone(), &mut seen, &mut ordered);
            push(edge.target.node_id.clone(), &mut seen, &mut ordered);
        }
        for id in patch.edge_remove() {
            if let Some(edge) = state.get_edge(id) {
                push(edge.source.node_id.clone(), &mut seen, &mut ordered);
                push(edge.target.node_id.clone(), &mut seen, &mut ordered);
            }
        }
        ordered
    }

    /// Edge ids leaving `node_id` whose target this traversal should
    /// enqueue next. Default: the store's outgoing adjacency.
    fn outgoing(&self, state: &dyn GraphState, node_id: &str) -> Vec<String> {
        state.outgoing(node_id).to_vec()
    }

    /// Edge ids entering `node_id` whose source this traversal should
    /// enqueue next. Default: the store's incoming adjacency.
    fn incoming(&self, state: &dyn GraphState, node_id: &str) -> Vec<String> {
        state.incoming(node_id).to_vec()
    }
}

/// The §4.6 default semantics: plain upstream/downstream edge walking with
/// no filtering.
pub struct DefaultImpactSemantics;
impl ImpactSemantics for DefaultImpactSemantics {}

/// Runs impact analysis over `state` (a pre-change [`GraphState`] — see
/// module docs on the edge-removal seed resolution convention) for `patch`
/// under `options`, using the default §4.6 semantics.
pub fn analyze_impact(state: &dyn GraphState, patch: &Patch, options: &ImpactOptions) -> ImpactResult {
    analyze_impact_with(state, patch, options, &DefaultImpactSemantics)
}

/// As [`analyze_impact`], but with a caller-supplied [`ImpactSemantics`]
/// overriding seed selection and/or traversal.
pub fn analyze_impact_with(
    state: &dyn GraphState,
    patch: &Patch,
    options: &ImpactOptions,
    semantics: &dyn ImpactSemantics,
) -> ImpactResult {
    let stop_nodes: HashSet<&str> = options.stop_nodes.iter().map(String::as_str).collect();
    let seeds = semantics.seeds(state, patch);

    let mut depth_of: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for id in &seeds {
        if depth_of.contains_key(id) {
            continue;
        }
        depth_of.insert(id.clone(), 0);
        order.push(id.clone());
        queue.push_back(id.clone());
    }

    while let Some(node_id) = queue.pop_front() {
        let depth = depth_of[&node_id];
        if stop_nodes.contains(node_id.as_str()) {
            continue;
        }
        if let Some(cap) = options.depth {
            if depth >= cap {
                continue;
            }
        }

        let mut neighbors: Vec<String> = Vec::new();
        if matches!(options.direction, Direction::Downstream | Direction::Both) {
            for edge_id in semantics.outgoing(state, &node_id) {
                if let Some(edge) = state.get_edge(&edge_id) {
                    neighbors.push(edge.target.node_id.clone());
                }
            }
        }
        if matches!(options.direction, Direction::Upstream | Direction::Both) {
            for edge_id in semantics.incoming(state, &node_id) {
                if let Some(edge) = state.get_edge(&edge_id) {
                    neighbors.push(edge.source.node_id.clone());
                }
            }
        }

        for neighbor in neighbors {
            if depth_of.contains_key(&neighbor) {
                continue;
            }
            depth_of.insert(neighbor.clone(), depth + 1);
            order.push(neighbor.clone());
            queue.push_back(neighbor);
        }
    }

    let seed_set: HashSet<&str> = seeds.iter().map(String::as_str).collect();
    let mut core: Vec<String> = if options.include_seeds {
        order
    } else {
        order.into_iter().filter(|id| !seed_set.contains(id.as_str())).collect()
    };

    let mut core_set: HashSet<String> = core.iter().cloned().collect();
    let mut edges: Vec<Edge> = Vec::new();
    let mut seen_edges: HashSet<String> = HashSet::new();

    for node_id in &core {
        for edge_id in state.outgoing(node_id).iter().chain(state.incoming(node_id)) {
            if !seen_edges.insert(edge_id.clone()) {
                continue;
            }
            let Some(edge) = state.get_edge(edge_id) else { continue };
            let source_in_core = core_set.contains(&edge.source.node_id);
            let target_in_core = core_set.contains(&edge.target.node_id);

            if source_in_core && target_in_core {
                edges.push(edge.clone());
            } else if options.include_boundary && (source_in_core || target_in_core) {
                edges.push(edge.clone());
                let outside = if source_in_core { &edge.target.node_id } else { &edge.source.node_id };
                if core_set.insert(outside.clone()) {
                    core.push(outside.clone());
                }
            }
        }
    }

    ImpactResult { nodes: core, edges }
}
