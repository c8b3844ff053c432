//! The index-and-value update primitive shared by [`crate::store::Store`]
//! and [`crate::lookup::Lookup`].
//!
//! # Design
//!
//! Both the authoritative store and the incremental lookup need the exact
//! same bookkeeping: id → value maps plus adjacency lists, mutated in
//! lock-step. Rather than duplicate that bookkeeping twice (and risk it
//! drifting out of sync), both wrap a [`GraphIndex`] and differ only in
//! *who* is allowed to see an error. `Store::apply` surfaces hard errors to
//! its caller; `Lookup::apply_patch` always receives a patch the store has
//! already accepted and treats failure as a bug.
//!
//! Hard invariants enforced here are exactly the ones the base contract
//! assigns to the store (§7): duplicate ids, missing ids, dangling
//! endpoints on replace/remove. Reference, ownership, direction,
//! cardinality and flow are left entirely to the validator — an edge whose
//! endpoints don't resolve, or resolve to the wrong role, is accepted by
//! the index and reported as a diagnostic instead. This keeps the "hard
//! error vs soft diagnostic" split in one place instead of two.

use crate::error::EngineError;
use crate::model::{Edge, Endpoint, EndpointRole, Graph, Node};
use crate::patch::Patch;
use indexmap::IndexMap;

/// Removes `value` from `list`, preserving the order of what remains —
/// adjacency lists are iterated in insertion order (§5), so this cannot be a
/// swap-remove despite the O(1) temptation.
fn remove_value(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<String, Edge>,
    endpoint_by_id: IndexMap<String, Endpoint>,
    owner_by_endpoint_id: IndexMap<String, String>,
    endpoints_by_node_id: IndexMap<String, Vec<String>>,
    out_edges_by_node_id: IndexMap<String, Vec<String>>,
    in_edges_by_node_id: IndexMap<String, Vec<String>>,
    out_edges_by_output_id: IndexMap<String, Vec<String>>,
    in_edges_by_input_id: IndexMap<String, Vec<String>>,
    metadata: Option<serde_json::Value>,
}

impl GraphIndex {
    pub fn new() -> Self {
        GraphIndex::default()
    }

    pub fn from_graph(graph: &Graph) -> Self {
        let mut index = GraphIndex::new();
        for node in graph.nodes.values() {
            index.insert_node_unchecked(node.clone());
        }
        for edge in graph.edges.values() {
            index.insert_edge_unchecked(edge.clone());
        }
        index.metadata = graph.metadata.clone();
        index
    }

    pub fn to_graph(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
        }
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }
    pub fn has_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }
    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }
    pub fn has_endpoint(&self, id: &str) -> bool {
        self.endpoint_by_id.contains_key(id)
    }
    pub fn get_endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.endpoint_by_id.get(id)
    }
    pub fn owner(&self, endpoint_id: &str) -> Option<&str> {
        self.owner_by_endpoint_id.get(endpoint_id).map(String::as_str)
    }
    pub fn endpoints(&self, node_id: &str) -> &[String] {
        self.endpoints_by_node_id.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn outgoing(&self, node_id: &str) -> &[String] {
        self.out_edges_by_node_id.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn incoming(&self, node_id: &str) -> &[String] {
        self.in_edges_by_node_id.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn output_edges(&self, output_id: &str) -> &[String] {
        self.out_edges_by_output_id.get(output_id).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn input_edges(&self, input_id: &str) -> &[String] {
        self.in_edges_by_input_id.get(input_id).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn list_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
    pub fn list_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    // ── Mutation primitive ───────────────────────────────────────────────

    /// Applies `patch` in the order replace-nodes, replace-edges,
    /// remove-edges, remove-nodes, add-nodes, add-edges (§4.1), returning
    /// the undo patch. A single call to this method is atomic: if any op
    /// in the patch hits a hard error, every op that already succeeded is
    /// reverted before the error is returned, so the index is exactly as it
    /// was on entry. Multi-call atomicity (several `Editor` calls within one
    /// `Workspace::update`) is still `Workspace`'s job, via its own undo
    /// stack.
    pub fn apply(&mut self, patch: &Patch) -> Result<Patch, EngineError> {
        patch.validate_no_conflicts()?;

        let mut undo_node_replace = Vec::new();
        let mut undo_edge_replace = Vec::new();
        let mut undo_edge_add = Vec::new();
        let mut undo_node_add = Vec::new();
        let mut undo_node_remove = Vec::new();
        let mut undo_edge_remove = Vec::new();

        let result = (|| -> Result<(), EngineError> {
            for node in patch.node_replace() {
                undo_node_replace.push(self.replace_node(node.clone())?);
            }
            for edge in patch.edge_replace() {
                undo_edge_replace.push(self.replace_edge(edge.clone())?);
            }
            for id in patch.edge_remove() {
                undo_edge_add.push(self.remove_edge(id)?);
            }
            for id in patch.node_remove() {
                undo_node_add.push(self.remove_node(id)?);
            }
            for node in patch.node_add() {
                self.add_node(node.clone())?;
                undo_node_remove.push(node.id.clone());
            }
            for edge in patch.edge_add() {
                self.add_edge(edge.clone())?;
                undo_edge_remove.push(edge.id.clone());
            }
            Ok(())
        })();

        let undo = Patch {
            node_add: none_if_empty(undo_node_add),
            node_remove: none_if_empty(undo_node_remove),
            node_replace: none_if_empty(undo_node_replace),
            edge_add: none_if_empty(undo_edge_add),
            edge_remove: none_if_empty(undo_edge_remove),
            edge_replace: none_if_empty(undo_edge_replace),
        };

        if let Err(err) = result {
            self.apply(&undo).expect("reverting a partially applied patch must succeed");
            return Err(err);
        }

        Ok(undo)
    }

    fn insert_node_unchecked(&mut self, node: Node) {
        let endpoint_ids: Vec<String> = node.endpoint_ids().map(String::from).collect();
        for endpoint in node.inputs.iter().chain(node.outputs.iter()) {
            self.owner_by_endpoint_id.insert(endpoint.id.clone(), node.id.clone());
            self.endpoint_by_id.insert(endpoint.id.clone(), endpoint.clone());
        }
        self.endpoints_by_node_id.insert(node.id.clone(), endpoint_ids);
        self.out_edges_by_node_id.entry(node.id.clone()).or_default();
        self.in_edges_by_node_id.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node);
    }

    fn insert_edge_unchecked(&mut self, edge: Edge) {
        self.out_edges_by_node_id.entry(edge.source.node_id.clone()).or_default().push(edge.id.clone());
        self.in_edges_by_node_id.entry(edge.target.node_id.clone()).or_default().push(edge.id.clone());
        self.out_edges_by_output_id.entry(edge.source.endpoint_id.clone()).or_default().push(edge.id.clone());
        self.in_edges_by_input_id.entry(edge.target.endpoint_id.clone()).or_default().push(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    fn add_node(&mut self, node: Node) -> Result<(), EngineError> {
        if self.nodes.contains_key(&node.id) {
            return Err(EngineError::duplicate_id("Node", &node.id));
        }
        for endpoint in node.inputs.iter().chain(node.outputs.iter()) {
            if self.owner_by_endpoint_id.contains_key(&endpoint.id) {
                return Err(EngineError::duplicate_id("Endpoint", &endpoint.id));
            }
        }
        self.insert_node_unchecked(node);
        Ok(())
    }

    fn add_edge(&mut self, edge: Edge) -> Result<(), EngineError> {
        if self.edges.contains_key(&edge.id) {
            return Err(EngineError::duplicate_id("Edge", &edge.id));
        }
        self.insert_edge_unchecked(edge);
        Ok(())
    }

    fn remove_node(&mut self, id: &str) -> Result<Node, EngineError> {
        let node = self.nodes.get(id).cloned().ok_or_else(|| EngineError::missing_id("Node", id))?;
        let incident = !self.outgoing(id).is_empty() || !self.incoming(id).is_empty();
        if incident {
            return Err(EngineError::dangling_endpoint(format!("Node '{id}' has incident edges")));
        }
        for endpoint in node.inputs.iter().chain(node.outputs.iter()) {
            self.owner_by_endpoint_id.shift_remove(&endpoint.id);
            self.endpoint_by_id.shift_remove(&endpoint.id);
            self.out_edges_by_output_id.shift_remove(&endpoint.id);
            self.in_edges_by_input_id.shift_remove(&endpoint.id);
        }
        self.endpoints_by_node_id.shift_remove(id);
        self.out_edges_by_node_id.shift_remove(id);
        self.in_edges_by_node_id.shift_remove(id);
        self.nodes.shift_remove(id);
        Ok(node)
    }

    fn remove_edge(&mut self, id: &str) -> Result<Edge, EngineError> {
        let edge = self.edges.get(id).cloned().ok_or_else(|| EngineError::missing_id("Edge", id))?;
        self.deregister_edge(&edge);
        self.edges.shift_remove(id);
        Ok(edge)
    }

    fn deregister_edge(&mut self, edge: &Edge) {
        if let Some(list) = self.out_edges_by_node_id.get_mut(&edge.source.node_id) {
            remove_value(list, &edge.id);
        }
        if let Some(list) = self.in_edges_by_node_id.get_mut(&edge.target.node_id) {
            remove_value(list, &edge.id);
        }
        if let Some(list) = self.out_edges_by_output_id.get_mut(&edge.source.endpoint_id) {
            remove_value(list, &edge.id);
        }
        if let Some(list) = self.in_edges_by_input_id.get_mut(&edge.target.endpoint_id) {
            remove_value(list, &edge.id);
        }
    }

    fn replace_edge(&mut self, edge: Edge) -> Result<Edge, EngineError> {
        let old = self.edges.get(&edge.id).cloned().ok_or_else(|| EngineError::missing_id("Edge", &edge.id))?;
        self.deregister_edge(&old);
        self.insert_edge_unchecked(edge);
        Ok(old)
    }

    fn replace_node(&mut self, node: Node) -> Result<Node, EngineError> {
        let old = self.nodes.get(&node.id).cloned().ok_or_else(|| EngineError::missing_id("Node", &node.id))?;

        let old_ids: Vec<String> = old.endpoint_ids().map(String::from).collect();
        let new_ids: Vec<String> = node.endpoint_ids().map(String::from).collect();

        for removed in old_ids.iter().filter(|id| !new_ids.contains(id)) {
            let has_edges = !self.output_edges(removed).is_empty() || !self.input_edges(removed).is_empty();
            if has_edges {
                let role = old.endpoint(removed).map(|e| e.role);
                let kind = match role {
                    Some(EndpointRole::Input) => "Input",
                    Some(EndpointRole::Output) => "Output",
                    None => "Endpoint",
                };
                return Err(EngineError::dangling_endpoint(format!("{kind} '{removed}' has edges")));
            }
        }
        for added in new_ids.iter().filter(|id| !old_ids.contains(id)) {
            if self.owner_by_endpoint_id.contains_key(added) {
                return Err(EngineError::duplicate_id("Endpoint", added));
            }
        }

        for removed in old_ids.iter().filter(|id| !new_ids.contains(id)) {
            self.owner_by_endpoint_id.shift_remove(removed);
            self.endpoint_by_id.shift_remove(removed);
        }
        for endpoint in node.inputs.iter().chain(node.outputs.iter()) {
            self.owner_by_endpoint_id.insert(endpoint.id.clone(), node.id.clone());
            self.endpoint_by_id.insert(endpoint.id.clone(), endpoint.clone());
        }
        self.endpoints_by_node_id.insert(node.id.clone(), new_ids);
        self.nodes.insert(node.id.clone(), node);
        Ok(old)
    }
}

fn none_if_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}
