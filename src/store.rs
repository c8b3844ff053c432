//! The mutable authoritative index over the current graph state.
//!
//! # Design
//!
//! `Store` is a thin, fallible front-end over [`crate::index::GraphIndex`]:
//! it is the only place allowed to report the hard errors the base contract
//! assigns to "the store" (§7) — `DuplicateId`, `MissingId`,
//! `ConflictingPatchId`, `DanglingEndpoint`. Everything else ([`Lookup`],
//! the validator, impact analysis) reads through the same narrow
//! [`GraphState`] trait so they never care which concrete index backs them.

use crate::error::EngineError;
use crate::index::GraphIndex;
use crate::model::{Edge, Endpoint, Graph, Node};
use crate::patch::Patch;

/// A patch whose application reverses a previously applied patch. Same
/// shape as [`Patch`] — there is no separate wire type because the two are
/// symmetric (§4.1).
pub type UndoPatch = Patch;

/// The narrow read surface both [`Store`] and [`crate::lookup::Lookup`]
/// implement, so validator rules and the impact analyzer are agnostic to
/// which index backs them.
pub trait GraphState {
    fn has_node(&self, id: &str) -> bool;
    fn get_node(&self, id: &str) -> Option<&Node>;
    fn has_edge(&self, id: &str) -> bool;
    fn get_edge(&self, id: &str) -> Option<&Edge>;
    fn has_endpoint(&self, id: &str) -> bool;
    fn get_endpoint(&self, id: &str) -> Option<&Endpoint>;
    fn owner(&self, endpoint_id: &str) -> Option<&str>;
    fn endpoints(&self, node_id: &str) -> &[String];
    fn outgoing(&self, node_id: &str) -> &[String];
    fn incoming(&self, node_id: &str) -> &[String];
    fn output_edges(&self, output_id: &str) -> &[String];
    fn input_edges(&self, input_id: &str) -> &[String];
    fn list_nodes(&self) -> Vec<&Node>;
    fn list_edges(&self) -> Vec<&Edge>;
}

/// Mutable authoritative index. See module docs.
#[derive(Debug, Clone, Default)]
pub struct Store {
    index: GraphIndex,
}

impl Store {
    pub fn new() -> Self {
        Store { index: GraphIndex::new() }
    }

    pub fn from_graph(graph: &Graph) -> Self {
        Store { index: GraphIndex::from_graph(graph) }
    }

    /// Applies `patch`, enforcing the hard structural invariants, and
    /// returns the patch that undoes it. A single call is atomic — on error
    /// the store is left exactly as it was — but a `Workspace` transaction
    /// spanning several calls still owns its own undo stack across them.
    pub fn apply(&mut self, patch: &Patch) -> Result<UndoPatch, EngineError> {
        self.index.apply(patch)
    }

    pub fn to_graph(&self) -> Graph {
        self.index.to_graph()
    }
}

impl GraphState for Store {
    fn has_node(&self, id: &str) -> bool {
        self.index.has_node(id)
    }
    fn get_node(&self, id: &str) -> Option<&Node> {
        self.index.get_node(id)
    }
    fn has_edge(&self, id: &str) -> bool {
        self.index.has_edge(id)
    }
    fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.index.get_edge(id)
    }
    fn has_endpoint(&self, id: &str) -> bool {
        self.index.has_endpoint(id)
    }
    fn get_endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.index.get_endpoint(id)
    }
    fn owner(&self, endpoint_id: &str) -> Option<&str> {
        self.index.owner(endpoint_id)
    }
    fn endpoints(&self, node_id: &str) -> &[String] {
        self.index.endpoints(node_id)
    }
    fn outgoing(&self, node_id: &str) -> &[String] {
        self.index.outgoing(node_id)
    }
    fn incoming(&self, node_id: &str) -> &[String] {
        self.index.incoming(node_id)
    }
    fn output_edges(&self, output_id: &str) -> &[String] {
        self.index.output_edges(output_id)
    }
    fn input_edges(&self, input_id: &str) -> &[String] {
        self.index.input_edges(input_id)
    }
    fn list_nodes(&self) -> Vec<&Node> {
        self.index.list_nodes().collect()
    }
    fn list_edges(&self) -> Vec<&Edge> {
        self.index.list_edges().collect()
    }
}
