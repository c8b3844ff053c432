//! The incremental secondary index mirroring the store's read surface.
//!
//! # Design
//!
//! [`Lookup`] exists so a [`crate::workspace::Workspace`] can serve reads
//! *during* an in-flight transaction without going through the store on
//! every query (§4.3). It wraps the same [`crate::index::GraphIndex`]
//! primitive the store uses, and only ever receives patches the store has
//! already accepted — so unlike [`crate::store::Store::apply`],
//! [`Lookup::apply_patch`] is infallible by construction. If it ever does
//! fail, that means the store and lookup have drifted apart, which is a
//! bug in this crate rather than a caller error; we panic loudly instead of
//! returning a `Result` nobody expects to inspect.

use crate::index::GraphIndex;
use crate::model::{Edge, Endpoint, Graph, Node};
use crate::patch::Patch;
use crate::store::GraphState;

#[derive(Debug, Clone, Default)]
pub struct Lookup {
    index: GraphIndex,
}

impl Lookup {
    pub fn new() -> Self {
        Lookup { index: GraphIndex::new() }
    }

    pub fn from_graph(graph: &Graph) -> Self {
        Lookup { index: GraphIndex::from_graph(graph) }
    }

    /// Applies `patch`, which must already have been accepted by the
    /// store backing this lookup. Returns the corresponding undo patch.
    pub fn apply_patch(&mut self, patch: &Patch) -> Patch {
        self.index
            .apply(patch)
            .expect("Lookup::apply_patch received a patch the store had not already validated")
    }

    pub fn to_graph(&self) -> Graph {
        self.index.to_graph()
    }
}

impl GraphState for Lookup {
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
