//! Immutable value types describing a graph snapshot.
//!
//! # Design
//!
//! Every type here is plain data: no method mutates `self`, and the only
//! owning relationship is structural (a [`Node`] owns its [`Endpoint`]s).
//! [`Edge`] never holds a pointer to an endpoint — it holds a [`Reference`],
//! a `(nodeId, endpointId)` pair — so edges serialize and compare cheaply
//! and a [`Graph`] can be handed around by value without aliasing concerns.
//!
//! The in-memory [`Graph`] indexes nodes and edges by id (an
//! [`indexmap::IndexMap`], chosen for O(1) lookup with insertion-order
//! preserving iteration). The wire form ([`GraphValue`] and friends) is a
//! flat, order-preserving `Vec` of each, matching how the type would look
//! serialized to JSON. [`Graph::to_value`] / [`Graph::from_value`] convert
//! between the two; see [`crate::model::tests::round_trip`] for the law
//! this pair must uphold.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The "flow type" protocol attached to an endpoint. Only `flow` is
/// interpreted by the engine (by the `flow` validator rule); `schema` is
/// opaque, caller-owned data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub flow: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

impl Contract {
    pub fn new(flow: impl Into<String>) -> Self {
        Contract { flow: flow.into(), schema: None }
    }
}

/// Which side of an edge an endpoint may participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Input,
    Output,
}

/// A connection point owned by a node.
///
/// Inputs and outputs share this single shape; [`EndpointRole`] is the only
/// discriminator, matching the base specification's "variants, not
/// inheritance" guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: String,
    pub name: String,
    pub role: EndpointRole,
    pub contract: Contract,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Endpoint {
    pub fn input(id: impl Into<String>, name: impl Into<String>, contract: Contract) -> Self {
        Endpoint { id: id.into(), name: name.into(), role: EndpointRole::Input, contract, metadata: None }
    }

    pub fn output(id: impl Into<String>, name: impl Into<String>, contract: Contract) -> Self {
        Endpoint { id: id.into(), name: name.into(), role: EndpointRole::Output, contract, metadata: None }
    }
}

/// A container of input and output endpoints.
///
/// `node_type` is an opaque string owned entirely by callers — the engine
/// never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Endpoint>,
    #[serde(default)]
    pub outputs: Vec<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Node {
    /// All endpoint ids owned by this node, inputs first then outputs —
    /// the order `Store`/`Lookup` adjacency lists preserve.
    pub fn endpoint_ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|e| e.id.as_str()).chain(self.outputs.iter().map(|e| e.id.as_str()))
    }

    pub fn endpoint(&self, endpoint_id: &str) -> Option<&Endpoint> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|e| e.id == endpoint_id)
    }
}

/// A `(nodeId, endpointId)` pair. Edges hold references, never pointers, to
/// endpoints, so an edge can be serialized or compared without walking into
/// node storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub node_id: String,
    pub endpoint_id: String,
}

impl Reference {
    pub fn new(node_id: impl Into<String>, endpoint_id: impl Into<String>) -> Self {
        Reference { node_id: node_id.into(), endpoint_id: endpoint_id.into() }
    }
}

/// A directed connection from one endpoint to another.
///
/// By convention `source` resolves to an [`EndpointRole::Output`] and
/// `target` to an [`EndpointRole::Input`]; this is enforced by the
/// `direction` validator rule, not by the constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: Reference,
    pub target: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// An immutable snapshot of nodes and edges.
///
/// Iteration order over `nodes`/`edges` is insertion-order stable within a
/// snapshot (backed by [`IndexMap`]); callers must not rely on it across
/// independently constructed graphs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    pub nodes: IndexMap<String, Node>,
    pub edges: IndexMap<String, Edge>,
    pub metadata: Option<serde_json::Value>,
}

impl Graph {
    pub fn empty() -> Self {
        Graph::default()
    }

    pub fn to_value(&self) -> GraphValue {
        GraphValue {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn from_value(value: GraphValue) -> Self {
        let mut nodes = IndexMap::with_capacity(value.nodes.len());
        for node in value.nodes {
            nodes.insert(node.id.clone(), node);
        }
        let mut edges = IndexMap::with_capacity(value.edges.len());
        for edge in value.edges {
            edges.insert(edge.id.clone(), edge);
        }
        Graph { nodes, edges, metadata: value.metadata }
    }
}

/// The canonical, order-preserving wire form of a [`Graph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphValue {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

// The remaining `…Value` aliases in the base contract (§6) coincide with
// their domain types one-to-one, since `Node`/`Edge`/`Endpoint`/`Contract`/
// `Reference` are already plain data with no internal indices to flatten —
// only `Graph` needs a distinct wire shape (map → ordered array).
pub type NodeValue = Node;
pub type EdgeValue = Edge;
pub type EndpointValue = Endpoint;
pub type ContractValue = Contract;
pub type ReferenceValue = Reference;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> Graph {
        let mut a = Node {
            id: "a".into(),
            node_type: "source".into(),
            name: Some("A".into()),
            inputs: vec![],
            outputs: vec![Endpoint::output("a.out", "out", Contract::new("number"))],
            metadata: None,
        };
        a.metadata = Some(serde_json::json!({"note": "root"}));
        let b = Node {
            id: "b".into(),
            node_type: "sink".into(),
            name: None,
            inputs: vec![Endpoint::input("b.in", "in", Contract::new("number"))],
            outputs: vec![],
            metadata: None,
        };
        let e = Edge {
            id: "e1".into(),
            source: Reference::new("a", "a.out"),
            target: Reference::new("b", "b.in"),
            metadata: None,
        };

        let mut nodes = IndexMap::new();
        nodes.insert(a.id.clone(), a);
        nodes.insert(b.id.clone(), b);
        let mut edges = IndexMap::new();
        edges.insert(e.id.clone(), e);
        Graph { nodes, edges, metadata: None }
    }

    #[test]
    fn round_trip_preserves_entities_and_order() {
        let g = sample_graph();
        let back = Graph::from_value(g.to_value());
        assert_eq!(g, back);
        assert_eq!(
            g.nodes.keys().collect::<Vec<_>>(),
            back.nodes.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn round_trip_through_json() {
        let g = sample_graph();
        let json = serde_json::to_string(&g.to_value()).unwrap();
        let value: GraphValue = serde_json::from_str(&json).unwrap();
        assert_eq!(Graph::from_value(value), g);
    }
}
