//! Rules-based structural validation.
//!
//! # Design
//!
//! A [`Rule`] is a small, stateless, side-effect-free object: given a
//! [`GraphState`](crate::store::GraphState) (and, for incremental checks, a
//! [`Patch`]) it returns zero or more [`Diagnostic`]s. [`Validator`] is
//! just an ordered list of rules — `check_all` runs every rule against the
//! whole graph, `check` runs every rule restricted to what a patch could
//! plausibly have affected. Rule order is part of the contract (downstream
//! callers filter diagnostics by `code`), so adding a rule is additive and
//! never reorders the standard six.
//!
//! Unlike identity, which the store already enforces as a hard error on
//! every mutation, the other five rules here are soft: a `Store` happily
//! holds a graph with a dangling reference, a reversed edge, or two edges
//! into one input, because only the validator (via `Workspace`) decides
//! whether that is fatal for a given transaction.

use crate::model::Edge;
use crate::patch::Patch;
use crate::store::GraphState;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagLevel {
    Error,
    Warning,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiagnosticTarget {
    Graph,
    Node { id: String },
    Edge { id: String },
    Endpoint { id: String },
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub level: DiagLevel,
    pub code: String,
    pub message: String,
    pub target: DiagnosticTarget,
}

impl Diagnostic {
    fn error(code: &str, message: impl Into<String>, target: DiagnosticTarget) -> Self {
        Diagnostic { level: DiagLevel::Error, code: code.to_string(), message: message.into(), target }
    }
}

/// Options controlling which soft checks are active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOptions {
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default)]
    pub match_flow: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions { allow_multiple: false, match_flow: false }
    }
}

/// One named validation rule.
pub trait Rule {
    fn code(&self) -> &'static str;
    fn check_all(&self, state: &dyn GraphState, options: &ValidateOptions) -> Vec<Diagnostic>;
    fn check(&self, state: &dyn GraphState, patch: &Patch, options: &ValidateOptions) -> Vec<Diagnostic>;
}

/// Edges the patch could plausibly have changed the validity of: the
/// patch's own new/replaced edges, plus every edge incident to a replaced
/// node (§4.4). Deduplicated with an `IndexSet` rather than a `HashSet` so
/// the emitted diagnostic order is a deterministic function of the patch
/// (P5) instead of depending on a randomly-seeded hasher.
fn affected_edges<'s>(state: &'s dyn GraphState, patch: &Patch) -> Vec<&'s Edge> {
    let mut seen: IndexSet<String> = IndexSet::new();
    seen.extend(patch.edge_add().iter().map(|e| e.id.clone()));
    seen.extend(patch.edge_replace().iter().map(|e| e.id.clone()));
    for node in patch.node_replace() {
        seen.extend(state.outgoing(&node.id).iter().cloned());
        seen.extend(state.incoming(&node.id).iter().cloned());
    }
    seen.into_iter().filter_map(|id| state.get_edge(&id)).collect()
}

/// Input endpoint ids the patch could plausibly have changed the incoming
/// edge count of: targets of new/replaced edges, plus every input of a
/// new or replaced node (§4.4). `IndexSet` for the same determinism reason
/// as [`affected_edges`].
fn affected_input_ids(patch: &Patch) -> IndexSet<String> {
    let mut ids: IndexSet<String> = IndexSet::new();
    for edge in patch.edge_add().iter().chain(patch.edge_replace()) {
        ids.insert(edge.target.endpoint_id.clone());
    }
    for node in patch.node_add().iter().chain(patch.node_replace()) {
        for input in &node.inputs {
            ids.insert(input.id.clone());
        }
    }
    ids
}

struct IdentityRule;
impl Rule for IdentityRule {
    fn code(&self) -> &'static str {
        "identity"
    }

    fn check_all(&self, state: &dyn GraphState, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        let mut seen_endpoints: HashSet<String> = HashSet::new();
        for node in state.list_nodes() {
            for endpoint in node.inputs.iter().chain(node.outputs.iter()) {
                if !seen_endpoints.insert(endpoint.id.clone()) {
                    diags.push(Diagnostic::error(
                        self.code(),
                        format!("Endpoint id '{}' is used by more than one node", endpoint.id),
                        DiagnosticTarget::Endpoint { id: endpoint.id.clone() },
                    ));
                }
            }
        }
        diags
    }

    fn check(&self, state: &dyn GraphState, patch: &Patch, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for node in patch.node_add() {
            for endpoint in node.inputs.iter().chain(node.outputs.iter()) {
                if state.owner(&endpoint.id).map(|owner| owner != node.id).unwrap_or(false) {
                    diags.push(Diagnostic::error(
                        self.code(),
                        format!("Endpoint id '{}' is used by more than one node", endpoint.id),
                        DiagnosticTarget::Endpoint { id: endpoint.id.clone() },
                    ));
                }
            }
        }
        diags
    }
}

struct ReferenceRule;
impl ReferenceRule {
    fn check_edge(&self, state: &dyn GraphState, edge: &Edge, diags: &mut Vec<Diagnostic>) {
        if !state.has_node(&edge.source.node_id) {
            diags.push(Diagnostic::error(
                self.code(),
                format!("Edge '{}' source node '{}' does not exist", edge.id, edge.source.node_id),
                DiagnosticTarget::Edge { id: edge.id.clone() },
            ));
        }
        if !state.has_node(&edge.target.node_id) {
            diags.push(Diagnostic::error(
                self.code(),
                format!("Edge '{}' target node '{}' does not exist", edge.id, edge.target.node_id),
                DiagnosticTarget::Edge { id: edge.id.clone() },
            ));
        }
        if !state.has_endpoint(&edge.source.endpoint_id) {
            diags.push(Diagnostic::error(
                self.code(),
                format!("Edge '{}' source endpoint '{}' does not exist", edge.id, edge.source.endpoint_id),
                DiagnosticTarget::Edge { id: edge.id.clone() },
            ));
        }
        if !state.has_endpoint(&edge.target.endpoint_id) {
            diags.push(Diagnostic::error(
                self.code(),
                format!("Edge '{}' target endpoint '{}' does not exist", edge.id, edge.target.endpoint_id),
                DiagnosticTarget::Edge { id: edge.id.clone() },
            ));
        }
    }
}
impl Rule for ReferenceRule {
    fn code(&self) -> &'static str {
        "reference"
    }

    fn check_all(&self, state: &dyn GraphState, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for edge in state.list_edges() {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }

    fn check(&self, state: &dyn GraphState, patch: &Patch, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for edge in affected_edges(state, patch) {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }
}

struct DirectionRule;
impl DirectionRule {
    fn check_edge(&self, state: &dyn GraphState, edge: &Edge, diags: &mut Vec<Diagnostic>) {
        use crate::model::EndpointRole;
        if let Some(source) = state.get_endpoint(&edge.source.endpoint_id) {
            if source.role != EndpointRole::Output {
                diags.push(Diagnostic::error(
                    self.code(),
                    format!("Edge '{}' source endpoint '{}' is not an output", edge.id, edge.source.endpoint_id),
                    DiagnosticTarget::Edge { id: edge.id.clone() },
                ));
            }
        }
        if let Some(target) = state.get_endpoint(&edge.target.endpoint_id) {
            if target.role != EndpointRole::Input {
                diags.push(Diagnostic::error(
                    self.code(),
                    format!("Edge '{}' target endpoint '{}' is not an input", edge.id, edge.target.endpoint_id),
                    DiagnosticTarget::Edge { id: edge.id.clone() },
                ));
            }
        }
    }
}
impl Rule for DirectionRule {
    fn code(&self) -> &'static str {
        "direction"
    }

    fn check_all(&self, state: &dyn GraphState, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for edge in state.list_edges() {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }

    fn check(&self, state: &dyn GraphState, patch: &Patch, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for edge in affected_edges(state, patch) {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }
}

struct OwnershipRule;
impl OwnershipRule {
    fn check_edge(&self, state: &dyn GraphState, edge: &Edge, diags: &mut Vec<Diagnostic>) {
        if let Some(owner) = state.owner(&edge.source.endpoint_id) {
            if owner != edge.source.node_id {
                diags.push(Diagnostic::error(
                    self.code(),
                    format!(
                        "Edge '{}' source endpoint '{}' is owned by '{}', not '{}'",
                        edge.id, edge.source.endpoint_id, owner, edge.source.node_id
                    ),
                    DiagnosticTarget::Edge { id: edge.id.clone() },
                ));
            }
        }
        if let Some(owner) = state.owner(&edge.target.endpoint_id) {
            if owner != edge.target.node_id {
                diags.push(Diagnostic::error(
                    self.code(),
                    format!(
                        "Edge '{}' target endpoint '{}' is owned by '{}', not '{}'",
                        edge.id, edge.target.endpoint_id, owner, edge.target.node_id
                    ),
                    DiagnosticTarget::Edge { id: edge.id.clone() },
                ));
            }
        }
    }
}
impl Rule for OwnershipRule {
    fn code(&self) -> &'static str {
        "ownership"
    }

    fn check_all(&self, state: &dyn GraphState, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for edge in state.list_edges() {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }

    fn check(&self, state: &dyn GraphState, patch: &Patch, _options: &ValidateOptions) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for edge in affected_edges(state, patch) {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }
}

struct CardinalityRule;
impl CardinalityRule {
    fn check_input(&self, state: &dyn GraphState, input_id: &str, diags: &mut Vec<Diagnostic>) {
        if state.input_edges(input_id).len() > 1 {
            diags.push(Diagnostic::error(
                self.code(),
                format!("Input '{input_id}' has more than one incoming edge"),
                DiagnosticTarget::Endpoint { id: input_id.to_string() },
            ));
        }
    }
}
impl Rule for CardinalityRule {
    fn code(&self) -> &'static str {
        "cardinality"
    }

    fn check_all(&self, state: &dyn GraphState, options: &ValidateOptions) -> Vec<Diagnostic> {
        if options.allow_multiple {
            return Vec::new();
        }
        let mut diags = Vec::new();
        for node in state.list_nodes() {
            for input in &node.inputs {
                self.check_input(state, &input.id, &mut diags);
            }
        }
        diags
    }

    fn check(&self, state: &dyn GraphState, patch: &Patch, options: &ValidateOptions) -> Vec<Diagnostic> {
        if options.allow_multiple {
            return Vec::new();
        }
        let mut diags = Vec::new();
        for input_id in affected_input_ids(patch) {
            self.check_input(state, &input_id, &mut diags);
        }
        diags
    }
}

struct FlowRule;
impl FlowRule {
    fn check_edge(&self, state: &dyn GraphState, edge: &Edge, diags: &mut Vec<Diagnostic>) {
        let source = state.get_endpoint(&edge.source.endpoint_id);
        let target = state.get_endpoint(&edge.target.endpoint_id);
        if let (Some(source), Some(target)) = (source, target) {
            if source.contract.flow != target.contract.flow {
                diags.push(Diagnostic::error(
                    self.code(),
                    format!(
                        "Edge '{}' connects flow '{}' to flow '{}'",
                        edge.id, source.contract.flow, target.contract.flow
                    ),
                    DiagnosticTarget::Edge { id: edge.id.clone() },
                ));
            }
        }
    }
}
impl Rule for FlowRule {
    fn code(&self) -> &'static str {
        "flow"
    }

    fn check_all(&self, state: &dyn GraphState, options: &ValidateOptions) -> Vec<Diagnostic> {
        if !options.match_flow {
            return Vec::new();
        }
        let mut diags = Vec::new();
        for edge in state.list_edges() {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }

    fn check(&self, state: &dyn GraphState, patch: &Patch, options: &ValidateOptions) -> Vec<Diagnostic> {
        if !options.match_flow {
            return Vec::new();
        }
        let mut diags = Vec::new();
        for edge in affected_edges(state, patch) {
            self.check_edge(state, edge, &mut diags);
        }
        diags
    }
}

/// An ordered list of rules. Order is part of the contract: standard rules
/// always run identity, reference, direction, ownership, cardinality, flow
/// — in that order — so callers filtering diagnostics by `code` see a
/// stable relative ordering.
pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

impl Validator {
    pub fn standard() -> Self {
        Validator {
            rules: vec![
                Box::new(IdentityRule),
                Box::new(ReferenceRule),
                Box::new(DirectionRule),
                Box::new(OwnershipRule),
                Box::new(CardinalityRule),
                Box::new(FlowRule),
            ],
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Validator { rules }
    }

    pub fn check_all(&self, state: &dyn GraphState, options: &ValidateOptions) -> Vec<Diagnostic> {
        self.rules.iter().flat_map(|rule| rule.check_all(state, options)).collect()
    }

    pub fn check(&self, state: &dyn GraphState, patch: &Patch, options: &ValidateOptions) -> Vec<Diagnostic> {
        self.rules.iter().flat_map(|rule| rule.check(state, patch, options)).collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::standard()
    }
}
