//! The transactional writer front-end.
//!
//! # Design
//!
//! `Workspace` is the only supported way to mutate a graph (§4.5). A
//! transaction opens an [`Editor`] over the workspace's [`Store`] and
//! [`Lookup`], lets caller code issue high-level edits, merges what
//! happened into one [`Patch`] via a [`PatchLog`], validates it, and either
//! commits a new [`Graph`] snapshot or replays every editor call's undo
//! patch in reverse. From the caller's perspective `update` is atomic:
//! either the workspace's graph moves forward, or it is exactly where it
//! started.

use crate::error::{EngineError, ErrorCode};
use crate::model::{Edge, Graph, Node};
use crate::patch::Patch;
use crate::store::{GraphState, Store};
use crate::lookup::Lookup;
use crate::validate::{DiagLevel, Diagnostic, ValidateOptions, Validator};
use indexmap::IndexSet;

/// Accumulates the patches issued by the editor calls of a single
/// transaction into one merged [`Patch`] (§4.5). Id-set categories
/// (removals) de-duplicate; sequence categories (adds, replaces) keep
/// edit order.
#[derive(Default)]
struct PatchLog {
    node_add: Vec<Node>,
    node_remove: IndexSet<String>,
    node_replace: Vec<Node>,
    edge_add: Vec<Edge>,
    edge_remove: IndexSet<String>,
    edge_replace: Vec<Edge>,
}

impl PatchLog {
    fn record(&mut self, patch: &Patch) {
        self.node_replace.extend(patch.node_replace().iter().cloned());
        self.edge_replace.extend(patch.edge_replace().iter().cloned());
        self.edge_remove.extend(patch.edge_remove().iter().cloned());
        self.node_remove.extend(patch.node_remove().iter().cloned());
        self.node_add.extend(patch.node_add().iter().cloned());
        self.edge_add.extend(patch.edge_add().iter().cloned());
    }

    fn into_patch(self) -> Patch {
        fn none_if_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        }
        Patch {
            node_add: none_if_empty(self.node_add),
            node_remove: none_if_empty(self.node_remove.into_iter().collect()),
            node_replace: none_if_empty(self.node_replace),
            edge_add: none_if_empty(self.edge_add),
            edge_remove: none_if_empty(self.edge_remove.into_iter().collect()),
            edge_replace: none_if_empty(self.edge_replace),
        }
    }
}

/// The edit surface handed to the closure passed to [`Workspace::update`].
pub struct Editor<'a> {
    store: &'a mut Store,
    lookup: &'a mut Lookup,
    undo_stack: &'a mut Vec<Patch>,
    patch_log: &'a mut PatchLog,
}

impl<'a> Editor<'a> {
    /// Applies a raw patch: the store accepts or rejects it, the lookup
    /// mirrors it, its undo patch is pushed for rollback, and it is
    /// recorded into this transaction's merged patch.
    pub fn apply(&mut self, patch: Patch) -> Result<(), EngineError> {
        let undo = self.store.apply(&patch)?;
        self.lookup.apply_patch(&patch);
        self.undo_stack.push(undo);
        self.patch_log.record(&patch);
        Ok(())
    }

    pub fn create_node(&mut self, node: Node) -> Result<(), EngineError> {
        self.apply(Patch { node_add: Some(vec![node]), ..Default::default() })
    }

    pub fn replace_node(&mut self, node: Node) -> Result<(), EngineError> {
        self.apply(Patch { node_replace: Some(vec![node]), ..Default::default() })
    }

    /// Removes a node and every edge incident to it in one patch (§4.5
    /// step 3): the caller never has to remove edges by hand first.
    pub fn remove_node(&mut self, id: &str) -> Result<(), EngineError> {
        let mut seen = IndexSet::new();
        seen.extend(self.store.outgoing(id).iter().cloned());
        seen.extend(self.store.incoming(id).iter().cloned());
        let edge_remove = if seen.is_empty() { None } else { Some(seen.into_iter().collect()) };
        self.apply(Patch { edge_remove, node_remove: Some(vec![id.to_string()]), ..Default::default() })
    }

    pub fn create_edge(&mut self, edge: Edge) -> Result<(), EngineError> {
        self.apply(Patch { edge_add: Some(vec![edge]), ..Default::default() })
    }

    pub fn replace_edge(&mut self, edge: Edge) -> Result<(), EngineError> {
        self.apply(Patch { edge_replace: Some(vec![edge]), ..Default::default() })
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<(), EngineError> {
        self.apply(Patch { edge_remove: Some(vec![id.to_string()]), ..Default::default() })
    }
}

/// The result of a committed [`Workspace::update`] call.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub graph: Graph,
    pub patch: Patch,
    pub diagnostics: Vec<Diagnostic>,
}

/// The transactional writer. Holds the current authoritative [`Store`], a
/// mirrored [`Lookup`], and the last committed [`Graph`] snapshot.
pub struct Workspace {
    store: Store,
    lookup: Lookup,
    graph: Graph,
    transacting: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace { store: Store::new(), lookup: Lookup::new(), graph: Graph::empty(), transacting: false }
    }

    pub fn from_graph(graph: Graph) -> Self {
        Workspace {
            store: Store::from_graph(&graph),
            lookup: Lookup::from_graph(&graph),
            graph,
            transacting: false,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Runs one transaction (§4.5). `editor_fn` issues edits through the
    /// [`Editor`] it is given; any error it returns, or any error-level
    /// diagnostic the incremental validator raises once it returns
    /// normally, rolls the whole transaction back.
    pub fn update<F>(&mut self, editor_fn: F, options: &ValidateOptions) -> Result<UpdateOutcome, EngineError>
    where
        F: FnOnce(&mut Editor) -> Result<(), EngineError>,
    {
        if self.transacting {
            return Err(EngineError::new(
                ErrorCode::ReentrantTransaction,
                "Workspace::update called while a transaction was already in progress",
            ));
        }
        self.transacting = true;

        let mut undo_stack = Vec::new();
        let mut patch_log = PatchLog::default();
        let mut editor = Editor {
            store: &mut self.store,
            lookup: &mut self.lookup,
            undo_stack: &mut undo_stack,
            patch_log: &mut patch_log,
        };

        let edit_result = editor_fn(&mut editor);

        let outcome = match edit_result {
            Ok(()) => {
                let merged = patch_log.into_patch();
                let diagnostics = Validator::standard().check(&self.store, &merged, options);
                let error_count = diagnostics.iter().filter(|d| d.level == DiagLevel::Error).count();
                if error_count > 0 {
                    let message = diagnostics
                        .iter()
                        .filter(|d| d.level == DiagLevel::Error)
                        .map(|d| d.message.as_str())
                        .collect::<Vec<_>>()
                        .join("; ");
                    self.rollback(undo_stack);
                    log::warn!("workspace update aborted: {error_count} validation error(s): {message}");
                    Err(EngineError::new(ErrorCode::ValidationFailed, message))
                } else {
                    log::debug!(
                        "workspace update committed: {} node op(s), {} edge op(s)",
                        merged.node_add().len() + merged.node_remove().len() + merged.node_replace().len(),
                        merged.edge_add().len() + merged.edge_remove().len() + merged.edge_replace().len(),
                    );
                    self.graph = self.store.to_graph();
                    Ok(UpdateOutcome { graph: self.graph.clone(), patch: merged, diagnostics })
                }
            }
            Err(e) => {
                self.rollback(undo_stack);
                log::warn!("workspace update aborted: {e}");
                Err(e)
            }
        };

        self.transacting = false;
        outcome
    }

    /// Convenience wrapper around `update` for applying a single raw patch.
    pub fn apply_patch(&mut self, patch: Patch, options: &ValidateOptions) -> Result<UpdateOutcome, EngineError> {
        self.update(|editor| editor.apply(patch), options)
    }

    fn rollback(&mut self, undo_stack: Vec<Patch>) {
        for undo in undo_stack.into_iter().rev() {
            self.store.apply(&undo).expect("undo replay must succeed: store and lookup have drifted apart");
            self.lookup.apply_patch(&undo);
        }
        self.graph = self.store.to_graph();
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contract, Endpoint, Reference};

    fn node_with_output(id: &str, out_id: &str) -> Node {
        Node {
            id: id.into(),
            node_type: "t".into(),
            name: None,
            inputs: vec![],
            outputs: vec![Endpoint::output(out_id, "out", Contract::new("string"))],
            metadata: None,
        }
    }
    fn node_with_input(id: &str, in_id: &str) -> Node {
        Node {
            id: id.into(),
            node_type: "t".into(),
            name: None,
            inputs: vec![Endpoint::input(in_id, "in", Contract::new("string"))],
            outputs: vec![],
            metadata: None,
        }
    }

    // S1 — add edge on new empty graph.
    #[test]
    fn s1_add_edge_happy_path() {
        let mut ws = Workspace::new();
        let outcome = ws
            .update(
                |e| {
                    e.create_node(node_with_output("a", "a.out"))?;
                    e.create_node(node_with_input("b", "b.in"))?;
                    e.create_edge(Edge {
                        id: "e1".into(),
                        source: Reference::new("a", "a.out"),
                        target: Reference::new("b", "b.in"),
                        metadata: None,
                    })
                },
                &ValidateOptions::default(),
            )
            .unwrap();

        assert_eq!(outcome.graph.edges.len(), 1);
        assert!(outcome.diagnostics.is_empty());
    }

    // S2 — direction violation rolls back to the unchanged graph.
    #[test]
    fn s2_direction_violation_rolls_back() {
        let mut ws = Workspace::new();
        ws.update(
            |e| {
                e.create_node(node_with_output("a", "a.out"))?;
                e.create_node(node_with_input("b", "b.in"))
            },
            &ValidateOptions::default(),
        )
        .unwrap();
        let before = ws.graph().clone();

        let err = ws
            .update(
                |e| {
                    e.create_edge(Edge {
                        id: "e2".into(),
                        source: Reference::new("a", "a.in_invalid"),
                        target: Reference::new("b", "b.out_invalid"),
                        metadata: None,
                    })
                },
                &ValidateOptions::default(),
            )
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(ws.graph(), &before);
    }

    // S3 — cardinality violation under default options.
    #[test]
    fn s3_cardinality_violation() {
        let mut ws = Workspace::new();
        ws.update(
            |e| {
                e.create_node(node_with_output("a", "a.out"))?;
                e.create_node(node_with_input("b", "b.in"))?;
                e.create_edge(Edge { id: "e1".into(), source: Reference::new("a", "a.out"), target: Reference::new("b", "b.in"), metadata: None })
            },
            &ValidateOptions::default(),
        )
        .unwrap();

        let err = ws
            .update(
                |e| {
                    e.create_node(node_with_output("c", "c.out"))?;
                    e.create_edge(Edge { id: "e2".into(), source: Reference::new("c", "c.out"), target: Reference::new("b", "b.in"), metadata: None })
                },
                &ValidateOptions::default(),
            )
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(ws.graph().edges.len(), 1);
    }

    // S7 — node removal cascades edge removal via the editor.
    #[test]
    fn s7_remove_node_cascades_edges() {
        let mut ws = Workspace::new();
        ws.update(
            |e| {
                e.create_node(node_with_output("a", "a.out"))?;
                e.create_node(node_with_input("b", "b.in"))?;
                e.create_edge(Edge { id: "e1".into(), source: Reference::new("a", "a.out"), target: Reference::new("b", "b.in"), metadata: None })
            },
            &ValidateOptions::default(),
        )
        .unwrap();

        let outcome = ws.update(|e| e.remove_node("a"), &ValidateOptions::default()).unwrap();
        assert_eq!(outcome.patch.edge_remove(), &["e1".to_string()]);
        assert_eq!(ws.graph().edges.len(), 0);
        assert_eq!(ws.graph().nodes.len(), 1);
    }

    // A raw multi-category patch that fails partway through must leave the
    // workspace exactly at G0, not with the earlier-processed ids published.
    #[test]
    fn apply_patch_rolls_back_fully_on_mid_patch_failure() {
        let mut ws = Workspace::new();
        ws.update(|e| e.create_node(node_with_output("a", "a.out")), &ValidateOptions::default()).unwrap();
        let before = ws.graph().clone();

        let err = ws
            .apply_patch(
                Patch {
                    node_add: Some(vec![
                        node_with_input("b", "b.in"),
                        node_with_output("a", "a.out2"), // duplicate id: fails after "b" is inserted
                    ]),
                    ..Default::default()
                },
                &ValidateOptions::default(),
            )
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateId);
        assert!(!ws.graph().nodes.contains_key("b"), "the partially-applied add must not survive the failed patch");
        assert_eq!(ws.graph(), &before);
    }

    // Graph-level metadata must survive both a commit and a rollback, since
    // both paths re-snapshot from the store.
    #[test]
    fn graph_metadata_survives_commit_and_rollback() {
        let mut graph = Graph::empty();
        graph.metadata = Some(serde_json::json!({"project": "demo"}));
        let mut ws = Workspace::from_graph(graph.clone());
        assert_eq!(ws.graph().metadata, graph.metadata);

        ws.update(|e| e.create_node(node_with_output("a", "a.out")), &ValidateOptions::default()).unwrap();
        assert_eq!(ws.graph().metadata, graph.metadata, "metadata must survive a commit");

        let err = ws
            .update(
                |e| {
                    e.create_edge(Edge {
                        id: "bad".into(),
                        source: Reference::new("a", "a.out"),
                        target: Reference::new("missing", "missing.in"),
                        metadata: None,
                    })
                },
                &ValidateOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(ws.graph().metadata, graph.metadata, "metadata must survive a rollback");
    }

    // True call-reentrancy is already rejected by the borrow checker (the
    // closure cannot also hold `&mut self`); this only exercises that the
    // guard resets correctly so a workspace remains usable afterwards.
    #[test]
    fn transacting_flag_resets_after_commit_and_after_abort() {
        let mut ws = Workspace::new();
        ws.update(
            |editor| editor.create_node(node_with_output("a", "a.out")),
            &ValidateOptions::default(),
        )
        .unwrap();
        assert!(ws
            .update(
                |editor| editor.create_node(node_with_input("b", "b.in")),
                &ValidateOptions::default(),
            )
            .is_ok());
    }
}
