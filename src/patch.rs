//! Fact-level change records.
//!
//! A [`Patch`] describes *what changed* without saying how it was produced.
//! [`Store::apply`](crate::store::Store::apply) is the only thing that turns
//! one into index mutations; this module only knows the patch's own shape
//! and the few checks that don't require store state (empty-ness, per-patch
//! id conflicts).

use crate::error::EngineError;
use crate::model::{Edge, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fact-level description of add/remove/replace operations on nodes and
/// edges. Every field is optional; an absent field means "no change of that
/// kind". `UndoPatch` is the same shape (see [`crate::store::UndoPatch`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_add: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_remove: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_replace: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_add: Option<Vec<Edge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_remove: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_replace: Option<Vec<Edge>>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.node_add.as_ref().map_or(true, Vec::is_empty)
            && self.node_remove.as_ref().map_or(true, Vec::is_empty)
            && self.node_replace.as_ref().map_or(true, Vec::is_empty)
            && self.edge_add.as_ref().map_or(true, Vec::is_empty)
            && self.edge_remove.as_ref().map_or(true, Vec::is_empty)
            && self.edge_replace.as_ref().map_or(true, Vec::is_empty)
    }

    pub fn node_add(&self) -> &[Node] {
        self.node_add.as_deref().unwrap_or(&[])
    }
    pub fn node_remove(&self) -> &[String] {
        self.node_remove.as_deref().unwrap_or(&[])
    }
    pub fn node_replace(&self) -> &[Node] {
        self.node_replace.as_deref().unwrap_or(&[])
    }
    pub fn edge_add(&self) -> &[Edge] {
        self.edge_add.as_deref().unwrap_or(&[])
    }
    pub fn edge_remove(&self) -> &[String] {
        self.edge_remove.as_deref().unwrap_or(&[])
    }
    pub fn edge_replace(&self) -> &[Edge] {
        self.edge_replace.as_deref().unwrap_or(&[])
    }

    /// Every node id touched by this patch, in add/remove/replace order.
    pub fn touched_node_ids(&self) -> impl Iterator<Item = &str> {
        self.node_add()
            .iter()
            .map(|n| n.id.as_str())
            .chain(self.node_remove().iter().map(|s| s.as_str()))
            .chain(self.node_replace().iter().map(|n| n.id.as_str()))
    }

    /// Every edge id touched by this patch, in add/remove/replace order.
    pub fn touched_edge_ids(&self) -> impl Iterator<Item = &str> {
        self.edge_add()
            .iter()
            .map(|e| e.id.as_str())
            .chain(self.edge_remove().iter().map(|s| s.as_str()))
            .chain(self.edge_replace().iter().map(|e| e.id.as_str()))
    }

    /// Rejects a patch that names the same node id, or the same edge id,
    /// more than once across its add/remove/replace sets (§4.1 rule 1).
    pub fn validate_no_conflicts(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for id in self.touched_node_ids() {
            if !seen.insert(id) {
                return Err(EngineError::conflicting_patch_id("Node", id));
            }
        }
        let mut seen = HashSet::new();
        for id in self.touched_edge_ids() {
            if !seen.insert(id) {
                return Err(EngineError::conflicting_patch_id("Edge", id));
            }
        }
        Ok(())
    }
}
