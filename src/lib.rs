//! `graph-engine` — an in-memory, typed directed-graph library.
//!
//! An immutable [`model::Graph`] snapshot model, a transactional
//! [`workspace::Workspace`] that produces fact-level [`patch::Patch`]
//! descriptions with automatic rollback on failure, a rules-based
//! [`validate::Validator`] that emits structured diagnostics, an
//! incremental [`lookup::Lookup`] index mirroring the authoritative
//! [`store::Store`], and an [`impact`] pass that extracts affected
//! sub-graphs after a change.
//!
//! No execution or scheduling of the graph, no content validation of data
//! flowing through endpoints, no persistence layer beyond the canonical
//! `…Value` serialization forms, and no concurrent multi-writer support —
//! a [`workspace::Workspace`] has a single logical writer.
//!
//! # Modules
//!
//! - [`model`]    — immutable value types (`Graph`, `Node`, `Edge`,
//!   `Endpoint`, `Contract`, `Reference`) and their canonical wire forms
//! - [`patch`]    — fact-level add/remove/replace change records
//! - [`index`]    — the id-map/adjacency-list mutation primitive shared by
//!   `Store` and `Lookup`
//! - [`store`]    — the mutable authoritative index; the only place hard
//!   structural errors are raised
//! - [`lookup`]   — the incremental secondary index used during a
//!   transaction
//! - [`validate`] — ordered rules producing structured diagnostics
//! - [`workspace`] — the transactional writer: edit, validate, commit or
//!   roll back
//! - [`impact`]   — seed selection and BFS propagation over a patch
//! - [`error`]    — `EngineError` / `ErrorCode`
//!
//! # Entry points
//!
//! Most callers only need [`workspace::Workspace`]: construct one with
//! [`workspace::Workspace::new`] or [`workspace::Workspace::from_graph`],
//! then drive edits through [`workspace::Workspace::update`] or the
//! [`workspace::Workspace::apply_patch`] convenience wrapper. Read access
//! to the live graph and ad-hoc impact analysis go through
//! [`workspace::Workspace::graph`] and [`impact::analyze_impact`]
//! respectively; [`store::Store`] and [`validate::Validator`] are exposed
//! directly for callers that want the lower-level pieces without a
//! transaction wrapper.

pub mod error;
pub mod impact;
pub mod index;
pub mod lookup;
pub mod model;
pub mod patch;
pub mod store;
pub mod validate;
pub mod workspace;

pub use error::{EngineError, ErrorCode};
pub use impact::{analyze_impact, analyze_impact_with, Direction, ImpactOptions, ImpactResult, ImpactSemantics};
pub use model::{Contract, Edge, Endpoint, EndpointRole, Graph, GraphValue, Node, Reference};
pub use patch::Patch;
pub use store::{GraphState, Store, UndoPatch};
pub use validate::{DiagLevel, Diagnostic, DiagnosticTarget, Rule, ValidateOptions, Validator};
pub use workspace::{Editor, UpdateOutcome, Workspace};
