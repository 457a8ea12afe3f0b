//! Core data model (IR) for ingested CAD models.
//!
//! The IR is a small typed graph:
//! - `Node`: a geometric or semantic entity (assembly, part, face, unit, ...)
//! - `Edge`: a typed relationship between two nodes
//! - `Ir`: the root aggregate owning nodes, edges, units, provenance and
//!   validation state
//!
//! Construction is tolerant (inconsistencies are recorded in
//! `ValidationInfo::errors`) while the mutating API (`Ir::add_node`,
//! `Ir::add_edge`) is strict and fails with a `GraphError` without applying
//! anything.

use std::collections::BTreeMap;

use thiserror::Error;

mod edge;
mod geometry;
mod ir;
mod kinds;
mod node;

pub use edge::Edge;
pub use geometry::BoundingBox;
pub use ir::{Ir, IrParts, ValidationInfo};
pub use kinds::{EdgeType, NodeType};
pub use node::Node;

/// Version of the IR document layout written by this crate.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Open-ended attribute bag attached to nodes and edges.
///
/// Backed by `serde_json::Map` with insertion order preserved, so the
/// non-canonical encoding can reproduce the order attributes were set in.
pub type Attrs = serde_json::Map<String, serde_json::Value>;

/// Unit mapping (`length` -> `mm`, `angle` -> `deg`, ...).
pub type Units = BTreeMap<String, String>;

/// Free-form provenance mapping recorded alongside an IR.
pub type Provenance = serde_json::Map<String, serde_json::Value>;

/// Units assumed when nothing better is known about a model.
pub fn default_units() -> Units {
    let mut units = Units::new();
    units.insert("length".to_string(), "mm".to_string());
    units.insert("angle".to_string(), "deg".to_string());
    units
}

/// Invariant violations raised by the strict graph API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node with ID {0} already exists")]
    DuplicateNodeId(String),

    #[error("Source node {0} does not exist")]
    UnknownSourceNode(String),

    #[error("Destination node {0} does not exist")]
    UnknownDestinationNode(String),

    #[error("Edge source and destination cannot be empty")]
    EmptyEndpoint,

    #[error("Self-loops are not allowed (node {0})")]
    SelfLoop(String),
}
