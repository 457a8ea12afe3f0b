use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::{
    default_units, BoundingBox, Edge, GraphError, Node, NodeType, Provenance, Units,
    SCHEMA_VERSION,
};

/// Validation state carried by every IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationInfo {
    pub schema_version: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ValidationInfo {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: Utc::now().to_rfc3339(),
            node_count: 0,
            edge_count: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl ValidationInfo {
    /// Warnings never affect validity.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn record_error(&mut self, message: String) {
        if !self.errors.contains(&message) {
            self.errors.push(message);
        }
    }
}

/// Everything needed to assemble an `Ir`; fields not set fall back to the
/// usual defaults.
#[derive(Debug, Clone)]
pub struct IrParts {
    pub model_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub units: Units,
    pub provenance: Provenance,
    pub validation: ValidationInfo,
    pub bounding_box: Option<BoundingBox>,
}

impl IrParts {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            units: default_units(),
            provenance: Provenance::new(),
            validation: ValidationInfo::default(),
            bounding_box: None,
        }
    }
}

/// Root aggregate of the graph representation for one model.
///
/// The IR exclusively owns its nodes and edges; they can only be changed
/// through `add_node`, `add_edge` and `node_mut`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ir {
    pub model_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    pub units: Units,
    pub provenance: Provenance,
    validation: ValidationInfo,
    pub bounding_box: Option<BoundingBox>,
}

impl Ir {
    /// Build an IR with default units, provenance and validation.
    pub fn new(model_id: impl Into<String>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut parts = IrParts::new(model_id);
        parts.nodes = nodes;
        parts.edges = edges;
        Self::from_parts(parts)
    }

    /// Assemble an IR, recomputing counts and recording (not raising) any
    /// structural problems in `validation.errors`.
    pub fn from_parts(parts: IrParts) -> Self {
        let mut ir = Self {
            model_id: parts.model_id,
            nodes: parts.nodes,
            edges: parts.edges,
            units: parts.units,
            provenance: parts.provenance,
            validation: parts.validation,
            bounding_box: parts.bounding_box,
        };
        ir.refresh_counts();
        ir.validate();
        ir
    }

    fn refresh_counts(&mut self) {
        self.validation.node_count = self.nodes.len();
        self.validation.edge_count = self.edges.len();
    }

    /// Advisory structural scan. Messages already present are not repeated,
    /// so re-assembling a decoded IR leaves its error list unchanged.
    fn validate(&mut self) {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id()) {
                duplicates.insert(node.id().to_string());
            }
        }
        if !duplicates.is_empty() {
            let listed: Vec<String> = duplicates.into_iter().collect();
            self.validation.record_error(format!("Duplicate node IDs found: {}", listed.join(", ")));
        }

        let mut problems = Vec::new();
        for edge in &self.edges {
            if let Err(err) = edge.check() {
                problems.push(format!("Invalid edge {} -> {}: {err}", edge.src(), edge.dst()));
            }
            if !seen.contains(edge.src()) {
                problems.push(format!("Edge references unknown source node: {}", edge.src()));
            }
            if !seen.contains(edge.dst()) {
                problems.push(format!("Edge references unknown destination node: {}", edge.dst()));
            }
        }
        // Sorted so the error list does not depend on edge insertion order.
        problems.sort();
        for message in problems {
            self.validation.record_error(message);
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn validation(&self) -> &ValidationInfo {
        &self.validation
    }

    /// Access to warnings/errors. Counts are owned by the IR and get
    /// recomputed on every structural change.
    pub fn validation_mut(&mut self) -> &mut ValidationInfo {
        &mut self.validation
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }

    pub fn get_node_by_id(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    /// Mutable access to a node's attributes; identity stays fixed.
    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id() == node_id)
    }

    pub fn get_nodes_by_type(&self, node_type: &NodeType) -> Vec<&Node> {
        self.nodes.iter().filter(|node| node.node_type() == node_type).collect()
    }

    pub fn get_edges_from_node(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| edge.src() == node_id).collect()
    }

    pub fn get_edges_to_node(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| edge.dst() == node_id).collect()
    }

    /// Append a node; fails without side effects if the id is taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.get_node_by_id(node.id()).is_some() {
            return Err(GraphError::DuplicateNodeId(node.id().to_string()));
        }
        self.nodes.push(node);
        self.refresh_counts();
        Ok(())
    }

    /// Append an edge; both endpoints must already exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.get_node_by_id(edge.src()).is_none() {
            return Err(GraphError::UnknownSourceNode(edge.src().to_string()));
        }
        if self.get_node_by_id(edge.dst()).is_none() {
            return Err(GraphError::UnknownDestinationNode(edge.dst().to_string()));
        }
        self.edges.push(edge);
        self.refresh_counts();
        Ok(())
    }
}
