//! Canonical ordering rules for IR documents.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::model::{Edge, Ir, IrParts, Node};

/// Sort key for nodes: `(type priority, id)`.
pub fn node_sort_key(node: &Node) -> (u32, &str) {
    (node.node_type().priority(), node.id())
}

/// Sort key for edges: `(src, dst, type)`.
pub fn edge_sort_key(edge: &Edge) -> (&str, &str, &str) {
    (edge.src(), edge.dst(), edge.edge_type().as_str())
}

pub fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    node_sort_key(a).cmp(&node_sort_key(b))
}

pub fn compare_edges(a: &Edge, b: &Edge) -> Ordering {
    edge_sort_key(a).cmp(&edge_sort_key(b))
}

/// Recursively sort every object's keys. Arrays keep their element order but
/// their elements are canonicalized too; scalars pass through.
pub fn canonicalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonicalize_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_value).collect()),
        other => other.clone(),
    }
}

pub fn canonicalize_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let mut out = Map::new();
    for key in keys {
        out.insert(key.clone(), canonicalize_value(&map[key]));
    }
    out
}

/// Return a copy of `ir` in canonical form: nodes and edges sorted, every
/// attribute and provenance mapping key-sorted.
pub fn canonicalize(ir: &Ir) -> Ir {
    let mut nodes: Vec<Node> = ir.nodes().to_vec();
    nodes.sort_by(compare_nodes);
    for node in &mut nodes {
        node.attrs = canonicalize_map(&node.attrs);
    }

    let mut edges: Vec<Edge> = ir.edges().to_vec();
    edges.sort_by(compare_edges);
    for edge in &mut edges {
        edge.attrs = canonicalize_map(&edge.attrs);
    }

    Ir::from_parts(IrParts {
        model_id: ir.model_id.clone(),
        nodes,
        edges,
        units: ir.units.clone(),
        provenance: canonicalize_map(&ir.provenance),
        validation: ir.validation().clone(),
        bounding_box: ir.bounding_box,
    })
}
