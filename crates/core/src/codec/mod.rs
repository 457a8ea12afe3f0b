//! Deterministic JSON / JSON-lines serialization of the IR.
//!
//! One IR is one JSON object. In canonical mode nodes, edges and every
//! mapping are sorted so the same graph always produces the same bytes,
//! whatever order it was built in. Non-canonical mode keeps insertion order
//! for inspection and is independent of pretty-printing.
//!
//! Decoding never raises on graph inconsistencies: bad edges or duplicate ids
//! come back as entries in `validation.errors`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    default_units, Attrs, BoundingBox, Edge, EdgeType, Ir, IrParts, Node, NodeType, Provenance,
    Units, ValidationInfo, SCHEMA_VERSION,
};

pub mod canonical;
mod jsonl;

pub use canonical::{canonicalize, canonicalize_value, edge_sort_key, node_sort_key};
pub use jsonl::{batch_dump_jsonl, dump_jsonl, load_jsonl, read_jsonl, write_jsonl};

/// Errors raised while encoding or decoding IR documents.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSONL file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse line {line}: {message}")]
    Decode { line: usize, message: String },

    #[error("Failed to encode IR: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Output options for `encode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Sort nodes, edges and mappings for reproducible output.
    pub canonical: bool,
    /// Indent the JSON. Never used for JSON-lines output.
    pub pretty: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { canonical: true, pretty: false }
    }
}

impl EncodeOptions {
    pub fn canonical() -> Self {
        Self::default()
    }

    pub fn verbatim() -> Self {
        Self { canonical: false, pretty: false }
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IrRecord {
    #[serde(default = "default_schema_version")]
    schema_version: String,
    model_id: String,
    #[serde(default)]
    validation: ValidationRecord,
    #[serde(default = "default_units")]
    units: Units,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
    #[serde(default)]
    provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ValidationRecord {
    created_at: String,
    node_count: usize,
    edge_count: usize,
    is_valid: bool,
    warnings: Vec<String>,
    errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    attrs: Attrs,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeRecord {
    src: String,
    dst: String,
    #[serde(rename = "type")]
    edge_type: EdgeType,
    #[serde(default)]
    attrs: Attrs,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn to_record(ir: &Ir) -> IrRecord {
    let validation = ir.validation();
    IrRecord {
        schema_version: validation.schema_version.clone(),
        model_id: ir.model_id.clone(),
        validation: ValidationRecord {
            created_at: validation.created_at.clone(),
            node_count: validation.node_count,
            edge_count: validation.edge_count,
            is_valid: validation.is_valid(),
            warnings: validation.warnings.clone(),
            errors: validation.errors.clone(),
        },
        units: ir.units.clone(),
        nodes: ir
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                id: node.id().to_string(),
                node_type: node.node_type().clone(),
                attrs: node.attrs.clone(),
            })
            .collect(),
        edges: ir
            .edges()
            .iter()
            .map(|edge| EdgeRecord {
                src: edge.src().to_string(),
                dst: edge.dst().to_string(),
                edge_type: edge.edge_type().clone(),
                attrs: edge.attrs.clone(),
            })
            .collect(),
        provenance: ir.provenance.clone(),
        bounding_box: ir.bounding_box,
    }
}

fn from_record(record: IrRecord) -> Ir {
    let validation = ValidationInfo {
        schema_version: record.schema_version,
        created_at: record.validation.created_at,
        node_count: record.validation.node_count,
        edge_count: record.validation.edge_count,
        warnings: record.validation.warnings,
        errors: record.validation.errors,
    };

    let nodes = record
        .nodes
        .into_iter()
        .map(|node| Node::new(node.id, node.node_type, node.attrs))
        .collect();
    let edges = record
        .edges
        .into_iter()
        .map(|edge| Edge::unchecked(edge.src, edge.dst, edge.edge_type, edge.attrs))
        .collect();

    Ir::from_parts(IrParts {
        model_id: record.model_id,
        nodes,
        edges,
        units: record.units,
        provenance: record.provenance,
        validation,
        bounding_box: record.bounding_box,
    })
}

/// Convert an IR into a JSON value, optionally in canonical form.
pub fn to_json_value(ir: &Ir, canonical: bool) -> CodecResult<Value> {
    let record = if canonical { to_record(&canonicalize(ir)) } else { to_record(ir) };
    Ok(serde_json::to_value(record)?)
}

/// Encode one IR as a JSON string.
pub fn encode(ir: &Ir, options: EncodeOptions) -> CodecResult<String> {
    let record = if options.canonical { to_record(&canonicalize(ir)) } else { to_record(ir) };
    let out = if options.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    Ok(out)
}

/// Decode a single JSON document. Parse failures report line 1.
pub fn decode(input: &str) -> CodecResult<Ir> {
    decode_line(input, 1)
}

pub(crate) fn decode_line(input: &str, line: usize) -> CodecResult<Ir> {
    let record: IrRecord = serde_json::from_str(input)
        .map_err(|e| CodecError::Decode { line, message: e.to_string() })?;
    Ok(from_record(record))
}
