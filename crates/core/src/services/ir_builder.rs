//! Minimal IR for a summarized model: one root part node carrying the
//! summary as attributes.

use serde_json::{json, Value};

use crate::model::{Ir, IrParts, Node, Provenance};
use crate::services::summary::GeometrySummary;

/// Schema phase recorded in provenance; bumps when the builder starts
/// emitting faces, edges and PMI as separate nodes.
pub const IR_PHASE: &str = "0";

/// Default provenance `generator`.
pub fn default_generator() -> String {
    format!("cadgraph {}", crate::version())
}

/// Build the IR for `model_id` from its summary.
///
/// Summary warnings become IR validation warnings, so a placeholder summary
/// still produces a valid (if empty) IR.
pub fn build_ir(model_id: &str, summary: &GeometrySummary, generator: &str) -> Ir {
    let mut root = Node::part(model_id, Some(format!("{model_id}_root")));
    root.attrs.insert(
        "topology".into(),
        json!({
            "solids": summary.solids,
            "faces": summary.faces,
            "edges": summary.edges,
            "vertices": summary.vertices,
        }),
    );
    root.attrs.insert(
        "analysis".into(),
        json!({
            "has_surfaces": summary.has_surfaces,
            "has_curves": summary.has_curves,
        }),
    );
    root.attrs.insert("backend".into(), Value::from(summary.backend.clone()));
    if let Some(bbox) = summary.bounding_box {
        root.attrs.insert(
            "bounding_box".into(),
            json!({
                "min_x": bbox.min_x,
                "min_y": bbox.min_y,
                "min_z": bbox.min_z,
                "max_x": bbox.max_x,
                "max_y": bbox.max_y,
                "max_z": bbox.max_z,
            }),
        );
    }
    if let Some(area) = summary.surface_area {
        root.attrs.insert("surface_area".into(), Value::from(area));
    }
    if let Some(volume) = summary.volume {
        root.attrs.insert("volume".into(), Value::from(volume));
    }

    let mut provenance = Provenance::new();
    provenance.insert("phase".into(), Value::from(IR_PHASE));
    provenance.insert("generator".into(), Value::from(generator));
    provenance.insert("backend".into(), Value::from(summary.backend.clone()));
    provenance.insert("file_size".into(), Value::from(summary.file_size));

    let mut parts = IrParts::new(model_id);
    parts.nodes = vec![root];
    parts.units = summary.units.clone();
    parts.provenance = provenance;
    parts.validation.warnings.extend(summary.warnings.iter().cloned());
    parts.bounding_box = summary.bounding_box;
    Ir::from_parts(parts)
}
