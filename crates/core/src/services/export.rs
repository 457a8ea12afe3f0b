//! View export. Until a tessellator exists this emits structurally valid
//! but empty glTF 2.0 documents.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::ingest::LoadedModel;

const GENERATOR: &str = "cadgraph placeholder exporter";
const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const JSON_CHUNK_TYPE: &[u8; 4] = b"JSON";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}. Use 'glb' or 'gltf'")]
    UnsupportedFormat(String),

    #[error("Failed to write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode export: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Glb,
    Gltf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Glb => "glb",
            ExportFormat::Gltf => "gltf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Glb => "model/gltf-binary",
            ExportFormat::Gltf => "model/gltf+json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "glb" => Ok(ExportFormat::Glb),
            "gltf" => Ok(ExportFormat::Gltf),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Outcome of one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    pub model_id: String,
    pub format: ExportFormat,
    /// `file://<abs path>` when written, `memory://<model_id>.<ext>` otherwise.
    pub uri: String,
    pub mime_type: String,
    pub size_bytes: usize,
    /// GLB payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// glTF document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Export a view of `model`, writing to `output_path` when given.
pub fn export_view(
    model: &LoadedModel,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<ExportResult, ExportError> {
    tracing::info!(model_id = %model.model_id, format = %format, "exporting model view");
    let model_id = model.model_id.as_str();

    let (bytes, data_base64, data) = match format {
        ExportFormat::Glb => {
            let bytes = glb_placeholder(model_id)?;
            let encoded = STANDARD.encode(&bytes);
            (bytes, Some(encoded), None)
        }
        ExportFormat::Gltf => {
            let doc = gltf_document(model_id);
            let bytes = serde_json::to_vec_pretty(&doc)?;
            (bytes, None, Some(doc))
        }
    };

    let uri = match output_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|source| ExportError::Io { path: parent.to_path_buf(), source })?;
            }
            fs::write(path, &bytes)
                .map_err(|source| ExportError::Io { path: path.to_path_buf(), source })?;
            let abs = fs::canonicalize(path)
                .map_err(|source| ExportError::Io { path: path.to_path_buf(), source })?;
            format!("file://{}", abs.display())
        }
        None => format!("memory://{model_id}.{}", format.extension()),
    };

    tracing::info!(model_id, size_bytes = bytes.len(), uri = %uri, "placeholder export generated");
    Ok(ExportResult {
        model_id: model_id.to_string(),
        format,
        uri,
        mime_type: format.mime_type().to_string(),
        size_bytes: bytes.len(),
        data_base64,
        data,
    })
}

/// Empty scene with one named node and one primitive-less mesh.
pub fn gltf_document(model_id: &str) -> Value {
    json!({
        "asset": {"version": "2.0", "generator": GENERATOR},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": format!("Model_{model_id}"), "mesh": 0}],
        "meshes": [{"name": format!("Mesh_{model_id}"), "primitives": []}],
        "accessors": [],
        "bufferViews": [],
        "buffers": []
    })
}

/// GLB container: 12-byte header followed by a single JSON chunk padded
/// with spaces to a 4-byte boundary.
pub fn glb_placeholder(model_id: &str) -> Result<Vec<u8>, ExportError> {
    let mut json_bytes = serde_json::to_vec(&gltf_document(model_id))?;
    let padding = (4 - json_bytes.len() % 4) % 4;
    json_bytes.extend(std::iter::repeat(b' ').take(padding));

    let total = GLB_HEADER_LEN + CHUNK_HEADER_LEN + json_bytes.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(JSON_CHUNK_TYPE);
    out.extend_from_slice(&json_bytes);
    Ok(out)
}
