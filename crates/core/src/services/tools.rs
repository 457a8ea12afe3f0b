//! Host-facing operations over a shared session.
//!
//! Each function returns a serde-serializable report so a CLI, an RPC layer
//! or a test can present it however it likes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{dump_jsonl, CodecError};
use crate::config::CadgraphConfig;
use crate::model::{BoundingBox, Ir, Units};
use crate::services::export::{export_view, ExportError, ExportFormat, ExportResult};
use crate::services::ir_builder::{build_ir, default_generator};
use crate::services::session::{SessionError, SessionStats, SharedSession};
use crate::services::summary::GeometrySummary;

/// Operations a host can expose, by their public names.
pub const AVAILABLE_TOOLS: [&str; 4] = ["load_step", "summarize_model", "export_view", "session_info"];

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

fn require_non_empty(name: &'static str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidParameter { name, reason: "cannot be empty".to_string() });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub model_id: String,
    pub file_path: PathBuf,
    pub units: Units,
    pub backend: String,
    pub backend_version: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<String>,
    pub session_stats: SessionStats,
}

pub fn load_model(session: &SharedSession, path: &Path) -> Result<LoadReport, ToolError> {
    require_non_empty("path", &path.to_string_lossy())?;
    let model = session.load(path)?;
    Ok(LoadReport {
        model_id: model.model_id.clone(),
        file_path: model.file_path.clone(),
        units: model.units.clone(),
        backend: model.backend.clone(),
        backend_version: model.backend_version.clone(),
        file_size: model.file_size(),
        sha256: model.sha256().map(str::to_string),
        advisories: model.advisories.clone(),
        session_stats: session.stats(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyCounts {
    pub solids: u64,
    pub shells: u64,
    pub faces: u64,
    pub edges: u64,
    pub vertices: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryProperties {
    pub bounding_box: Option<BoundingBox>,
    pub surface_area: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFlags {
    pub has_pmi: bool,
    pub has_assemblies: bool,
    pub has_curves: bool,
    pub has_surfaces: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub file_size: u64,
    pub backend: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeReport {
    pub model_id: String,
    pub units: Units,
    pub topology: TopologyCounts,
    pub properties: GeometryProperties,
    pub analysis: ContentFlags,
    pub metadata: SummaryMetadata,
    pub ir_path: PathBuf,
    pub ir_valid: bool,
}

impl SummarizeReport {
    fn new(summary: &GeometrySummary, ir_path: PathBuf, ir_valid: bool) -> Self {
        Self {
            model_id: summary.model_id.clone(),
            units: summary.units.clone(),
            topology: TopologyCounts {
                solids: summary.solids,
                shells: summary.shells,
                faces: summary.faces,
                edges: summary.edges,
                vertices: summary.vertices,
            },
            properties: GeometryProperties {
                bounding_box: summary.bounding_box,
                surface_area: summary.surface_area,
                volume: summary.volume,
            },
            analysis: ContentFlags {
                has_pmi: summary.has_pmi,
                has_assemblies: summary.has_assemblies,
                has_curves: summary.has_curves,
                has_surfaces: summary.has_surfaces,
            },
            metadata: SummaryMetadata {
                file_size: summary.file_size,
                backend: summary.backend.clone(),
                warnings: summary.warnings.clone(),
            },
            ir_path,
            ir_valid,
        }
    }
}

/// Summarize a cached model and build its IR without writing anything.
pub fn summary_ir(session: &SharedSession, model_id: &str) -> Result<(GeometrySummary, Ir), ToolError> {
    require_non_empty("model_id", model_id)?;
    let summary = session.summarize(model_id)?;
    let ir = build_ir(model_id, &summary, &default_generator());
    Ok((summary, ir))
}

/// Summarize a cached model and write its IR canonically to
/// `<out_dir>/<model_id>.jsonl`. Without `out_dir` the configured output
/// directory (or the system temp dir) is used.
pub fn summarize_model(
    session: &SharedSession,
    model_id: &str,
    out_dir: Option<&Path>,
    config: &CadgraphConfig,
) -> Result<SummarizeReport, ToolError> {
    let (summary, ir) = summary_ir(session, model_id)?;
    let out_dir = out_dir.map(Path::to_path_buf).unwrap_or_else(|| config.resolved_output_dir());
    let ir_path = out_dir.join(format!("{model_id}.jsonl"));
    dump_jsonl(&ir, &ir_path, true)?;
    tracing::info!(model_id, path = %ir_path.display(), "IR written");
    Ok(SummarizeReport::new(&summary, ir_path, ir.is_valid()))
}

/// Export a cached model. `format` is parsed case-insensitively.
pub fn export_model(
    session: &SharedSession,
    model_id: &str,
    format: &str,
    output_path: Option<&Path>,
) -> Result<ExportResult, ToolError> {
    require_non_empty("model_id", model_id)?;
    let format: ExportFormat = format.parse()?;
    let model = session.get(model_id).ok_or_else(|| SessionError::NotFound(model_id.to_string()))?;
    let result = export_view(&model, format, output_path).map_err(|err| {
        tracing::error!(model_id, format = %format, error = %err, "export failed");
        err
    })?;
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDetail {
    pub model_id: String,
    pub file_path: PathBuf,
    pub units: Units,
    pub backend: String,
    pub has_summary: bool,
    /// Face/edge/vertex counts, once summarized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_stats: SessionStats,
    pub models: Vec<ModelDetail>,
    pub available_tools: Vec<String>,
}

pub fn session_info(session: &SharedSession) -> SessionInfo {
    session.read(|s| {
        let stats = s.stats();
        let models = stats
            .model_ids
            .iter()
            .filter_map(|id| s.get(id))
            .map(|model| {
                let summary = s.get_summary(&model.model_id);
                ModelDetail {
                    model_id: model.model_id.clone(),
                    file_path: model.file_path.clone(),
                    units: model.units.clone(),
                    backend: model.backend.clone(),
                    has_summary: summary.is_some(),
                    topology: summary.map(|sum| {
                        BTreeMap::from([
                            ("faces".to_string(), sum.faces),
                            ("edges".to_string(), sum.edges),
                            ("vertices".to_string(), sum.vertices),
                        ])
                    }),
                }
            })
            .collect();
        SessionInfo {
            session_stats: stats,
            models,
            available_tools: AVAILABLE_TOOLS.iter().map(|t| t.to_string()).collect(),
        }
    })
}
