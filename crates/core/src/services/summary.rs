//! Geometry summaries: topology counts, properties and content flags for a
//! loaded model, as reported by the kernel that loaded it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{BoundingBox, Units};
use crate::services::backends::{BackendError, BackendRegistry, KernelSummary};
use crate::services::ingest::LoadedModel;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Unknown backend for model {model_id}: {backend}")]
    UnknownBackend { model_id: String, backend: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySummary {
    pub model_id: String,
    pub units: Units,
    pub solids: u64,
    pub shells: u64,
    pub faces: u64,
    pub edges: u64,
    pub vertices: u64,
    pub bounding_box: Option<BoundingBox>,
    pub surface_area: Option<f64>,
    pub volume: Option<f64>,
    pub has_pmi: bool,
    pub has_assemblies: bool,
    pub has_curves: bool,
    pub has_surfaces: bool,
    pub file_size: u64,
    pub backend: String,
    pub warnings: Vec<String>,
}

impl GeometrySummary {
    /// Stand-in cached when analysis fails: unknown units, zero counts, and
    /// the failure as the only warning.
    pub fn placeholder(model_id: &str, error: &str) -> Self {
        let units = [("angle", "unknown"), ("length", "unknown")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            model_id: model_id.to_string(),
            units,
            solids: 0,
            shells: 0,
            faces: 0,
            edges: 0,
            vertices: 0,
            bounding_box: None,
            surface_area: None,
            volume: None,
            has_pmi: false,
            has_assemblies: false,
            has_curves: false,
            has_surfaces: false,
            file_size: 0,
            backend: String::new(),
            warnings: vec![format!("Analysis failed: {error}")],
        }
    }

    /// Combine kernel output with what the model already knows, adding
    /// advisory warnings for suspicious or missing data.
    pub fn from_kernel(model: &LoadedModel, kernel: KernelSummary) -> Self {
        let mut warnings = Vec::new();
        if kernel.faces == 0 && kernel.edges > 0 {
            warnings.push("Model contains only wireframe geometry (no surfaces)".to_string());
        }
        if kernel.solids == 0 && kernel.faces > 0 {
            warnings.push("Model contains surface geometry but no solids".to_string());
        }
        if kernel.bounding_box.is_none() {
            warnings.push("Could not compute bounding box".to_string());
        }
        if kernel.surface_area.is_none() {
            warnings.push("Could not compute surface area".to_string());
        }
        if kernel.volume.is_none() {
            warnings.push("Could not compute volume".to_string());
        }

        Self {
            model_id: model.model_id.clone(),
            units: model.units.clone(),
            solids: kernel.solids,
            shells: kernel.shells,
            faces: kernel.faces,
            edges: kernel.edges,
            vertices: kernel.vertices,
            bounding_box: kernel.bounding_box,
            surface_area: kernel.surface_area,
            volume: kernel.volume,
            has_pmi: kernel.has_pmi,
            has_assemblies: kernel.has_assemblies,
            has_curves: kernel.has_curves,
            has_surfaces: kernel.has_surfaces,
            file_size: model.file_size(),
            backend: model.backend.clone(),
            warnings,
        }
    }
}

/// Computes a summary for a loaded model.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, model: &LoadedModel) -> Result<GeometrySummary, SummaryError>;
}

/// Summarizer that asks the backend which produced the model's handle.
pub struct KernelSummarizer {
    registry: Arc<BackendRegistry>,
}

impl KernelSummarizer {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }
}

impl Summarizer for KernelSummarizer {
    fn summarize(&self, model: &LoadedModel) -> Result<GeometrySummary, SummaryError> {
        let backend = self.registry.get(&model.backend).ok_or_else(|| {
            SummaryError::UnknownBackend {
                model_id: model.model_id.clone(),
                backend: model.backend.clone(),
            }
        })?;
        tracing::info!(model_id = %model.model_id, backend = %model.backend, "generating geometry summary");
        let kernel = backend.summarize(&model.handle)?;
        let summary = GeometrySummary::from_kernel(model, kernel);
        tracing::info!(
            model_id = %model.model_id,
            faces = summary.faces,
            edges = summary.edges,
            vertices = summary.vertices,
            warnings = summary.warnings.len(),
            "geometry summary completed"
        );
        Ok(summary)
    }
}
