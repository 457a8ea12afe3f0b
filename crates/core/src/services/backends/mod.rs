//! Geometry-kernel backends.
//!
//! Each backend wraps one external tool that can read CAD exchange files.
//! The ingestion pipeline walks a `BackendRegistry` in priority order,
//! probing each backend and asking the first available one to load the file.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendPaths;
use crate::model::{Attrs, BoundingBox};

#[cfg(feature = "freecad-backend")]
pub mod freecad;
#[cfg(feature = "occt-backend")]
pub mod occt;
mod tool;

#[cfg(feature = "freecad-backend")]
pub use freecad::FreecadBackend;
#[cfg(feature = "occt-backend")]
pub use occt::OcctBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend {0} is not available")]
    Unavailable(String),

    #[error("{backend} failed: {message}")]
    Failed { backend: String, message: String },

    #[error("{backend} produced unreadable output: {message}")]
    InvalidOutput { backend: String, message: String },

    #[error("Geometry handle was not created by {0}")]
    ForeignHandle(String),
}

impl BackendError {
    pub fn failed(backend: &str, message: impl Into<String>) -> Self {
        Self::Failed { backend: backend.to_string(), message: message.into() }
    }

    pub fn invalid_output(backend: &str, message: impl Into<String>) -> Self {
        Self::InvalidOutput { backend: backend.to_string(), message: message.into() }
    }
}

/// Identity of a backend whose tool was found in the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Opaque reference to kernel-owned geometry.
///
/// Only the backend that produced a handle knows its concrete type; everyone
/// else just carries it around.
#[derive(Clone)]
pub struct GeometryHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl GeometryHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self { inner: Arc::new(value) }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for GeometryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GeometryHandle(..)")
    }
}

/// What a backend returns from a successful load.
#[derive(Debug, Clone)]
pub struct KernelLoad {
    pub handle: GeometryHandle,
    pub version: String,
    /// Length unit reported by the kernel itself; wins over header sniffing.
    pub length_unit: Option<String>,
    /// Extra backend-specific facts merged into the model metadata.
    pub metadata: Attrs,
}

/// Raw topology and property data reported by a kernel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSummary {
    pub solids: u64,
    pub shells: u64,
    pub faces: u64,
    pub edges: u64,
    pub vertices: u64,
    pub bounding_box: Option<BoundingBox>,
    pub surface_area: Option<f64>,
    pub volume: Option<f64>,
    pub has_curves: bool,
    pub has_surfaces: bool,
    pub has_assemblies: bool,
    pub has_pmi: bool,
}

/// Capability interface implemented by every geometry-kernel backend.
///
/// `probe` answers "is this tool usable here" without failing; `load` and
/// `summarize` report problems as `BackendError`.
pub trait KernelBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe(&self) -> Option<BackendInfo>;
    fn load(&self, path: &Path) -> Result<KernelLoad, BackendError>;
    fn summarize(&self, handle: &GeometryHandle) -> Result<KernelSummary, BackendError>;
}

/// Backends in the order the pipeline tries them.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn KernelBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { backends: Vec::new() }
    }

    /// Append a backend at the lowest priority so far. Registering a name
    /// twice replaces the earlier entry in place.
    pub fn register<B: KernelBackend + 'static>(&mut self, backend: B) -> &mut Self {
        self.register_arc(Arc::new(backend))
    }

    pub fn register_arc(&mut self, backend: Arc<dyn KernelBackend>) -> &mut Self {
        match self.backends.iter().position(|b| b.name() == backend.name()) {
            Some(idx) => self.backends[idx] = backend,
            None => self.backends.push(backend),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn KernelBackend> {
        self.backends.iter().find(|b| b.name() == name).map(|b| &**b)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn KernelBackend> {
        self.backends.iter().map(|b| &**b)
    }

    /// Names in priority order.
    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Probe every backend, returning `(name, info)` pairs in priority order.
    pub fn probe_all(&self) -> Vec<(String, Option<BackendInfo>)> {
        self.iter().map(|b| (b.name().to_string(), b.probe())).collect()
    }
}

/// Registry with every compiled-in backend, OCCT first.
pub fn default_backend_registry(paths: &BackendPaths) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    #[cfg(feature = "occt-backend")]
    {
        registry.register(OcctBackend::new(paths.occt.clone()));
    }
    #[cfg(feature = "freecad-backend")]
    {
        registry.register(FreecadBackend::new(paths.freecad.clone()));
    }
    #[cfg(not(any(feature = "occt-backend", feature = "freecad-backend")))]
    let _ = paths;
    registry
}

/// Install hint shown when no backend can be found at all.
pub fn remediation_hint() -> &'static str {
    "Install a geometry kernel tool: put `occt-stepgraph` on PATH (or set CADGRAPH_OCCT_BIN), \
     or install FreeCAD and set FREECAD_CMD / FREECAD_INSTALL_DIR."
}
