use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::model::Attrs;
use crate::services::backends::tool::{fake_output, find_on_path, run_tool, tool_version};
use crate::services::backends::{
    BackendError, BackendInfo, GeometryHandle, KernelBackend, KernelLoad, KernelSummary,
};

const NAME: &str = "occt";
const TOOL_NAME: &str = "occt-stepgraph";

/// Env var pointing directly at the `occt-stepgraph` executable.
pub const OCCT_BIN_ENV: &str = "CADGRAPH_OCCT_BIN";
/// Test hooks: fixed version string, and JSON fixture files replacing the
/// `load` and `summarize` tool output.
pub const OCCT_FAKE_VERSION_ENV: &str = "CADGRAPH_OCCT_FAKE_VERSION";
pub const OCCT_FAKE_LOAD_ENV: &str = "CADGRAPH_OCCT_FAKE_LOAD";
pub const OCCT_FAKE_SUMMARY_ENV: &str = "CADGRAPH_OCCT_FAKE_SUMMARY";

/// Open CASCADE backend driving the `occt-stepgraph` helper, which reads
/// STEP through `STEPControl_Reader` and answers in JSON.
pub struct OcctBackend {
    configured: Option<PathBuf>,
}

/// Geometry held by the OCCT backend: the helper is stateless, so the handle
/// remembers which file and tool to ask again at summary time.
#[derive(Debug, Clone)]
pub struct OcctShape {
    pub source: PathBuf,
    pub tool: PathBuf,
    pub roots: u64,
}

#[derive(Debug, Deserialize)]
struct LoadOutput {
    #[serde(default)]
    nb_roots: u64,
    #[serde(default)]
    length_unit: Option<String>,
    #[serde(default)]
    reader_type: Option<String>,
    #[serde(default)]
    occt_version: Option<String>,
}

impl OcctBackend {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }

    /// Precedence: configured path, `CADGRAPH_OCCT_BIN`, then PATH lookup.
    fn resolve_tool(&self) -> Option<PathBuf> {
        if let Some(path) = self.configured.as_ref().filter(|p| p.is_file()) {
            return Some(path.clone());
        }
        if let Some(path) = std::env::var_os(OCCT_BIN_ENV).map(PathBuf::from) {
            if path.is_file() {
                return Some(path);
            }
        }
        find_on_path(TOOL_NAME)
    }

    fn tool_or_default(&self) -> PathBuf {
        self.resolve_tool().unwrap_or_else(|| PathBuf::from(TOOL_NAME))
    }

    fn version(&self, tool: &Path) -> Result<String, String> {
        if let Some(fake) = std::env::var_os(OCCT_FAKE_VERSION_ENV) {
            return Ok(fake.to_string_lossy().to_string());
        }
        tool_version(tool, "--version")
    }
}

impl KernelBackend for OcctBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> Option<BackendInfo> {
        if let Some(fake) = std::env::var_os(OCCT_FAKE_VERSION_ENV) {
            return Some(BackendInfo {
                name: NAME.to_string(),
                version: fake.to_string_lossy().to_string(),
                path: self.resolve_tool(),
            });
        }
        let tool = self.resolve_tool()?;
        match tool_version(&tool, "--version") {
            Ok(version) => Some(BackendInfo { name: NAME.to_string(), version, path: Some(tool) }),
            Err(err) => {
                tracing::debug!(tool = %tool.display(), error = %err, "occt probe failed");
                None
            }
        }
    }

    fn load(&self, path: &Path) -> Result<KernelLoad, BackendError> {
        let tool = self.tool_or_default();
        let body = match fake_output(NAME, OCCT_FAKE_LOAD_ENV)? {
            Some(body) => body,
            None => run_tool(NAME, &tool, [OsStr::new("load"), OsStr::new("--json"), path.as_os_str()], &[])?,
        };
        let output: LoadOutput = serde_json::from_str(&body)
            .map_err(|e| BackendError::invalid_output(NAME, format!("load JSON: {e}")))?;
        if output.nb_roots == 0 {
            return Err(BackendError::failed(NAME, "No geometry roots found in STEP file"));
        }

        let version = match output.occt_version {
            Some(v) => v,
            None => self.version(&tool).unwrap_or_else(|_| "unknown".to_string()),
        };

        let mut metadata = Attrs::new();
        metadata.insert("nb_roots".into(), Value::from(output.nb_roots));
        metadata.insert(
            "reader_type".into(),
            Value::from(output.reader_type.unwrap_or_else(|| "STEPControl_Reader".to_string())),
        );
        metadata.insert("tool_path".into(), Value::from(tool.display().to_string()));

        tracing::debug!(file = %path.display(), roots = output.nb_roots, "occt transferred roots");
        Ok(KernelLoad {
            handle: GeometryHandle::new(OcctShape {
                source: path.to_path_buf(),
                tool,
                roots: output.nb_roots,
            }),
            version,
            length_unit: output.length_unit,
            metadata,
        })
    }

    fn summarize(&self, handle: &GeometryHandle) -> Result<KernelSummary, BackendError> {
        let shape = handle
            .downcast_ref::<OcctShape>()
            .ok_or_else(|| BackendError::ForeignHandle(NAME.to_string()))?;
        let body = match fake_output(NAME, OCCT_FAKE_SUMMARY_ENV)? {
            Some(body) => body,
            None => run_tool(
                NAME,
                &shape.tool,
                [OsStr::new("summarize"), OsStr::new("--json"), shape.source.as_os_str()],
                &[],
            )?,
        };
        parse_summary(&body)
    }
}

fn parse_summary(body: &str) -> Result<KernelSummary, BackendError> {
    let mut summary: KernelSummary = serde_json::from_str(body)
        .map_err(|e| BackendError::invalid_output(NAME, format!("summary JSON: {e}")))?;
    // Older helper builds only report counts.
    summary.has_curves |= summary.edges > 0;
    summary.has_surfaces |= summary.faces > 0;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_flags_follow_counts() {
        let summary = parse_summary(r#"{"solids":1,"faces":6,"edges":12,"vertices":8}"#).unwrap();
        assert!(summary.has_curves);
        assert!(summary.has_surfaces);
        assert!(summary.bounding_box.is_none());
    }

    #[test]
    fn garbage_summary_is_invalid_output() {
        let err = parse_summary("not json").unwrap_err();
        assert!(matches!(err, BackendError::InvalidOutput { .. }));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let backend = OcctBackend::new(None);
        let err = backend.summarize(&GeometryHandle::new(42_u32)).unwrap_err();
        assert!(matches!(err, BackendError::ForeignHandle(_)));
    }
}
