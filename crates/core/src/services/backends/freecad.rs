use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::model::Attrs;
use crate::services::backends::tool::{run_tool, tool_version};
use crate::services::backends::{
    BackendError, BackendInfo, GeometryHandle, KernelBackend, KernelLoad, KernelSummary,
};

const NAME: &str = "freecad";
const OUTPUT_MARKER: &str = "CADGRAPH_JSON:";

/// Reads the file named by `CADGRAPH_SOURCE` with FreeCAD's bundled OCC and
/// prints one marked JSON line. FreeCAD startup is slow, so everything the
/// summary needs is collected in this single run.
const READ_SCRIPT: &str = r#"
import json, os, Part
shape = Part.Shape()
shape.read(os.environ["CADGRAPH_SOURCE"])
bb = shape.BoundBox
out = {
    "solids": len(shape.Solids),
    "shells": len(shape.Shells),
    "faces": len(shape.Faces),
    "edges": len(shape.Edges),
    "vertices": len(shape.Vertexes),
    "bounding_box": {
        "min_x": bb.XMin, "min_y": bb.YMin, "min_z": bb.ZMin,
        "max_x": bb.XMax, "max_y": bb.YMax, "max_z": bb.ZMax,
    } if bb.isValid() else None,
    "surface_area": shape.Area if shape.Faces else None,
    "volume": shape.Volume if shape.Solids else None,
    "has_curves": len(shape.Edges) > 0,
    "has_surfaces": len(shape.Faces) > 0,
    "has_assemblies": len(shape.Solids) > 1,
}
print("CADGRAPH_JSON:" + json.dumps(out))
"#;

/// Resolve the `freecadcmd` executable.
///
/// Precedence:
/// - explicitly configured path.
/// - `FREECAD_CMD` pointing directly to the executable.
/// - `FREECAD_INSTALL_DIR`, appended with the platform-specific `bin/` name.
fn resolve_freecadcmd(configured: Option<&Path>) -> Result<PathBuf, String> {
    if let Some(path) = configured.filter(|p| p.is_file()) {
        return Ok(path.to_path_buf());
    }

    if let Ok(p) = env::var("FREECAD_CMD") {
        let path = PathBuf::from(p);
        if path.is_file() {
            return Ok(path);
        }
    }

    if let Ok(dir) = env::var("FREECAD_INSTALL_DIR") {
        let bin = PathBuf::from(dir).join("bin");
        let p = if cfg!(windows) { bin.join("FreeCADCmd.exe") } else { bin.join("freecadcmd") };
        if p.is_file() {
            return Ok(p);
        }
    }

    Err("Set FREECAD_CMD (path to freecadcmd) or FREECAD_INSTALL_DIR".to_string())
}

/// Geometry read through FreeCAD. The process exits after reading, so the
/// handle carries the already-computed summary.
#[derive(Debug, Clone)]
pub struct FreecadShape {
    pub source: PathBuf,
    pub summary: KernelSummary,
}

/// FreeCAD backend running `freecadcmd` headless with an inline script.
pub struct FreecadBackend {
    configured: Option<PathBuf>,
}

impl FreecadBackend {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }
}

impl KernelBackend for FreecadBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> Option<BackendInfo> {
        let cmd = resolve_freecadcmd(self.configured.as_deref()).ok()?;
        match tool_version(&cmd, "--version") {
            Ok(version) => Some(BackendInfo { name: NAME.to_string(), version, path: Some(cmd) }),
            Err(err) => {
                tracing::debug!(tool = %cmd.display(), error = %err, "freecad probe failed");
                None
            }
        }
    }

    fn load(&self, path: &Path) -> Result<KernelLoad, BackendError> {
        let cmd = resolve_freecadcmd(self.configured.as_deref())
            .map_err(|msg| BackendError::failed(NAME, msg))?;
        let stdout = run_tool(
            NAME,
            &cmd,
            [OsStr::new("-c"), OsStr::new(READ_SCRIPT)],
            &[("CADGRAPH_SOURCE", path.as_os_str())],
        )?;
        let summary = parse_marked_output(&stdout)?;
        let version = tool_version(&cmd, "--version").unwrap_or_else(|_| "freecad_bundled".to_string());

        let mut metadata = Attrs::new();
        metadata.insert("reader_type".into(), Value::from("Part.Shape.read"));
        metadata.insert("tool_path".into(), Value::from(cmd.display().to_string()));

        Ok(KernelLoad {
            handle: GeometryHandle::new(FreecadShape { source: path.to_path_buf(), summary }),
            version,
            length_unit: Some("mm".to_string()),
            metadata,
        })
    }

    fn summarize(&self, handle: &GeometryHandle) -> Result<KernelSummary, BackendError> {
        handle
            .downcast_ref::<FreecadShape>()
            .map(|shape| shape.summary.clone())
            .ok_or_else(|| BackendError::ForeignHandle(NAME.to_string()))
    }
}

/// FreeCAD prints its own banner and log lines; only the marked line counts.
fn parse_marked_output(stdout: &str) -> Result<KernelSummary, BackendError> {
    let line = stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix(OUTPUT_MARKER))
        .ok_or_else(|| BackendError::invalid_output(NAME, "no result line in freecadcmd output"))?;
    serde_json::from_str(line).map_err(|e| BackendError::invalid_output(NAME, e.to_string()))
}
