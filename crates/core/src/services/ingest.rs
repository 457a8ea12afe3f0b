//! Ingestion pipeline: validate a source file, then hand it to the first
//! backend that can load it.
//!
//! Per request the pipeline goes `Validating -> TryingBackend[1..n] ->
//! Succeeded | ExhaustedAllBackends`. Backends that are not installed are
//! skipped silently; backends that fail (or panic) are logged and the next
//! one is tried.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::{Attrs, Units};
use crate::services::backends::{remediation_hint, BackendRegistry, GeometryHandle};
use crate::services::panic_message;
use crate::units::{detect_units, normalize_unit_name};

/// Magic prefix of ISO 10303-21 (STEP) files.
pub const STEP_SIGNATURE: &str = "ISO-10303-";

const SNIFF_BYTES: u64 = 1024;
const HEADER_MAX_LINES: usize = 52;

/// Local problems with the source file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("STEP file not found: {0}")]
    NotFound(PathBuf),

    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("STEP file is empty: {0}")]
    Empty(PathBuf),

    #[error("Failed to load {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("No geometry kernel backend available (tried: {}). {remediation}", tried.join(", "))]
    BackendUnavailable { tried: Vec<String>, remediation: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A successfully ingested model.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// File stem of the source.
    pub model_id: String,
    pub file_path: PathBuf,
    pub units: Units,
    /// `file_size`, `sha256`, plus whatever the backend reported.
    pub metadata: Attrs,
    pub backend: String,
    pub backend_version: String,
    /// Non-fatal findings such as a missing STEP signature.
    pub advisories: Vec<String>,
    pub handle: GeometryHandle,
}

impl LoadedModel {
    pub fn file_size(&self) -> u64 {
        self.metadata.get("file_size").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn sha256(&self) -> Option<&str> {
        self.metadata.get("sha256").and_then(Value::as_str)
    }
}

/// Ordered-fallback loader over a backend registry.
#[derive(Clone)]
pub struct IngestPipeline {
    registry: Arc<BackendRegistry>,
}

impl IngestPipeline {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn ingest(&self, source: &Path) -> Result<LoadedModel, IngestError> {
        let (path, file_size) = validate_source(source)?;
        let mut advisories = Vec::new();
        if let Some(advisory) = sniff_header(&path) {
            advisories.push(advisory);
        }
        tracing::info!(file = %path.display(), "loading model");

        let mut tried = Vec::new();
        let mut any_available = false;
        let mut last_error: Option<String> = None;

        for backend in self.registry.iter() {
            let name = backend.name();
            tried.push(name.to_string());

            let info = match catch_unwind(AssertUnwindSafe(|| backend.probe())) {
                Ok(Some(info)) => info,
                Ok(None) => {
                    tracing::debug!(backend = name, "backend not available");
                    continue;
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::warn!(backend = name, error = %message, "backend probe panicked");
                    continue;
                }
            };
            any_available = true;

            let attempt = catch_unwind(AssertUnwindSafe(|| backend.load(&path)));
            let load = match attempt {
                Ok(Ok(load)) => load,
                Ok(Err(err)) => {
                    tracing::warn!(backend = name, file = %path.display(), error = %err, "backend load failed");
                    last_error = Some(err.to_string());
                    continue;
                }
                Err(payload) => {
                    let message = format!("{name} panicked: {}", panic_message(payload.as_ref()));
                    tracing::warn!(backend = name, file = %path.display(), error = %message, "backend load panicked");
                    last_error = Some(message);
                    continue;
                }
            };

            let mut units = extract_units(&path);
            if let Some(length) = load.length_unit.as_deref().filter(|u| !u.trim().is_empty()) {
                units.insert("length".to_string(), normalize_unit_name(length));
            }

            let mut metadata = Attrs::new();
            metadata.insert("file_size".into(), Value::from(file_size));
            match sha256_file(&path) {
                Ok(digest) => {
                    metadata.insert("sha256".into(), Value::from(digest));
                }
                Err(err) => tracing::warn!(file = %path.display(), error = %err, "could not hash source"),
            }
            metadata.insert("backend".into(), Value::from(name));
            for (key, value) in load.metadata {
                metadata.entry(key).or_insert(value);
            }

            let backend_version = if load.version.is_empty() { info.version } else { load.version };
            let model = LoadedModel {
                model_id: model_id_for(&path),
                file_path: path.clone(),
                units,
                metadata,
                backend: name.to_string(),
                backend_version,
                advisories,
                handle: load.handle,
            };
            tracing::info!(
                model_id = %model.model_id,
                backend = name,
                file_size,
                "model loaded"
            );
            return Ok(model);
        }

        if !any_available {
            tracing::error!(tried = ?tried, "no geometry kernel backend available");
            return Err(IngestError::BackendUnavailable {
                tried,
                remediation: remediation_hint().to_string(),
            });
        }

        let reason = format!(
            "Failed to load STEP file with available backends: {}",
            last_error.unwrap_or_else(|| "unknown error".to_string())
        );
        Err(SourceError::ParseFailed { path, reason }.into())
    }
}

/// Existence, regular-file and non-empty checks. Returns the absolute path
/// and byte size.
pub fn validate_source(source: &Path) -> Result<(PathBuf, u64), IngestError> {
    if !source.exists() {
        return Err(SourceError::NotFound(source.to_path_buf()).into());
    }
    if !source.is_file() {
        return Err(SourceError::NotAFile(source.to_path_buf()).into());
    }
    let path = fs::canonicalize(source)
        .map_err(|e| IngestError::Io { path: source.to_path_buf(), source: e })?;
    let size = fs::metadata(&path)
        .map_err(|e| IngestError::Io { path: path.clone(), source: e })?
        .len();
    if size == 0 {
        return Err(SourceError::Empty(path).into());
    }
    Ok((path, size))
}

/// Check the first KiB for the STEP signature. A mismatch or read problem
/// is returned as an advisory, never an error.
pub fn sniff_header(path: &Path) -> Option<String> {
    let mut head = Vec::new();
    let read = fs::File::open(path).and_then(|f| f.take(SNIFF_BYTES).read_to_end(&mut head));
    match read {
        Ok(_) if String::from_utf8_lossy(&head).starts_with(STEP_SIGNATURE) => None,
        Ok(_) => {
            tracing::warn!(file = %path.display(), "file does not start with ISO-10303 header");
            Some("File does not start with ISO-10303 header".to_string())
        }
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "could not validate STEP header");
            Some(format!("Could not validate STEP header: {err}"))
        }
    }
}

/// Units from the header section (up to `ENDSEC;`), falling back to the
/// defaults if the file cannot be read.
pub fn extract_units(path: &Path) -> Units {
    match read_header_text(path) {
        Ok(text) => detect_units(&text),
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "could not extract units");
            crate::model::default_units()
        }
    }
}

fn read_header_text(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    while lines.len() < HEADER_MAX_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf).trim().to_string();
        let done = line == "ENDSEC;";
        lines.push(line);
        if done {
            break;
        }
    }
    Ok(lines.join(" "))
}

fn model_id_for(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "model".to_string())
}

/// Hex SHA-256 of a file, streamed.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
