//! Runtime configuration shared by the session, the backends and the CLI.
//!
//! Lives (optionally) at `.cadgraph/config.json` or `.cadgraph/config.yaml`
//! under a project root. Every field has a default, so an empty file or no
//! file at all is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory holding the optional config file, relative to a project root.
pub const CONFIG_DIR: &str = ".cadgraph";

/// Capacity used when neither config nor environment say otherwise.
pub const DEFAULT_MAX_MODELS: usize = 10;

/// Env var overriding `max_models`.
pub const MAX_MODELS_ENV: &str = "CADGRAPH_MAX_MODELS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported config format for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Explicit tool locations for the kernel backends. Unset entries fall back
/// to each backend's environment/PATH lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occt: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freecad: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadgraphConfig {
    /// Session cache capacity.
    pub max_models: usize,
    /// Where `summarize` writes IR files when the caller gives no directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub backends: BackendPaths,
    /// `glb` or `gltf`.
    pub default_export_format: String,
}

impl Default for CadgraphConfig {
    fn default() -> Self {
        Self {
            max_models: DEFAULT_MAX_MODELS,
            output_dir: None,
            backends: BackendPaths::default(),
            default_export_format: "glb".to_string(),
        }
    }
}

impl CadgraphConfig {
    /// Apply environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = std::env::var(MAX_MODELS_ENV) {
            self.max_models = parse_max_models(&raw)?;
        }
        Ok(self)
    }

    /// Directory for IR output: configured `output_dir` or the system temp dir.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parse_max_models(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue { key: MAX_MODELS_ENV.to_string(), value: raw.to_string() }),
    }
}

/// Load a config file, choosing the parser by extension.
pub fn load_config(path: &Path) -> Result<CadgraphConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let body = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

    let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
    let config = match ext.as_deref() {
        Some("json") => serde_json::from_str(&body)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?,
        Some("yaml") | Some("yml") => {
            if body.trim().is_empty() {
                CadgraphConfig::default()
            } else {
                serde_yaml::from_str(&body)
                    .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })?
            }
        }
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Look for `.cadgraph/config.json`, then `.cadgraph/config.yaml`, under
/// `root`. No file means defaults.
pub fn discover_config(root: &Path) -> Result<CadgraphConfig, ConfigError> {
    let dir = root.join(CONFIG_DIR);
    for name in ["config.json", "config.yaml"] {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return load_config(&candidate);
        }
    }
    Ok(CadgraphConfig::default())
}
