use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cadgraph_core::config::{discover_config, load_config, CadgraphConfig};
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Primary log filter variable; `RUST_LOG` is consulted when it is unset.
pub const LOG_ENV: &str = "CADGRAPH_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Build the log filter. `--verbose` wins over anything in the environment.
pub fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    let directives = env::var(LOG_ENV)
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// parseable for `--json` output.
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let builder =
        tracing_subscriber::fmt().with_env_filter(log_filter(verbose)).with_writer(std::io::stderr);
    let installed = if json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}

/// Load the explicit config file if one was given, otherwise discover
/// `.cadgraph/config.{json,yaml}` under the current directory. Environment
/// overrides are applied last.
pub fn load_cli_config(path: Option<&Path>) -> Result<CadgraphConfig> {
    let config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            discover_config(&cwd)
                .with_context(|| format!("Failed to read config under {}", cwd.display()))?
        }
    };
    config.with_env_overrides().context("Invalid environment override")
}

/// Canonicalize `path` if it exists, otherwise make it absolute against the
/// current working directory.
pub fn canonicalize_or_current(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}

/// `length=mm, angle=deg`
pub fn format_unit_pairs<'a>(units: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    units.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(", ")
}
