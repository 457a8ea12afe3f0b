use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use cadgraph_core::config::CadgraphConfig;
use cadgraph_core::services::backends::{default_backend_registry, remediation_hint};

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub version: String,
    pub max_models: usize,
    pub default_export_format: String,
    pub output_dir: PathBuf,
    /// In fallback order.
    pub backends: Vec<BackendStatus>,
}

/// Probe every compiled-in backend. Order is the ingestion fallback order.
pub fn backend_statuses(config: &CadgraphConfig) -> Vec<BackendStatus> {
    default_backend_registry(&config.backends)
        .probe_all()
        .into_iter()
        .map(|(name, info)| BackendStatus {
            name,
            available: info.is_some(),
            version: info.as_ref().map(|i| i.version.clone()),
            path: info.and_then(|i| i.path),
        })
        .collect()
}

pub fn info_report(config: &CadgraphConfig) -> InfoReport {
    InfoReport {
        version: cadgraph_core::version().to_string(),
        max_models: config.max_models,
        default_export_format: config.default_export_format.clone(),
        output_dir: config.resolved_output_dir(),
        backends: backend_statuses(config),
    }
}

/// Show the library version, effective config, and which geometry backends
/// can be used on this machine.
pub fn info_command(config: &CadgraphConfig, json: bool) -> Result<()> {
    let report = info_report(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("cadgraph v{}", report.version);
    println!("  Max models: {}", report.max_models);
    println!("  Export format: {}", report.default_export_format);
    println!("  Output dir: {}", report.output_dir.display());
    println!();

    if report.backends.is_empty() {
        println!("Backends: (none compiled in)");
        return Ok(());
    }

    println!("Backends:");
    for backend in &report.backends {
        match (&backend.version, &backend.path) {
            (Some(version), Some(path)) => {
                println!("- {}: {} ({})", backend.name, version, path.display())
            }
            (Some(version), None) => println!("- {}: {}", backend.name, version),
            _ => println!("- {}: not available", backend.name),
        }
    }
    if !report.backends.iter().any(|b| b.available) {
        println!();
        println!("{}", remediation_hint());
    }

    Ok(())
}
