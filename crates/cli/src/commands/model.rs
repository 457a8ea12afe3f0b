use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use cadgraph_core::codec::{encode, EncodeOptions};
use cadgraph_core::config::CadgraphConfig;
use cadgraph_core::services::export::ExportFormat;
use cadgraph_core::services::session::{Session, SharedSession};
use cadgraph_core::services::tools::{self, LoadReport, SummarizeReport};

use crate::{canonicalize_or_current, format_unit_pairs};

/// Output layout for `summarize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IrFormat {
    /// One canonical record per line, written to `<out>/<model_id>.jsonl`.
    Jsonl,
    /// Pretty canonical JSON; printed unless `--out` is given.
    Json,
}

/// A fresh session over every backend the config enables. Each CLI run
/// works on its own session.
pub fn open_session(config: &CadgraphConfig) -> SharedSession {
    SharedSession::new(Session::from_config(config))
}

fn load_into(session: &SharedSession, path: &Path) -> Result<LoadReport> {
    tools::load_model(session, path)
        .with_context(|| format!("Failed to load STEP file: {}", path.display()))
}

/// Ingest a STEP file and report what was detected.
pub fn load_command(config: &CadgraphConfig, path: &Path, json: bool) -> Result<()> {
    let session = open_session(config);
    let report = load_into(&session, path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Loaded model: {}", report.model_id);
    println!("  File: {}", report.file_path.display());
    println!("  Backend: {} ({})", report.backend, report.backend_version);
    println!("  Units: {}", format_unit_pairs(&report.units));
    println!("  Size: {} bytes", report.file_size);
    if let Some(sha) = &report.sha256 {
        println!("  SHA-256: {}", sha);
    }
    for advisory in &report.advisories {
        println!("  Note: {}", advisory);
    }

    Ok(())
}

/// Load, summarize and write the IR of a STEP file.
pub fn summarize_command(
    config: &CadgraphConfig,
    path: &Path,
    out: Option<&Path>,
    format: IrFormat,
) -> Result<()> {
    let session = open_session(config);
    let loaded = load_into(&session, path)?;
    let model_id = loaded.model_id.as_str();

    match format {
        IrFormat::Jsonl => {
            let report = tools::summarize_model(&session, model_id, out, config)
                .with_context(|| format!("Failed to summarize model '{}'", model_id))?;
            print_summary(&report);
        }
        IrFormat::Json => {
            let (_, ir) = tools::summary_ir(&session, model_id)
                .with_context(|| format!("Failed to summarize model '{}'", model_id))?;
            let body = encode(&ir, EncodeOptions::canonical().pretty())?;
            match out {
                Some(dir) => {
                    fs::create_dir_all(dir).with_context(|| {
                        format!("Failed to create output dir: {}", dir.display())
                    })?;
                    let target = dir.join(format!("{model_id}.json"));
                    fs::write(&target, body)
                        .with_context(|| format!("Failed to write IR: {}", target.display()))?;
                    println!("IR written to {}", target.display());
                }
                None => println!("{body}"),
            }
        }
    }

    Ok(())
}

fn print_summary(report: &SummarizeReport) {
    let topo = &report.topology;
    println!("Model: {}", report.model_id);
    println!("  Backend: {}", report.metadata.backend);
    println!("  Units: {}", format_unit_pairs(&report.units));
    println!(
        "  Topology: {} solids, {} shells, {} faces, {} edges, {} vertices",
        topo.solids, topo.shells, topo.faces, topo.edges, topo.vertices
    );
    if let Some(b) = &report.properties.bounding_box {
        println!(
            "  Bounding box: [{}, {}, {}] .. [{}, {}, {}]",
            b.min_x, b.min_y, b.min_z, b.max_x, b.max_y, b.max_z
        );
    }
    if let Some(area) = report.properties.surface_area {
        println!("  Surface area: {}", area);
    }
    if let Some(volume) = report.properties.volume {
        println!("  Volume: {}", volume);
    }
    for warning in &report.metadata.warnings {
        println!("  Warning: {}", warning);
    }
    let state = if report.ir_valid { "valid" } else { "invalid" };
    println!("  IR: {} ({})", report.ir_path.display(), state);
}

/// Load a STEP file and export a view of it. Without `--out` the view is
/// written to `<output_dir>/<model_id>.<ext>`.
pub fn export_command(
    config: &CadgraphConfig,
    path: &Path,
    out: Option<&Path>,
    format: Option<&str>,
    json: bool,
) -> Result<()> {
    let format: ExportFormat = format.unwrap_or(&config.default_export_format).parse()?;
    let session = open_session(config);
    let loaded = load_into(&session, path)?;

    let target: PathBuf = match out {
        Some(out) => canonicalize_or_current(out)?,
        None => config
            .resolved_output_dir()
            .join(format!("{}.{}", loaded.model_id, format.extension())),
    };
    let result =
        tools::export_model(&session, &loaded.model_id, format.extension(), Some(&target))
            .with_context(|| format!("Failed to export model '{}'", loaded.model_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Exported {} as {}", result.model_id, result.format);
    println!("  URI: {}", result.uri);
    println!("  MIME type: {}", result.mime_type);
    println!("  Size: {} bytes", result.size_bytes);

    Ok(())
}
