use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use cadgraph_core::codec::{batch_dump_jsonl, load_jsonl, write_jsonl};
use cadgraph_core::model::Ir;

/// Validation state of one decoded record.
#[derive(Debug, Serialize)]
pub struct RecordStatus {
    pub model_id: String,
    pub schema_version: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl From<&Ir> for RecordStatus {
    fn from(ir: &Ir) -> Self {
        let validation = ir.validation();
        Self {
            model_id: ir.model_id.clone(),
            schema_version: validation.schema_version.clone(),
            node_count: validation.node_count,
            edge_count: validation.edge_count,
            valid: validation.is_valid(),
            warnings: validation.warnings.clone(),
            errors: validation.errors.clone(),
        }
    }
}

fn read_records(path: &Path) -> Result<Vec<Ir>> {
    load_jsonl(path).with_context(|| format!("Failed to read IR file: {}", path.display()))
}

pub fn inspect_records(path: &Path) -> Result<Vec<RecordStatus>> {
    Ok(read_records(path)?.iter().map(RecordStatus::from).collect())
}

/// Decode an IR JSONL file and report the validation state of every record.
/// Invalid records are reported, not treated as a failure.
pub fn inspect_command(path: &Path, json: bool) -> Result<()> {
    let records = inspect_records(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No IR records in {}", path.display());
        return Ok(());
    }

    for (idx, record) in records.iter().enumerate() {
        let state = if record.valid { "valid" } else { "INVALID" };
        println!(
            "[{}] {}: {} nodes, {} edges, schema {} ({})",
            idx + 1,
            record.model_id,
            record.node_count,
            record.edge_count,
            record.schema_version,
            state
        );
        for warning in &record.warnings {
            println!("    warning: {}", warning);
        }
        for error in &record.errors {
            println!("    error: {}", error);
        }
    }

    Ok(())
}

/// Decode an IR JSONL file and re-encode every record canonically, to
/// `output` or stdout.
pub fn canonicalize_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let irs = read_records(input)?;

    match output {
        Some(output) => {
            batch_dump_jsonl(&irs, output, true)
                .with_context(|| format!("Failed to write IR file: {}", output.display()))?;
            tracing::info!(records = irs.len(), path = %output.display(), "canonicalized IR");
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_jsonl(&mut lock, &irs, true).context("Failed to write IR to stdout")?;
            lock.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
