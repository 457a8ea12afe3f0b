use std::path::PathBuf;

use anyhow::Result;
use cadgraph::commands::{
    canonicalize_command, export_command, info_command, inspect_command, load_command,
    summarize_command, IrFormat,
};
use cadgraph::{init_logging, load_cli_config};
use clap::{Parser, Subcommand};

/// Deterministic graph IR for STEP files.
///
/// This CLI is a thin wrapper around `cadgraph-core`. Geometry is read by an
/// external kernel (OCCT helper tool or FreeCAD); everything else lives in the
/// library so it can be tested and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "cadgraph",
    version,
    about = "Deterministic graph IR for STEP files",
    long_about = None
)]
struct Cli {
    /// Config file (.json, .yaml or .yml). Defaults to `.cadgraph/config.*` under the
    /// current directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the effective configuration and probe the geometry backends.
    Info {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Load a STEP file and report its id, units and backend.
    Load {
        /// Path to the STEP file.
        path: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Load a STEP file, summarize its geometry and write the IR.
    ///
    /// With `--format jsonl` (the default) the IR is written canonically to
    /// `<out>/<model_id>.jsonl`; `--out` defaults to the configured output dir.
    Summarize {
        /// Path to the STEP file.
        path: PathBuf,

        /// Output directory.
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = IrFormat::Jsonl)]
        format: IrFormat,
    },

    /// Load a STEP file and export a placeholder view (glb or gltf).
    Export {
        /// Path to the STEP file.
        path: PathBuf,

        /// Output file. Defaults to `<output_dir>/<model_id>.<ext>`.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// `glb` or `gltf`. Defaults to the configured export format.
        #[arg(long)]
        format: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Decode an IR JSONL file and print the validation state of every record.
    Inspect {
        /// Path to the IR JSONL file.
        path: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Re-encode an IR JSONL file in canonical form.
    Canonicalize {
        /// Path to the IR JSONL file.
        path: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    // Default to `info` if no command is provided.
    let command = cli.command.unwrap_or(Command::Info { json: false });

    let config = || -> Result<_> {
        let config = load_cli_config(cli.config.as_deref())?;
        tracing::debug!(?config, "effective configuration");
        Ok(config)
    };

    match command {
        Command::Info { json } => info_command(&config()?, json)?,
        Command::Load { path, json } => load_command(&config()?, &path, json)?,
        Command::Summarize { path, out, format } => {
            summarize_command(&config()?, &path, out.as_deref(), format)?
        }
        Command::Export { path, out, format, json } => {
            export_command(&config()?, &path, out.as_deref(), format.as_deref(), json)?
        }
        Command::Inspect { path, json } => inspect_command(&path, json)?,
        Command::Canonicalize { path, out } => canonicalize_command(&path, out.as_deref())?,
    }

    Ok(())
}
