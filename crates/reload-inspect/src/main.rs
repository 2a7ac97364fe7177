//! Inspect what a reload cycle makes of build-tool output.
//!
//! ```bash
//! # Source map for a compilation analysis
//! reload-inspect source-map --analysis analysis.json --classpath target/classes
//!
//! # Classify a failed compile, falling back to raw console logs
//! reload-inspect classify --failure failure.json --log compile.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reconcile::{BuildFailure, CompilationAnalysis, ReloadConfig, ReloadCycle, TaskLog};
use serde::de::DeserializeOwned;
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Do not remap diagnostics in generated units (overrides RELOAD_REMAP_GENERATED)
    #[arg(long, default_value_t = false)]
    no_remap: bool,

    /// Only scan the last N lines of each log (overrides RELOAD_LOG_TAIL_LINES)
    #[arg(long)]
    log_tail_lines: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the source map for a successful compile
    SourceMap {
        /// Compilation analysis as JSON
        #[arg(long)]
        analysis: PathBuf,

        /// Classpath entries, passed through unchanged
        #[arg(long)]
        classpath: Vec<PathBuf>,
    },
    /// Classify a failed compile
    Classify {
        /// Build failure as JSON
        #[arg(long)]
        failure: Option<PathBuf>,

        /// Raw console log of a failing task; may be repeated
        #[arg(long)]
        log: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ReloadConfig::default();
    if args.no_remap {
        config.remap_generated = false;
    }
    if args.log_tail_lines.is_some() {
        config.log_tail_lines = args.log_tail_lines;
    }
    info!(
        remap_generated = config.remap_generated,
        log_tail_lines = ?config.log_tail_lines,
        "reload-inspect starting"
    );

    let cycle = ReloadCycle::from_config(config);

    let outcome = match args.command {
        Command::SourceMap {
            analysis,
            classpath,
        } => {
            let analysis: CompilationAnalysis = read_json(&analysis)?;
            cycle
                .on_success(&analysis, classpath)
                .context("Failed to build source map")?
        }
        Command::Classify { failure, log } => {
            let mut failure: BuildFailure = match failure {
                Some(path) => read_json(&path)?,
                None => BuildFailure::default(),
            };
            for path in &log {
                failure.logs.push(read_log(path)?);
            }
            cycle.on_failure(&failure)
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_log(path: &Path) -> Result<TaskLog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log {}", path.display()))?;
    Ok(TaskLog::new(path.display().to_string(), raw.lines()))
}
