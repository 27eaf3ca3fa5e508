//! Command-line interface for the Kerbside normalisation pipeline.
#![forbid(unsafe_code)]

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use thiserror::Error;

use kerbside_data::{PipelineError, PipelineSummary};

mod shape;

pub(crate) const ARG_SOURCE: &str = "source";
pub(crate) const ARG_OUT_DIR: &str = "out-dir";
pub(crate) const ARG_VALIDATE: &str = "validate";
pub(crate) const ARG_STREET_CORRECTIONS: &str = "street-corrections";
pub(crate) const ARG_POSTCODE_CORRECTIONS: &str = "postcode-corrections";
pub(crate) const ENV_SOURCE: &str = "KERBSIDE_CMDS_SHAPE_SOURCE";

/// Run the Kerbside CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Shape(args) => {
            let summary = shape::run_shape(args)?;
            report(&summary)
        }
    }
}

fn report(summary: &PipelineSummary) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "nodes: {} ({} tag rows)",
        summary.nodes, summary.node_tags
    )
    .map_err(CliError::WriteOutput)?;
    writeln!(
        out,
        "ways: {} ({} tag rows, {} membership rows)",
        summary.ways, summary.way_tags, summary.way_nodes
    )
    .map_err(CliError::WriteOutput)?;
    writeln!(
        out,
        "dropped tags: {}, relations skipped: {}",
        summary.dropped_tags, summary.relations_skipped
    )
    .map_err(CliError::WriteOutput)?;
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "kerbside",
    about = "Normalise an OpenStreetMap export into relational CSV tables",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Shape an OSM XML export into the five CSV tables.
    Shape(shape::ShapeArgs),
}

/// Errors emitted by the Kerbside CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the missing argument.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path} does not exist or is not a file")]
    MissingSourceFile {
        /// Argument the path came from.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// A correction-table file could not be read.
    #[error("failed to read correction table at {path}: {source}")]
    OpenCorrections {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// A correction-table file held invalid JSON.
    #[error("failed to parse correction table at {path}: {source}")]
    ParseCorrections {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The shaping pipeline aborted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteOutput(#[source] std::io::Error),
}

#[cfg(test)]
mod tests;
