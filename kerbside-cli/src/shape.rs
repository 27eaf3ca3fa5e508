//! Shape command implementation for the Kerbside CLI.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use kerbside_core::{
    CorrectionTable, Shaper, ShaperConfig, default_schema, dublin_postcode_corrections,
    dublin_street_corrections,
};
use kerbside_data::{PipelineSummary, shape_to_csv};

use crate::{
    ARG_OUT_DIR, ARG_POSTCODE_CORRECTIONS, ARG_SOURCE, ARG_STREET_CORRECTIONS, ARG_VALIDATE,
    CliError, ENV_SOURCE,
};

/// CLI arguments for the `shape` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stream an OSM XML export and write the five relational \
                 CSV tables (nodes, node tags, ways, way memberships, way \
                 tags). Street names and postcodes under the addr \
                 namespace are corrected against learned tables; paths \
                 can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Shape an OSM export into relational CSV tables"
)]
#[ortho_config(prefix = "KERBSIDE")]
pub(crate) struct ShapeArgs {
    /// Path to the OSM XML export.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
    /// Directory receiving the five CSV tables.
    #[arg(long = ARG_OUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) out_dir: Option<Utf8PathBuf>,
    /// Validate every shaped record against the schema. Roughly an order
    /// of magnitude slower, since every field of every record is checked.
    #[arg(long = ARG_VALIDATE)]
    #[serde(default)]
    pub(crate) validate: bool,
    /// JSON file overriding the built-in street correction table.
    #[arg(long = ARG_STREET_CORRECTIONS, value_name = "path")]
    #[serde(default)]
    pub(crate) street_corrections: Option<Utf8PathBuf>,
    /// JSON file overriding the built-in postcode correction table.
    #[arg(long = ARG_POSTCODE_CORRECTIONS, value_name = "path")]
    #[serde(default)]
    pub(crate) postcode_corrections: Option<Utf8PathBuf>,
}

impl ShapeArgs {
    fn into_config(self) -> Result<ShapeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ShapeConfig::try_from(merged)
    }
}

/// Resolved `shape` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShapeConfig {
    /// Path to the OSM XML export.
    pub(crate) source: Utf8PathBuf,
    /// Directory receiving the CSV tables.
    pub(crate) out_dir: Utf8PathBuf,
    /// Whether to validate shaped records.
    pub(crate) validate: bool,
    /// Optional street correction-table override.
    pub(crate) street_corrections: Option<Utf8PathBuf>,
    /// Optional postcode correction-table override.
    pub(crate) postcode_corrections: Option<Utf8PathBuf>,
}

impl ShapeConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.source, ARG_SOURCE)?;
        if let Some(path) = &self.street_corrections {
            Self::require_existing(path, ARG_STREET_CORRECTIONS)?;
        }
        if let Some(path) = &self.postcode_corrections {
            Self::require_existing(path, ARG_POSTCODE_CORRECTIONS)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
    }
}

impl TryFrom<ShapeArgs> for ShapeConfig {
    type Error = CliError;

    fn try_from(args: ShapeArgs) -> Result<Self, Self::Error> {
        let source = args.source.ok_or(CliError::MissingArgument {
            field: ARG_SOURCE,
            env: ENV_SOURCE,
        })?;
        let out_dir = args.out_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        Ok(Self {
            source,
            out_dir,
            validate: args.validate,
            street_corrections: args.street_corrections,
            postcode_corrections: args.postcode_corrections,
        })
    }
}

/// Resolve configuration and run the shaping pipeline.
pub(crate) fn run_shape(args: ShapeArgs) -> Result<PipelineSummary, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;

    let street = match &config.street_corrections {
        Some(path) => load_corrections(path)?,
        None => dublin_street_corrections(),
    };
    let postcode = match &config.postcode_corrections {
        Some(path) => load_corrections(path)?,
        None => dublin_postcode_corrections(),
    };
    let shaper = Shaper::new(ShaperConfig::default(), street, postcode);

    fs::create_dir_all(&config.out_dir).map_err(|source| CliError::CreateOutputDir {
        path: config.out_dir.clone(),
        source,
    })?;

    let schema = config.validate.then(default_schema);
    let summary = shape_to_csv(&config.source, &config.out_dir, &shaper, schema.as_ref())?;
    Ok(summary)
}

pub(crate) fn load_corrections(path: &Utf8Path) -> Result<CorrectionTable, CliError> {
    let contents = fs::read_to_string(path).map_err(|source| CliError::OpenCorrections {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::ParseCorrections {
        path: path.to_path_buf(),
        source,
    })
}
