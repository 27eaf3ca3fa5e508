//! Single-pass pipeline driver.
//!
//! Pulls one element at a time from the walker, shapes it, optionally
//! validates the shaped rows, and emits them through a sink. The pass is
//! strictly linear: a validation or emission failure aborts the run,
//! leaving already-flushed rows in place. Callers needing atomic output
//! should emit into a staging directory and swap on success.

use std::io::BufRead;

use camino::Utf8Path;
use log::debug;
use thiserror::Error;

use kerbside_core::{DocumentSchema, ElementKind, SchemaViolation, Shaper};

use crate::sink::{CsvSink, EmitError, RowSink};
use crate::walker::{ElementWalker, WalkError};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source document could not be read.
    #[error("failed to read the source document: {0}")]
    Read(#[from] WalkError),
    /// A shaped record failed schema validation.
    #[error(transparent)]
    Validation(#[from] SchemaViolation),
    /// Rows could not be emitted.
    #[error("failed to emit rows: {0}")]
    Emit(#[from] EmitError),
}

/// Row counts for one completed pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Node attribute rows emitted.
    pub nodes: usize,
    /// Node tag rows emitted.
    pub node_tags: usize,
    /// Way attribute rows emitted.
    pub ways: usize,
    /// Way membership rows emitted.
    pub way_nodes: usize,
    /// Way tag rows emitted.
    pub way_tags: usize,
    /// Raw tags dropped for carrying problem characters.
    pub dropped_tags: usize,
    /// Relation subtrees skipped by the walker.
    pub relations_skipped: u64,
}

/// Run one pass over the source, emitting every shaped row.
///
/// Validation runs only when a schema is supplied; checking every field
/// of every record costs roughly an order of magnitude in throughput.
/// The first read, validation, or emission failure aborts the run.
pub fn run_pipeline<R, S>(
    mut walker: ElementWalker<R>,
    shaper: &Shaper,
    schema: Option<&DocumentSchema>,
    sink: &mut S,
) -> Result<PipelineSummary, PipelineError>
where
    R: BufRead,
    S: RowSink,
{
    let mut summary = PipelineSummary::default();

    for element in walker.by_ref() {
        let element = element?;
        let shaped = shaper.shape(&element);

        let dropped = element.tags.len().saturating_sub(shaped.tags.len());
        if dropped > 0 {
            debug!(
                "dropped {dropped} tag(s) with unusable keys from {} {}",
                shaped.kind,
                shaped.id().unwrap_or("<no id>"),
            );
            summary.dropped_tags += dropped;
        }

        if let Some(schema) = schema {
            schema.validate(&shaped)?;
        }

        match shaped.kind {
            ElementKind::Node => {
                sink.node_row(&shaped.attributes)?;
                summary.nodes += 1;
                for row in &shaped.tags {
                    sink.node_tag_row(row)?;
                    summary.node_tags += 1;
                }
            }
            ElementKind::Way => {
                sink.way_row(&shaped.attributes)?;
                summary.ways += 1;
                for row in &shaped.way_nodes {
                    sink.way_node_row(row)?;
                    summary.way_nodes += 1;
                }
                for row in &shaped.tags {
                    sink.way_tag_row(row)?;
                    summary.way_tags += 1;
                }
            }
        }
    }

    summary.relations_skipped = walker.relations_skipped();
    sink.finish()?;
    Ok(summary)
}

/// Shape an export file straight into the five-file CSV layout.
///
/// Convenience wrapper wiring [`ElementWalker::from_path`], a [`CsvSink`]
/// in `out_dir`, and [`run_pipeline`].
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use kerbside_core::{Shaper, default_schema};
/// use kerbside_data::shape_to_csv;
///
/// # fn main() -> Result<(), kerbside_data::PipelineError> {
/// let schema = default_schema();
/// let summary = shape_to_csv(
///     Utf8Path::new("dublin_ireland.osm"),
///     Utf8Path::new("out"),
///     &Shaper::default(),
///     Some(&schema),
/// )?;
/// println!("shaped {} nodes and {} ways", summary.nodes, summary.ways);
/// # Ok(())
/// # }
/// ```
pub fn shape_to_csv(
    source: &Utf8Path,
    out_dir: &Utf8Path,
    shaper: &Shaper,
    schema: Option<&DocumentSchema>,
) -> Result<PipelineSummary, PipelineError> {
    let walker = ElementWalker::from_path(source)?;
    let mut sink = CsvSink::create(out_dir, shaper.config())?;
    run_pipeline(walker, shaper, schema, &mut sink)
}
