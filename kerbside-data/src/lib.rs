//! Streaming normalisation pipeline over OSM XML exports.
//!
//! [`ElementWalker`] lazily lifts one node or way at a time out of the
//! export, [`run_pipeline`] shapes, optionally validates, and emits each
//! element through a [`RowSink`], and [`CsvSink`] writes the five
//! relational tables as CSV. Peak memory stays bounded by the largest
//! single element regardless of export size.

#![forbid(unsafe_code)]

pub mod pipeline;
pub mod sink;
pub mod walker;

pub use pipeline::{PipelineError, PipelineSummary, run_pipeline, shape_to_csv};
pub use sink::{CsvSink, EmitError, MemorySink, RowSink};
pub use walker::{ElementWalker, WalkError};
