//! Facade crate for the Kerbside OSM normalisation pipeline.
//!
//! This crate re-exports the core shaping types and the streaming
//! pipeline so callers can depend on a single crate.

#![forbid(unsafe_code)]

pub use kerbside_core::{
    CorrectionTable, DocumentSchema, Element, ElementKind, RawTag, SchemaViolation, ShapedElement,
    Shaper, ShaperConfig, TagRow, WayNodeRow, default_schema, dublin_postcode_corrections,
    dublin_street_corrections,
};

pub use kerbside_data::{
    CsvSink, ElementWalker, EmitError, MemorySink, PipelineError, PipelineSummary, RowSink,
    WalkError, run_pipeline, shape_to_csv,
};
