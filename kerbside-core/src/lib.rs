//! Core domain types for the Kerbside normalisation pipeline.
//!
//! These models cover the pure half of the pipeline: the source element
//! shape, the learned correction tables, the tag and record shapers, and
//! the declarative row schemas. Everything here is synchronous and free of
//! I/O; streaming and emission live in `kerbside-data`.

#![forbid(unsafe_code)]

pub mod corrections;
pub mod element;
pub mod schema;
pub mod shape;

pub use corrections::{CorrectionTable, dublin_postcode_corrections, dublin_street_corrections};
pub use element::{Attributes, Element, ElementKind, RawTag};
pub use schema::{
    DocumentSchema, FieldKind, FieldRule, SchemaViolation, TableSchema, default_schema,
};
pub use shape::{ShapedElement, Shaper, ShaperConfig, TagRow, WayNodeRow};
