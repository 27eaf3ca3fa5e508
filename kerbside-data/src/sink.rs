//! Row sinks for the five relational output tables.
//!
//! The pipeline driver emits through the [`RowSink`] seam; [`CsvSink`]
//! writes the canonical five-file CSV layout while [`MemorySink`] keeps
//! rows in memory for tests and demos. Rows are written as they are
//! produced, never buffered and sorted.

use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};
use csv::Writer;
use thiserror::Error;

use kerbside_core::shape::{TagRow, WayNodeRow};
use kerbside_core::{Attributes, ShaperConfig};

/// File name of the node attribute table.
pub const NODES_FILE: &str = "nodes.csv";
/// File name of the node tag table.
pub const NODE_TAGS_FILE: &str = "nodes_tags.csv";
/// File name of the way attribute table.
pub const WAYS_FILE: &str = "ways.csv";
/// File name of the way membership table.
pub const WAY_NODES_FILE: &str = "ways_nodes.csv";
/// File name of the way tag table.
pub const WAY_TAGS_FILE: &str = "ways_tags.csv";

/// Column headers of the tag tables.
const TAG_HEADERS: [&str; 4] = ["id", "key", "value", "type"];
/// Column headers of the way membership table.
const WAY_NODE_HEADERS: [&str; 3] = ["id", "node_id", "position"];

/// Errors raised while emitting rows.
#[derive(Debug, Error)]
pub enum EmitError {
    /// An output file could not be created.
    #[error("failed to create output file {path}")]
    Create {
        /// Underlying CSV/filesystem error.
        #[source]
        source: csv::Error,
        /// Path that failed to open for writing.
        path: Utf8PathBuf,
    },
    /// A row could not be written.
    #[error("failed to write a {table} row: {source}")]
    Write {
        /// Table the row belonged to.
        table: &'static str,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// Buffered rows could not be flushed.
    #[error("failed to flush {table} rows: {source}")]
    Flush {
        /// Table whose writer failed to flush.
        table: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Destination for the five row streams.
///
/// Each method receives one finished row; implementations must preserve
/// arrival order. [`RowSink::finish`] runs once after the source is
/// drained.
pub trait RowSink {
    /// Emit one node attribute row.
    fn node_row(&mut self, attributes: &Attributes) -> Result<(), EmitError>;
    /// Emit one node tag row.
    fn node_tag_row(&mut self, row: &TagRow) -> Result<(), EmitError>;
    /// Emit one way attribute row.
    fn way_row(&mut self, attributes: &Attributes) -> Result<(), EmitError>;
    /// Emit one way membership row.
    fn way_node_row(&mut self, row: &WayNodeRow) -> Result<(), EmitError>;
    /// Emit one way tag row.
    fn way_tag_row(&mut self, row: &TagRow) -> Result<(), EmitError>;
    /// Flush any buffered output once the run has drained.
    fn finish(&mut self) -> Result<(), EmitError> {
        Ok(())
    }
}

/// CSV sink writing the canonical five-file layout into one directory.
///
/// Headers are written on creation. Attribute fields absent from a row
/// are emitted as empty cells so every record has the full column count.
pub struct CsvSink {
    nodes: Writer<File>,
    node_tags: Writer<File>,
    ways: Writer<File>,
    way_nodes: Writer<File>,
    way_tags: Writer<File>,
    node_fields: Vec<String>,
    way_fields: Vec<String>,
}

impl CsvSink {
    /// Create the five output files under `dir` with headers written.
    ///
    /// Column order for the attribute tables follows the shaper's allowed
    /// field sets, so the emitted files line up with what the shaper
    /// produces.
    pub fn create(dir: &Utf8Path, config: &ShaperConfig) -> Result<Self, EmitError> {
        let node_fields = config.node_fields.clone();
        let way_fields = config.way_fields.clone();
        let node_headers: Vec<&str> = node_fields.iter().map(String::as_str).collect();
        let way_headers: Vec<&str> = way_fields.iter().map(String::as_str).collect();

        Ok(Self {
            nodes: open_writer(dir, NODES_FILE, &node_headers)?,
            node_tags: open_writer(dir, NODE_TAGS_FILE, &TAG_HEADERS)?,
            ways: open_writer(dir, WAYS_FILE, &way_headers)?,
            way_nodes: open_writer(dir, WAY_NODES_FILE, &WAY_NODE_HEADERS)?,
            way_tags: open_writer(dir, WAY_TAGS_FILE, &TAG_HEADERS)?,
            node_fields,
            way_fields,
        })
    }

    fn attribute_record<'a>(fields: &'a [String], attributes: &'a Attributes) -> Vec<&'a str> {
        fields
            .iter()
            .map(|field| attributes.get(field).map_or("", String::as_str))
            .collect()
    }
}

fn open_writer(dir: &Utf8Path, name: &str, headers: &[&str]) -> Result<Writer<File>, EmitError> {
    let path = dir.join(name);
    let mut writer = Writer::from_path(&path).map_err(|source| EmitError::Create {
        source,
        path: path.clone(),
    })?;
    writer
        .write_record(headers)
        .map_err(|source| EmitError::Create { source, path })?;
    Ok(writer)
}

fn write_tag_row(
    writer: &mut Writer<File>,
    table: &'static str,
    row: &TagRow,
) -> Result<(), EmitError> {
    writer
        .write_record([
            row.parent_id.as_str(),
            row.key.as_str(),
            row.value.as_str(),
            row.namespace.as_str(),
        ])
        .map_err(|source| EmitError::Write { table, source })
}

impl RowSink for CsvSink {
    fn node_row(&mut self, attributes: &Attributes) -> Result<(), EmitError> {
        let record = Self::attribute_record(&self.node_fields, attributes);
        self.nodes
            .write_record(&record)
            .map_err(|source| EmitError::Write {
                table: "nodes",
                source,
            })
    }

    fn node_tag_row(&mut self, row: &TagRow) -> Result<(), EmitError> {
        write_tag_row(&mut self.node_tags, "nodes_tags", row)
    }

    fn way_row(&mut self, attributes: &Attributes) -> Result<(), EmitError> {
        let record = Self::attribute_record(&self.way_fields, attributes);
        self.ways
            .write_record(&record)
            .map_err(|source| EmitError::Write {
                table: "ways",
                source,
            })
    }

    fn way_node_row(&mut self, row: &WayNodeRow) -> Result<(), EmitError> {
        let position = row.position.to_string();
        self.way_nodes
            .write_record([row.way_id.as_str(), row.node_id.as_str(), position.as_str()])
            .map_err(|source| EmitError::Write {
                table: "ways_nodes",
                source,
            })
    }

    fn way_tag_row(&mut self, row: &TagRow) -> Result<(), EmitError> {
        write_tag_row(&mut self.way_tags, "ways_tags", row)
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        let writers: [(&'static str, &mut Writer<File>); 5] = [
            ("nodes", &mut self.nodes),
            ("nodes_tags", &mut self.node_tags),
            ("ways", &mut self.ways),
            ("ways_nodes", &mut self.way_nodes),
            ("ways_tags", &mut self.way_tags),
        ];
        for (table, writer) in writers {
            writer
                .flush()
                .map_err(|source| EmitError::Flush { table, source })?;
        }
        Ok(())
    }
}

/// In-memory sink collecting every row, for tests and demos.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Collected node attribute rows.
    pub nodes: Vec<Attributes>,
    /// Collected node tag rows.
    pub node_tags: Vec<TagRow>,
    /// Collected way attribute rows.
    pub ways: Vec<Attributes>,
    /// Collected way membership rows.
    pub way_nodes: Vec<WayNodeRow>,
    /// Collected way tag rows.
    pub way_tags: Vec<TagRow>,
}

impl RowSink for MemorySink {
    fn node_row(&mut self, attributes: &Attributes) -> Result<(), EmitError> {
        self.nodes.push(attributes.clone());
        Ok(())
    }

    fn node_tag_row(&mut self, row: &TagRow) -> Result<(), EmitError> {
        self.node_tags.push(row.clone());
        Ok(())
    }

    fn way_row(&mut self, attributes: &Attributes) -> Result<(), EmitError> {
        self.ways.push(attributes.clone());
        Ok(())
    }

    fn way_node_row(&mut self, row: &WayNodeRow) -> Result<(), EmitError> {
        self.way_nodes.push(row.clone());
        Ok(())
    }

    fn way_tag_row(&mut self, row: &TagRow) -> Result<(), EmitError> {
        self.way_tags.push(row.clone());
        Ok(())
    }
}
