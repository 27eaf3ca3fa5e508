//! Declarative row schemas and fail-fast validation.
//!
//! A [`TableSchema`] declares, per field, whether the field is required
//! and what shape its text must take. [`DocumentSchema`] bundles the five
//! table schemas and checks a whole [`ShapedElement`] before emission,
//! failing on the first offending field with enough context to locate the
//! source record.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::element::ElementKind;
use crate::shape::{ShapedElement, TagRow, WayNodeRow};

/// Expected shape of a field's text.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Any text, including the empty string.
    Text,
    /// Parses as a signed integer.
    Integer,
    /// Parses as a decimal number.
    Decimal,
    /// Matches the given pattern in full.
    Pattern(Regex),
}

/// Requiredness and kind of a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Whether the field must be present on the row.
    pub required: bool,
    /// Expected shape of the field's text.
    pub kind: FieldKind,
}

impl FieldRule {
    /// A field that must be present.
    #[must_use]
    pub const fn required(kind: FieldKind) -> Self {
        Self {
            required: true,
            kind,
        }
    }

    /// A field that may be omitted.
    #[must_use]
    pub const fn optional(kind: FieldKind) -> Self {
        Self {
            required: false,
            kind,
        }
    }
}

/// Ordered field rules for one output table.
///
/// Field order is the order violations are reported in, making fail-fast
/// output deterministic.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    fields: Vec<(String, FieldRule)>,
}

/// First failing field of a row, with its violated constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable constraint violations for that field.
    pub violations: Vec<String>,
}

impl TableSchema {
    /// An empty schema accepting any row.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field rule, keeping declaration order.
    #[must_use]
    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_owned(), rule));
        self
    }

    /// Validate one row given as `(field, value)` pairs.
    ///
    /// Returns the first field whose constraints fail. Values are looked
    /// up by name; a field absent from `row` counts as omitted.
    pub fn validate(&self, row: &[(&str, &str)]) -> Result<(), FieldViolation> {
        for (name, rule) in &self.fields {
            let value = row
                .iter()
                .find(|(field, _)| field == name)
                .map(|&(_, value)| value);
            let violations = match value {
                None => {
                    if rule.required {
                        vec!["required field is missing".to_owned()]
                    } else {
                        Vec::new()
                    }
                }
                Some(text) => check_kind(&rule.kind, text).into_iter().collect(),
            };
            if !violations.is_empty() {
                return Err(FieldViolation {
                    field: name.clone(),
                    violations,
                });
            }
        }
        Ok(())
    }
}

fn check_kind(kind: &FieldKind, value: &str) -> Option<String> {
    match kind {
        FieldKind::Text => None,
        FieldKind::Integer => value
            .parse::<i64>()
            .is_err()
            .then(|| format!("value {value:?} is not an integer")),
        FieldKind::Decimal => value
            .parse::<f64>()
            .is_err()
            .then(|| format!("value {value:?} is not a decimal number")),
        FieldKind::Pattern(pattern) => (!pattern.is_match(value))
            .then(|| format!("value {value:?} does not match pattern `{}`", pattern.as_str())),
    }
}

/// A shaped record failed schema validation.
///
/// Fatal for the run: the pipeline aborts rather than skipping the record,
/// since partial output from a single authoritative batch is worse than an
/// explicit failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{kind} {element_id} failed validation: {table}.{field}: {}",
    violations.join("; ")
)]
pub struct SchemaViolation {
    /// Kind of the offending source record.
    pub kind: ElementKind,
    /// Identifier of the offending record, or empty when absent.
    pub element_id: String,
    /// Output table whose row failed.
    pub table: &'static str,
    /// Name of the offending field.
    pub field: String,
    /// Human-readable constraint violations.
    pub violations: Vec<String>,
}

/// Schemas for the five output tables.
#[derive(Debug, Clone, Default)]
pub struct DocumentSchema {
    /// Node attribute rows.
    pub nodes: TableSchema,
    /// Node tag rows.
    pub node_tags: TableSchema,
    /// Way attribute rows.
    pub ways: TableSchema,
    /// Way membership rows.
    pub way_nodes: TableSchema,
    /// Way tag rows.
    pub way_tags: TableSchema,
}

impl DocumentSchema {
    /// Validate a shaped element against the table schemas for its kind.
    ///
    /// Checks the attribute row first, then every tag row, then (for
    /// ways) every membership row, stopping at the first failure.
    pub fn validate(&self, shaped: &ShapedElement) -> Result<(), SchemaViolation> {
        let element_id = shaped.id().unwrap_or_default().to_owned();
        match shaped.kind {
            ElementKind::Node => {
                self.validate_attributes(shaped, "nodes", &self.nodes, &element_id)?;
                for row in &shaped.tags {
                    validate_tag_row(&self.node_tags, "nodes_tags", row, shaped.kind)?;
                }
            }
            ElementKind::Way => {
                self.validate_attributes(shaped, "ways", &self.ways, &element_id)?;
                for row in &shaped.way_nodes {
                    validate_way_node_row(&self.way_nodes, row)?;
                }
                for row in &shaped.tags {
                    validate_tag_row(&self.way_tags, "ways_tags", row, shaped.kind)?;
                }
            }
        }
        Ok(())
    }

    fn validate_attributes(
        &self,
        shaped: &ShapedElement,
        table: &'static str,
        schema: &TableSchema,
        element_id: &str,
    ) -> Result<(), SchemaViolation> {
        let row: Vec<(&str, &str)> = shaped
            .attributes
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();
        schema
            .validate(&row)
            .map_err(|violation| SchemaViolation {
                kind: shaped.kind,
                element_id: element_id.to_owned(),
                table,
                field: violation.field,
                violations: violation.violations,
            })
    }
}

fn validate_tag_row(
    schema: &TableSchema,
    table: &'static str,
    row: &TagRow,
    kind: ElementKind,
) -> Result<(), SchemaViolation> {
    let fields = [
        ("id", row.parent_id.as_str()),
        ("key", row.key.as_str()),
        ("value", row.value.as_str()),
        ("type", row.namespace.as_str()),
    ];
    schema
        .validate(&fields)
        .map_err(|violation| SchemaViolation {
            kind,
            element_id: row.parent_id.clone(),
            table,
            field: violation.field,
            violations: violation.violations,
        })
}

fn validate_way_node_row(
    schema: &TableSchema,
    row: &WayNodeRow,
) -> Result<(), SchemaViolation> {
    let position = row.position.to_string();
    let fields = [
        ("id", row.way_id.as_str()),
        ("node_id", row.node_id.as_str()),
        ("position", position.as_str()),
    ];
    schema
        .validate(&fields)
        .map_err(|violation| SchemaViolation {
            kind: ElementKind::Way,
            element_id: row.way_id.clone(),
            table: "ways_nodes",
            field: violation.field,
            violations: violation.violations,
        })
}

/// ISO-8601 `Z`-suffixed timestamp form used by the export.
const TIMESTAMP_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$";

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "the timestamp pattern is a checked constant")]
    Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern compiles")
});

/// The default schemas for the five output tables.
///
/// Identifiers and edit metadata must parse as integers, coordinates as
/// decimals, and timestamps must match the export's ISO-8601 form.
/// `user` and `uid` are optional because anonymous edits omit them.
#[must_use]
pub fn default_schema() -> DocumentSchema {
    let tag_table = || {
        TableSchema::new()
            .field("id", FieldRule::required(FieldKind::Integer))
            .field("key", FieldRule::required(FieldKind::Text))
            .field("value", FieldRule::required(FieldKind::Text))
            .field("type", FieldRule::required(FieldKind::Text))
    };
    let timestamp = || FieldKind::Pattern(TIMESTAMP_RE.clone());

    DocumentSchema {
        nodes: TableSchema::new()
            .field("id", FieldRule::required(FieldKind::Integer))
            .field("lat", FieldRule::required(FieldKind::Decimal))
            .field("lon", FieldRule::required(FieldKind::Decimal))
            .field("user", FieldRule::optional(FieldKind::Text))
            .field("uid", FieldRule::optional(FieldKind::Integer))
            .field("version", FieldRule::required(FieldKind::Text))
            .field("changeset", FieldRule::required(FieldKind::Integer))
            .field("timestamp", FieldRule::required(timestamp())),
        node_tags: tag_table(),
        ways: TableSchema::new()
            .field("id", FieldRule::required(FieldKind::Integer))
            .field("user", FieldRule::optional(FieldKind::Text))
            .field("uid", FieldRule::optional(FieldKind::Integer))
            .field("version", FieldRule::required(FieldKind::Text))
            .field("changeset", FieldRule::required(FieldKind::Integer))
            .field("timestamp", FieldRule::required(timestamp())),
        way_nodes: TableSchema::new()
            .field("id", FieldRule::required(FieldKind::Integer))
            .field("node_id", FieldRule::required(FieldKind::Integer))
            .field("position", FieldRule::required(FieldKind::Integer)),
        way_tags: tag_table(),
    }
}
