//! Source-document element model.
//!
//! An [`Element`] is the unit the streaming walker hands to the shaper:
//! one node or way from the export, carrying its raw attribute map, its
//! raw key/value tags in document order, and (for ways) the ordered node
//! references that make up the path geometry.

use std::collections::HashMap;
use std::fmt;

/// Raw attribute map of a source element, keyed by attribute name.
///
/// Values stay as the source text; interpretation (integer, decimal,
/// timestamp) is the schema validator's concern.
pub type Attributes = HashMap<String, String>;

/// The two primary record kinds the pipeline shapes.
///
/// The source format also contains relations (multi-way groupings); the
/// walker skips and counts those rather than yielding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A single point with coordinates.
    Node,
    /// An ordered path over node references.
    Way,
}

impl ElementKind {
    /// Source-document tag name for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw key/value tag entry as it appears in the source.
///
/// The value may be empty; the key never is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    /// Raw tag key, possibly namespaced with `:` separators.
    pub key: String,
    /// Raw tag value, free text.
    pub value: String,
}

impl RawTag {
    /// Construct a raw tag entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One complete node or way lifted from the source tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Whether this is a node or a way.
    pub kind: ElementKind,
    /// Raw attributes, unfiltered.
    pub attributes: Attributes,
    /// Raw tag entries in document order.
    pub tags: Vec<RawTag>,
    /// Ordered node references; always empty for nodes.
    pub node_refs: Vec<String>,
}

impl Element {
    /// Construct a node element.
    #[must_use]
    pub fn node(attributes: Attributes, tags: Vec<RawTag>) -> Self {
        Self {
            kind: ElementKind::Node,
            attributes,
            tags,
            node_refs: Vec::new(),
        }
    }

    /// Construct a way element with its ordered node references.
    #[must_use]
    pub fn way(attributes: Attributes, tags: Vec<RawTag>, node_refs: Vec<String>) -> Self {
        Self {
            kind: ElementKind::Way,
            attributes,
            tags,
            node_refs,
        }
    }

    /// The element's identifier attribute, when present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_has_no_member_references() {
        let node = Element::node(Attributes::new(), vec![RawTag::new("amenity", "pub")]);
        assert_eq!(node.kind, ElementKind::Node);
        assert!(node.node_refs.is_empty());
    }

    #[test]
    fn id_reads_the_identifier_attribute() {
        let mut attributes = Attributes::new();
        attributes.insert("id".to_owned(), "42".to_owned());
        let way = Element::way(attributes, Vec::new(), vec!["1".to_owned()]);
        assert_eq!(way.id(), Some("42"));
    }
}
