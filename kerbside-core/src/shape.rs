//! Reshaping of source elements into normalised relational rows.
//!
//! The [`Shaper`] turns one [`Element`] into a [`ShapedElement`]: the
//! attribute row filtered to the kind's allowed field set, the tag rows
//! with their namespace split off and street/postcode values corrected,
//! and (for ways) the ordered membership rows. Shaping never fails;
//! malformed rows are caught downstream by the schema validator.

use std::collections::HashMap;

use crate::corrections::CorrectionTable;
use crate::element::{Attributes, Element, ElementKind, RawTag};

/// Separator between a tag key's namespace prefix and its local name.
const NAMESPACE_SEPARATOR: char = ':';

/// Namespace recorded for keys carrying no separator.
const DEFAULT_NAMESPACE: &str = "regular";

/// Namespace whose `street` and `postcode` keys receive correction.
const ADDRESS_NAMESPACE: &str = "addr";

/// Characters (besides whitespace) that disqualify a key from becoming a
/// column identifier.
pub const DEFAULT_PROBLEM_CHARACTERS: &str = "=+/&<>;'\"?%#$@,.";

/// Attribute fields kept on a shaped node row, in column order.
pub const NODE_FIELDS: &[&str] = &[
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];

/// Attribute fields kept on a shaped way row, in column order.
pub const WAY_FIELDS: &[&str] = &["id", "user", "uid", "version", "changeset", "timestamp"];

/// Static configuration for the shaper.
///
/// Everything that was a module-level constant in earlier incarnations of
/// this pipeline is carried here explicitly, so two runs in one process
/// can shape against different rule sets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct ShaperConfig {
    /// Allowed attribute fields for node rows.
    pub node_fields: Vec<String>,
    /// Allowed attribute fields for way rows.
    pub way_fields: Vec<String>,
    /// Non-whitespace characters that invalidate a tag key. Whitespace is
    /// always treated as a problem character.
    pub problem_characters: String,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            node_fields: NODE_FIELDS.iter().map(|&field| field.to_owned()).collect(),
            way_fields: WAY_FIELDS.iter().map(|&field| field.to_owned()).collect(),
            problem_characters: DEFAULT_PROBLEM_CHARACTERS.to_owned(),
        }
    }
}

impl ShaperConfig {
    /// Allowed attribute fields for the given kind, in column order.
    #[must_use]
    pub fn allowed_fields(&self, kind: ElementKind) -> &[String] {
        match kind {
            ElementKind::Node => &self.node_fields,
            ElementKind::Way => &self.way_fields,
        }
    }

    fn is_problem_key(&self, key: &str) -> bool {
        key.chars()
            .any(|ch| ch.is_whitespace() || self.problem_characters.contains(ch))
    }
}

/// One normalised tag row: `(parent id, local key, value, namespace)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    /// Identifier of the owning node or way.
    pub parent_id: String,
    /// Local key, after the namespace prefix.
    pub key: String,
    /// Tag value, corrected where applicable.
    pub value: String,
    /// Namespace prefix, or `regular` when the key carried none.
    pub namespace: String,
}

/// One ordered way-membership row: `(way id, node id, position)`.
///
/// Positions number the member references from 0 in their original order.
/// That order is the path geometry and is never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayNodeRow {
    /// Identifier of the owning way.
    pub way_id: String,
    /// Identifier of the referenced node.
    pub node_id: String,
    /// Zero-based index within the way's member order.
    pub position: u64,
}

/// A fully reshaped element, ready for validation and emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedElement {
    /// Kind of the source element.
    pub kind: ElementKind,
    /// Attribute row, restricted to the allowed field set. Fields absent
    /// on the source are omitted, not zero-filled.
    pub attributes: Attributes,
    /// Normalised tag rows in source order; duplicates survive.
    pub tags: Vec<TagRow>,
    /// Ordered membership rows; always empty for nodes.
    pub way_nodes: Vec<WayNodeRow>,
}

impl ShapedElement {
    /// The shaped identifier, when the source carried one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }
}

/// Reshapes source elements into rows using a fixed rule set.
#[derive(Debug, Clone)]
pub struct Shaper {
    config: ShaperConfig,
    street: CorrectionTable,
    postcode: CorrectionTable,
}

impl Default for Shaper {
    /// A shaper with the default field sets and the Dublin correction
    /// tables.
    fn default() -> Self {
        Self::new(
            ShaperConfig::default(),
            crate::corrections::dublin_street_corrections(),
            crate::corrections::dublin_postcode_corrections(),
        )
    }
}

impl Shaper {
    /// Build a shaper from explicit configuration and correction tables.
    #[must_use]
    pub fn new(config: ShaperConfig, street: CorrectionTable, postcode: CorrectionTable) -> Self {
        Self {
            config,
            street,
            postcode,
        }
    }

    /// The shaper's static configuration.
    #[must_use]
    pub fn config(&self) -> &ShaperConfig {
        &self.config
    }

    /// Shape one source element into its normalised rows.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashMap;
    /// use kerbside_core::{Element, RawTag, Shaper};
    ///
    /// let shaper = Shaper::default();
    /// let element = Element::node(
    ///     HashMap::from([
    ///         ("id".into(), "1".into()),
    ///         ("lat".into(), "53.3".into()),
    ///         ("lon".into(), "-6.2".into()),
    ///     ]),
    ///     vec![RawTag::new("addr:street", "Main Rd")],
    /// );
    /// let shaped = shaper.shape(&element);
    /// assert_eq!(shaped.tags[0].value, "Main Road");
    /// ```
    #[must_use]
    pub fn shape(&self, element: &Element) -> ShapedElement {
        let attributes = self.filter_attributes(element);
        let parent_id = element.id().unwrap_or_default().to_owned();

        let tags = element
            .tags
            .iter()
            .filter_map(|tag| self.reshape_tag(&parent_id, tag))
            .collect();

        let mut way_nodes = Vec::new();
        if element.kind == ElementKind::Way {
            let mut position: u64 = 0;
            for node_id in &element.node_refs {
                way_nodes.push(WayNodeRow {
                    way_id: parent_id.clone(),
                    node_id: node_id.clone(),
                    position,
                });
                position += 1;
            }
        }

        ShapedElement {
            kind: element.kind,
            attributes,
            tags,
            way_nodes,
        }
    }

    /// Reshape one raw tag, or drop it when the key is unusable.
    ///
    /// The key splits on its first `:` only, so `addr:street:old` keeps
    /// namespace `addr` and local key `street:old`; such multi-level keys
    /// are deliberately exempt from street/postcode correction.
    #[must_use]
    pub fn reshape_tag(&self, parent_id: &str, tag: &RawTag) -> Option<TagRow> {
        if self.config.is_problem_key(&tag.key) {
            return None;
        }

        let (namespace, key) = match tag.key.split_once(NAMESPACE_SEPARATOR) {
            None => (DEFAULT_NAMESPACE.to_owned(), tag.key.clone()),
            Some((prefix, local)) => (prefix.to_owned(), local.to_owned()),
        };

        let value = if namespace == ADDRESS_NAMESPACE && !key.contains(NAMESPACE_SEPARATOR) {
            match key.as_str() {
                "street" => self.street.correct(&tag.value),
                "postcode" => self.postcode.correct(&tag.value),
                _ => tag.value.clone(),
            }
        } else {
            tag.value.clone()
        };

        Some(TagRow {
            parent_id: parent_id.to_owned(),
            key,
            value,
            namespace,
        })
    }

    fn filter_attributes(&self, element: &Element) -> Attributes {
        let mut attributes = HashMap::new();
        for field in self.config.allowed_fields(element.kind) {
            if let Some(value) = element.attributes.get(field) {
                attributes.insert(field.clone(), value.clone());
            }
        }
        attributes
    }
}
