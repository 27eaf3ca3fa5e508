//! Learned correction tables for free-text tag values.
//!
//! A [`CorrectionTable`] is an exact-match token replacement map built
//! from auditing a source region's street names and postal codes. The
//! table is loaded once and read-only for the run; [`CorrectionTable::correct`]
//! is a pure per-token substitution, never a partial-token or regex
//! rewrite.

use std::collections::HashMap;

/// Exact-token replacement table for cleaning one class of tag value.
///
/// A replacement mapping to the empty string deletes the token. With
/// `recompose` enabled (postal codes), correction first tries the
/// whitespace-stripped concatenation of all tokens against the table, so
/// codes split across tokens can be re-joined into their canonical form.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use kerbside_core::CorrectionTable;
///
/// let table = CorrectionTable::new(HashMap::from([("Rd".into(), "Road".into())]));
/// assert_eq!(table.correct("Main Rd"), "Main Road");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct CorrectionTable {
    replacements: HashMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    recompose: bool,
}

impl CorrectionTable {
    /// Build a table that substitutes tokens one by one.
    #[must_use]
    pub fn new(replacements: HashMap<String, String>) -> Self {
        Self {
            replacements,
            recompose: false,
        }
    }

    /// Build a table that also tries to re-join split tokens before the
    /// per-token pass.
    #[must_use]
    pub fn with_recompose(replacements: HashMap<String, String>) -> Self {
        Self {
            replacements,
            recompose: true,
        }
    }

    /// Number of learned replacements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Whether the table holds no replacements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Apply the table to a free-text value.
    ///
    /// Splits on whitespace, replaces tokens that exactly match a table
    /// key (dropping tokens mapped to the empty string), and rejoins the
    /// survivors with single spaces. Tokens absent from the table pass
    /// through unchanged, so already-corrected text is a fixed point.
    #[must_use]
    pub fn correct(&self, text: &str) -> String {
        if self.recompose {
            let compact: String = text.split_whitespace().collect();
            if let Some(replacement) = self.replacements.get(&compact) {
                return replacement.clone();
            }
        }
        let corrected: Vec<&str> = text
            .split_whitespace()
            .filter_map(|token| match self.replacements.get(token) {
                Some(replacement) if replacement.is_empty() => None,
                Some(replacement) => Some(replacement.as_str()),
                None => Some(token),
            })
            .collect();
        corrected.join(" ")
    }
}

/// Street-designator corrections learned from auditing the Dublin export.
#[must_use]
pub fn dublin_street_corrections() -> CorrectionTable {
    CorrectionTable::new(owned_map(&[
        ("Ave", "Avenue"),
        ("Rd", "Road"),
        ("road", "Road"),
        ("lane", "Lane"),
    ]))
}

/// Postal-code corrections learned from auditing the Dublin export.
///
/// Bare district numbers become their routing-key form, compact Eircodes
/// gain their canonical space, and two foreign codes map to the empty
/// string, deleting them outright.
#[must_use]
pub fn dublin_postcode_corrections() -> CorrectionTable {
    CorrectionTable::with_recompose(owned_map(&[
        ("1", "D01"),
        ("2", "D02"),
        ("3", "D03"),
        ("4", "D04"),
        ("8", "D08"),
        ("12", "D12"),
        ("13", "D13"),
        ("17", "D17"),
        ("18", "D18"),
        ("22", "D22"),
        ("D15KPW7", "D15 KPW7"),
        ("D01X2P2", "D01 X2P2"),
        ("D05N7F2", "D05 N7F2"),
        ("D6WXK28", "D6W XK28"),
        ("560068", ""),
        ("0000", ""),
    ]))
}

fn owned_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|&(token, replacement)| (token.to_owned(), replacement.to_owned()))
        .collect()
}
