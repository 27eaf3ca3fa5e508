//! Behaviour tests for declarative schema validation.

use rstest::rstest;

use kerbside_core::shape::{TagRow, WayNodeRow};
use kerbside_core::{
    Attributes, Element, ElementKind, RawTag, ShapedElement, Shaper, default_schema,
};

fn attributes(entries: &[(&str, &str)]) -> Attributes {
    entries
        .iter()
        .map(|&(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

fn valid_node() -> ShapedElement {
    Shaper::default().shape(&Element::node(
        attributes(&[
            ("id", "1"),
            ("lat", "53.3498"),
            ("lon", "-6.2603"),
            ("user", "molly"),
            ("uid", "700"),
            ("version", "2"),
            ("changeset", "31"),
            ("timestamp", "2016-03-01T12:00:00Z"),
        ]),
        vec![RawTag::new("amenity", "pub")],
    ))
}

#[rstest]
fn a_well_formed_node_passes() {
    assert!(default_schema().validate(&valid_node()).is_ok());
}

#[rstest]
fn anonymous_edits_without_user_or_uid_pass() {
    let mut shaped = valid_node();
    shaped.attributes.remove("user");
    shaped.attributes.remove("uid");
    assert!(default_schema().validate(&shaped).is_ok());
}

#[rstest]
#[case("id", "required field is missing")]
#[case("lat", "required field is missing")]
#[case("timestamp", "required field is missing")]
fn missing_required_fields_fail_fast(#[case] field: &str, #[case] reason: &str) {
    let mut shaped = valid_node();
    shaped.attributes.remove(field);
    let violation = default_schema()
        .validate(&shaped)
        .expect_err("validation must fail");
    assert_eq!(violation.field, field);
    assert_eq!(violation.violations, vec![reason.to_owned()]);
    assert_eq!(violation.kind, ElementKind::Node);
}

#[rstest]
#[case("lat", "north-of-the-river")]
#[case("uid", "7.5")]
#[case("changeset", "")]
fn mistyped_fields_fail_with_the_field_name(#[case] field: &str, #[case] value: &str) {
    let mut shaped = valid_node();
    shaped
        .attributes
        .insert(field.to_owned(), value.to_owned());
    let violation = default_schema()
        .validate(&shaped)
        .expect_err("validation must fail");
    assert_eq!(violation.field, field);
    assert!(!violation.violations.is_empty());
}

#[rstest]
#[case("2016-03-01T12:00:00Z", true)]
#[case("2016-03-01 12:00:00", false)]
#[case("yesterday", false)]
fn timestamps_must_match_the_export_form(#[case] timestamp: &str, #[case] ok: bool) {
    let mut shaped = valid_node();
    shaped
        .attributes
        .insert("timestamp".to_owned(), timestamp.to_owned());
    assert_eq!(default_schema().validate(&shaped).is_ok(), ok);
}

#[rstest]
fn tag_rows_are_validated_against_their_own_table() {
    let mut shaped = valid_node();
    shaped.tags.push(TagRow {
        parent_id: "not-an-id".to_owned(),
        key: "amenity".to_owned(),
        value: "pub".to_owned(),
        namespace: "regular".to_owned(),
    });
    let violation = default_schema()
        .validate(&shaped)
        .expect_err("tag row id must be numeric");
    assert_eq!(violation.table, "nodes_tags");
    assert_eq!(violation.field, "id");
}

#[rstest]
fn way_membership_rows_are_validated_against_their_own_table() {
    let shaped = ShapedElement {
        kind: ElementKind::Way,
        attributes: attributes(&[
            ("id", "10"),
            ("version", "1"),
            ("changeset", "31"),
            ("timestamp", "2016-03-01T12:00:00Z"),
        ]),
        tags: Vec::new(),
        way_nodes: vec![WayNodeRow {
            way_id: "10".to_owned(),
            node_id: "ref-without-digits".to_owned(),
            position: 0,
        }],
    };
    let violation = default_schema()
        .validate(&shaped)
        .expect_err("membership node id must be numeric");
    assert_eq!(violation.table, "ways_nodes");
    assert_eq!(violation.field, "node_id");
    assert_eq!(violation.element_id, "10");
}

#[rstest]
fn violations_render_with_locating_context() {
    let mut shaped = valid_node();
    shaped.attributes.remove("changeset");
    let violation = default_schema()
        .validate(&shaped)
        .expect_err("validation must fail");
    let message = violation.to_string();
    assert!(message.contains("node 1"), "message was {message:?}");
    assert!(message.contains("changeset"), "message was {message:?}");
}
