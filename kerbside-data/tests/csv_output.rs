//! Integration tests for the five-file CSV layout.

use std::fs;

use rstest::rstest;
use tempfile::TempDir;

use kerbside_core::Shaper;
use kerbside_data::sink::{
    NODE_TAGS_FILE, NODES_FILE, WAY_NODES_FILE, WAY_TAGS_FILE, WAYS_FILE,
};
use kerbside_data::shape_to_csv;

mod support;

use support::{fixture_path, utf8_temp_path};

#[rstest]
fn all_five_tables_are_written_with_headers() {
    let out = TempDir::new().expect("tempdir");
    let out_dir = utf8_temp_path(out.path());
    let summary = shape_to_csv(
        &fixture_path("dublin_sample"),
        &out_dir,
        &Shaper::default(),
        None,
    )
    .expect("sample export shapes cleanly");

    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.ways, 1);

    let nodes = fs::read_to_string(out_dir.join(NODES_FILE)).expect("nodes table");
    let mut lines = nodes.lines();
    assert_eq!(
        lines.next(),
        Some("id,lat,lon,user,uid,version,changeset,timestamp")
    );
    // Header plus one line per node.
    assert_eq!(nodes.lines().count(), 3);

    for file in [NODE_TAGS_FILE, WAYS_FILE, WAY_NODES_FILE, WAY_TAGS_FILE] {
        assert!(out_dir.join(file).is_file(), "{file} missing");
    }
}

#[rstest]
fn tag_rows_carry_namespace_and_corrected_values() {
    let out = TempDir::new().expect("tempdir");
    let out_dir = utf8_temp_path(out.path());
    shape_to_csv(
        &fixture_path("dublin_sample"),
        &out_dir,
        &Shaper::default(),
        None,
    )
    .expect("sample export shapes cleanly");

    let tags = fs::read_to_string(out_dir.join(NODE_TAGS_FILE)).expect("node tags table");
    assert!(tags.contains("1,street,Eden Quay Road,addr"));
    assert!(tags.contains("1,postcode,D01 X2P2,addr"));
    assert!(tags.contains("1,amenity,cafe,regular"));
}

#[rstest]
fn membership_rows_are_written_in_order() {
    let out = TempDir::new().expect("tempdir");
    let out_dir = utf8_temp_path(out.path());
    shape_to_csv(
        &fixture_path("dublin_sample"),
        &out_dir,
        &Shaper::default(),
        None,
    )
    .expect("sample export shapes cleanly");

    let memberships = fs::read_to_string(out_dir.join(WAY_NODES_FILE)).expect("membership table");
    let lines: Vec<&str> = memberships.lines().collect();
    assert_eq!(lines, vec!["id,node_id,position", "10,1,0", "10,2,1"]);
}

#[rstest]
fn rows_flushed_before_an_abort_stay_in_place() {
    let out = TempDir::new().expect("tempdir");
    let out_dir = utf8_temp_path(out.path());
    let schema = kerbside_core::default_schema();
    shape_to_csv(
        &fixture_path("missing_latitude"),
        &out_dir,
        &Shaper::default(),
        Some(&schema),
    )
    .expect_err("invalid node must abort the run");

    // The output files exist with their headers; no transactional rollback.
    assert!(out_dir.join(NODES_FILE).is_file());
}
