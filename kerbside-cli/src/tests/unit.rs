//! Focused unit tests covering shape CLI configuration validation.

use super::*;
use crate::shape::{ShapeArgs, ShapeConfig};
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn utf8_path(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temp paths are UTF-8")
}

#[rstest]
fn converting_without_a_source_errors() {
    let args = ShapeArgs::default();
    let err = ShapeConfig::try_from(args).expect_err("missing source should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_SOURCE);
            assert_eq!(env, ENV_SOURCE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn out_dir_defaults_to_the_working_directory() {
    let args = ShapeArgs {
        source: Some(Utf8PathBuf::from("export.osm")),
        ..ShapeArgs::default()
    };
    let config = ShapeConfig::try_from(args).expect("source alone is sufficient");
    assert_eq!(config.out_dir, Utf8PathBuf::from("."));
    assert!(!config.validate);
}

#[rstest]
fn validate_sources_reports_a_missing_export() {
    let tmp = TempDir::new().expect("tempdir");
    let config = ShapeConfig {
        source: utf8_path(&tmp.path().join("missing.osm")),
        out_dir: utf8_path(tmp.path()),
        validate: false,
        street_corrections: None,
        postcode_corrections: None,
    };
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_SOURCE),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_a_directory_source() {
    let tmp = TempDir::new().expect("tempdir");
    let config = ShapeConfig {
        source: utf8_path(tmp.path()),
        out_dir: utf8_path(tmp.path()),
        validate: false,
        street_corrections: None,
        postcode_corrections: None,
    };
    let err = config
        .validate_sources()
        .expect_err("expected directory rejection");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_SOURCE),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_checks_correction_overrides() {
    let tmp = TempDir::new().expect("tempdir");
    let source = tmp.path().join("export.osm");
    fs::write(&source, b"<osm/>").expect("write export placeholder");
    let config = ShapeConfig {
        source: utf8_path(&source),
        out_dir: utf8_path(tmp.path()),
        validate: false,
        street_corrections: Some(utf8_path(&tmp.path().join("missing.json"))),
        postcode_corrections: None,
    };
    let err = config
        .validate_sources()
        .expect_err("expected missing correction table to fail");
    match err {
        CliError::MissingSourceFile { field, .. } => {
            assert_eq!(field, ARG_STREET_CORRECTIONS);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn correction_overrides_replace_the_built_in_tables() {
    let tmp = TempDir::new().expect("tempdir");
    let table_path = tmp.path().join("streets.json");
    fs::write(
        &table_path,
        br#"{"replacements": {"St": "Street"}}"#,
    )
    .expect("write correction table");

    let table = shape::load_corrections(&utf8_path(&table_path))
        .expect("well-formed table should parse");
    assert_eq!(table.correct("Dame St"), "Dame Street");
}

#[rstest]
fn malformed_correction_tables_are_reported() {
    let tmp = TempDir::new().expect("tempdir");
    let table_path = tmp.path().join("streets.json");
    fs::write(&table_path, b"not json").expect("write bad table");

    let err = shape::load_corrections(&utf8_path(&table_path))
        .expect_err("malformed JSON should error");
    match err {
        CliError::ParseCorrections { path, .. } => {
            assert_eq!(path, utf8_path(&table_path));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn missing_correction_tables_are_reported_on_read() {
    let tmp = TempDir::new().expect("tempdir");
    let table_path = utf8_path(&tmp.path().join("absent.json"));

    let err = shape::load_corrections(&table_path).expect_err("missing file should error");
    match err {
        CliError::OpenCorrections { path, .. } => assert_eq!(path, table_path),
        other => panic!("unexpected error {other:?}"),
    }
}
