//! Shared fixture helpers for the kerbside-data test suites.

use std::path::PathBuf;

use camino::Utf8PathBuf;

/// Directory containing the OSM XML fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    let manifest = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest.join("tests/fixtures")
}

/// Path to a named fixture export.
pub fn fixture_path(stem: &str) -> Utf8PathBuf {
    fixtures_dir().join(format!("{stem}.osm"))
}

/// Convert a std temporary path into a UTF-8 path, panicking on exotic
/// temp directories.
pub fn utf8_temp_path(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(PathBuf::from(path)).unwrap_or_else(|bad| {
        panic!("temporary path {bad:?} is not valid UTF-8");
    })
}
