#![cfg(feature = "config")]

//! Configuration file round-trips through the filesystem.

use mesh_split::config::{ConfigError, DecomposeConfig};
use mesh_split::partition::SlicingConfig;
use nalgebra::Vector3;
use tempfile::NamedTempFile;

#[test]
fn test_save_and_reload_toml_file() {
    let config = DecomposeConfig::preset_printer_grid(Vector3::new(220.0, 220.0, 250.0));

    let file = NamedTempFile::with_suffix(".toml").unwrap();
    config.save_toml(file.path()).unwrap();

    let back = DecomposeConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(back.name.as_deref(), Some("printer-grid"));
    match back.slicing {
        SlicingConfig::Grid(grid) => assert!((grid.envelope.z - 250.0).abs() < 1e-12),
        other => panic!("expected grid slicing, got {other:?}"),
    }
    assert!(back.connectors.is_some());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = DecomposeConfig::from_toml_file("/nonexistent/decompose.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_hand_written_file_loads() {
    use std::io::Write;

    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(
        file,
        r#"
name = "bench-fixture"

[slicing]
mode = "manual"
x = {{ enabled = true, offset = 60.0 }}

[connectors]
spacing = 30.0
margin = 12.0
"#
    )
    .unwrap();

    let config = DecomposeConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.name.as_deref(), Some("bench-fixture"));
    let connectors = config.connectors.unwrap();
    assert!((connectors.margin - 12.0).abs() < 1e-12);
    assert!(config.labels.is_none());
}
