//! Tests for config file loading.

use lumberjack::{Config, Error, Level, RotatingWriter};
use std::fs;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.parse_level(), Level::Info);
    assert_eq!(config.rotation.max_size_bytes(), 100 * 1024 * 1024);
    assert_eq!(config.rotation.max_backups, 0);
}

#[test]
fn file_values_are_loaded() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("config.toml");
    fs::write(
        &file,
        r#"
[general]
level = "warn"

[rotation]
max_size_mb = 2
max_age_days = 14
max_backups = 4
local_time = true
compress = true
"#,
    )
    .unwrap();

    let config = Config::load_from(&file).unwrap();
    assert_eq!(config.parse_level(), Level::Warn);
    assert_eq!(config.rotation.max_size_mb, 2);
    assert_eq!(config.rotation.max_age_days, 14);
    assert_eq!(config.rotation.max_backups, 4);
    assert!(config.rotation.local_time);
    assert!(config.rotation.compress);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("config.toml");
    fs::write(&file, "[rotation\nmax_size_mb = 2").unwrap();

    assert!(matches!(Config::load_from(&file), Err(Error::ConfigParse(_))));
}

#[test]
fn writer_takes_limits_from_config() {
    let dir = tempdir().unwrap();
    let config = Config::parse("[rotation]\nmax_size_mb = 3\nmax_backups = 2").unwrap();

    let writer = RotatingWriter::new(dir.path().join("app.log"), config.rotation).unwrap();
    assert_eq!(writer.max_size(), 3 * 1024 * 1024);
    assert_eq!(writer.config().max_backups, 2);
    assert!(writer.path().is_absolute());
}
