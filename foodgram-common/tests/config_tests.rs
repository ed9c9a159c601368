//! Tests for configuration resolution
//!
//! Covers:
//! - TOML parsing with missing sections falling back to defaults
//! - Priority order: CLI → environment → TOML → compiled default
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.

use foodgram_common::config::{
    ConfigOverrides, ServiceConfig, TomlConfig, DATABASE_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT,
    PORT_ENV, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn clear_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    env::remove_var(PORT_ENV);
    env::remove_var("FOODGRAM_HOST");
    env::remove_var("FOODGRAM_DATABASE");
}

#[test]
fn test_parse_full_toml() {
    let config = TomlConfig::parse(
        r#"
        root_folder = "/srv/foodgram"
        host = "0.0.0.0"
        port = 9000

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/foodgram")));
    assert_eq!(config.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.port, Some(9000));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_parse_empty_toml_uses_defaults() {
    let config = TomlConfig::parse("").unwrap();
    assert!(config.root_folder.is_none());
    assert!(config.port.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_parse_invalid_toml_is_config_error() {
    let err = TomlConfig::parse("port = \"not a number\"").unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 8123\n").unwrap();

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.port, Some(8123));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");
    assert!(TomlConfig::load_or_default(Some(&path)).is_err());
}

#[test]
fn test_locate_prefers_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    assert_eq!(TomlConfig::locate(Some(&path)), Some(path.clone()));
    if let Some(found) = TomlConfig::locate(None) {
        assert!(found.exists());
    }
}

#[test]
#[serial]
fn test_defaults_without_overrides() {
    clear_env();

    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default()).unwrap();

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.host, DEFAULT_HOST);
    assert_eq!(config.database_path, config.root_folder.join(DATABASE_FILE_NAME));
    assert_eq!(config.log_level, "info");
}

#[test]
#[serial]
fn test_toml_overrides_defaults() {
    clear_env();
    let toml = TomlConfig::parse("root_folder = \"/tmp/fg-toml\"\nport = 9100\n").unwrap();

    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &toml).unwrap();

    assert_eq!(config.root_folder, PathBuf::from("/tmp/fg-toml"));
    assert_eq!(config.database_path, PathBuf::from("/tmp/fg-toml").join(DATABASE_FILE_NAME));
    assert_eq!(config.port, 9100);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/fg-env");
    env::set_var(PORT_ENV, "9200");
    let toml = TomlConfig::parse("root_folder = \"/tmp/fg-toml\"\nport = 9100\n").unwrap();

    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &toml).unwrap();

    assert_eq!(config.root_folder, PathBuf::from("/tmp/fg-env"));
    assert_eq!(config.port, 9200);
    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/fg-env");
    env::set_var(PORT_ENV, "9200");
    let cli = ConfigOverrides {
        root_folder: Some(PathBuf::from("/tmp/fg-cli")),
        port: Some(9300),
        database_path: Some(PathBuf::from("/tmp/other.db")),
        host: None,
    };

    let config = ServiceConfig::resolve(&cli, &TomlConfig::default()).unwrap();

    assert_eq!(config.root_folder, PathBuf::from("/tmp/fg-cli"));
    assert_eq!(config.port, 9300);
    assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
    assert_eq!(config.bind_addr(), format!("{}:9300", DEFAULT_HOST));
    clear_env();
}

#[test]
#[serial]
fn test_invalid_port_env_is_error() {
    clear_env();
    env::set_var(PORT_ENV, "eighty");

    let result = ServiceConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default());

    assert!(result.is_err());
    clear_env();
}
