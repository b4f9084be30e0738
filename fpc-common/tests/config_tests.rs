//! Configuration loading and config file resolution tests
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FPC_CONFIG are marked with #[serial].

use fpc_common::config::{ConfigResolver, TomlConfig, CONFIG_ENV_VAR};
use fpc_common::{Error, ValveMode};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/from-cli.toml")));
    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_empty_environment_value_ignored() {
    env::set_var(CONFIG_ENV_VAR, "");

    let resolved = ConfigResolver::new(None).resolve();
    assert_ne!(resolved, Some(PathBuf::from("")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[logging]
level = "debug"

[valve]
initial_mode = "passthrough"
bus_capacity = 256
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.valve.initial_mode, ValveMode::Passthrough);
    assert_eq!(config.valve.bus_capacity, 256);
}

#[test]
fn test_missing_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let config = TomlConfig::load_or_default(Some(path.as_path())).unwrap();
    assert_eq!(config, TomlConfig::default());

    let config = TomlConfig::load_or_default(None).unwrap();
    assert_eq!(config.valve.initial_mode, ValveMode::Merged);
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[valve]\nbus_capacity = \"lots\"\n").unwrap();

    let err = TomlConfig::load_or_default(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}
