//! Tests for loading server configuration from disk.

use std::io::Write;
use std::time::Duration;
use strictly_server::{ConfigArgs, ServerConfig};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config("port = 4242\ngrace_period_secs = 5\n");

    let config = ServerConfig::from_file(file.path()).unwrap();

    assert_eq!(config.port(), &4242);
    assert_eq!(config.grace_period(), Duration::from_secs(5));
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.outbox_capacity(), &64);
    assert!(config.dice_seed().is_none());
}

#[test]
fn test_full_file() {
    let file = write_config(
        r#"
host = "0.0.0.0"
port = 8080
grace_period_secs = 45
dice_seed = 12345
outbox_capacity = 16
"#,
    );

    let config = ServerConfig::from_file(file.path()).unwrap();

    assert_eq!(config.host(), "0.0.0.0");
    assert_eq!(config.dice_seed(), &Some(12345));
    assert_eq!(config.outbox_capacity(), &16);
}

#[test]
fn test_unknown_key_rejected() {
    let file = write_config("prot = 1\n");
    let err = ServerConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_missing_file_reports_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_zero_capacity_in_file_rejected() {
    let file = write_config("outbox_capacity = 0\n");
    assert!(ServerConfig::from_file(file.path()).is_err());
}

#[test]
fn test_rendered_config_loads_back() {
    let config = ServerConfig::default().with_port(7000).with_dice_seed(3);
    let file = write_config(&config.to_toml().unwrap());
    assert_eq!(ServerConfig::from_file(file.path()).unwrap(), config);
}

#[test]
fn test_flags_win_over_file() {
    let file = write_config("port = 4242\n");
    let args = ConfigArgs {
        config: Some(file.path().to_path_buf()),
        port: Some(5151),
        ..ConfigArgs::default()
    };

    let config = args.apply_flags(ServerConfig::from_file(file.path()).unwrap());

    assert_eq!(config.port(), &5151);
}
