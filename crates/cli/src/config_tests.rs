// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use similar_asserts::assert_eq;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let config = ConfigFile::load(&temp.path().join("nope.toml")).unwrap();
    assert_eq!(config, ConfigFile::default());
}

#[test]
fn defaults_match_library_defaults() {
    let sync = ConfigFile::default().to_sync_config().unwrap();
    assert_eq!(sync, SyncConfig::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "[sync]\nurl = \"ws://10.0.0.2:9000\"\nauto_sync_interval_secs = 0\nsource = \"desktop\"\n",
    )
    .unwrap();

    let config = ConfigFile::load(&path).unwrap();
    let sync = config.to_sync_config().unwrap();
    assert_eq!(sync.url, "ws://10.0.0.2:9000");
    assert_eq!(sync.auto_sync_interval, None);
    assert_eq!(sync.source, Source::Desktop);
    assert_eq!(sync.request_timeout, Duration::from_secs(10));
    assert_eq!(sync.reconnect_delay, Duration::from_secs(5));
    assert_eq!(sync.conflict_window, Duration::from_millis(1000));
    assert_eq!(config.connect_timeout(), Duration::from_secs(5));
}

#[test]
fn relative_store_path_resolves_against_config_dir() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "store_path = \"data/store.json\"\n").unwrap();

    let config = ConfigFile::load(&path).unwrap();
    assert_eq!(config.store_path().unwrap(), temp.path().join("data/store.json"));
}

#[test]
fn absolute_store_path_is_kept() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    let store = temp.path().join("elsewhere.json");
    fs::write(&path, format!("store_path = {:?}\n", store.display().to_string())).unwrap();

    let config = ConfigFile::load(&path).unwrap();
    assert_eq!(config.store_path().unwrap(), store);
}

#[test]
fn save_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir").join(CONFIG_FILE_NAME);
    let mut config = ConfigFile::default();
    config.sync.url = "wss://sync.example".to_string();
    config.sync.collections = vec!["prompts".to_string()];
    config.save(&path).unwrap();

    assert_eq!(ConfigFile::load(&path).unwrap(), config);
}

#[test]
fn unparseable_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[sync\nurl = ").unwrap();

    let err = ConfigFile::load(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("failed to parse config"));
}

#[parameterized(
    http_url = { "url = \"http://127.0.0.1:9427\"", "ws://" },
    zero_timeout = { "request_timeout_secs = 0", "request_timeout_secs" },
    no_collections = { "collections = []", "collections" },
)]
fn invalid_sync_table_is_rejected(line: &str, needle: &str) {
    let config: ConfigFile = toml::from_str(&format!("[sync]\n{line}\n")).unwrap();
    let err = config.to_sync_config().unwrap_err();
    assert!(err.to_string().contains(needle), "{err}");
}
