//! Loading the application schema from config files on disk.

use layerconf::app::{AppConfig, TimeoutConfig};
use layerconf::{ConfigError, ConfigHolder, DirSource, Loader};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write");
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn loader(
    dir: &Path,
    pairs: &[(&str, &str)],
) -> Loader<AppConfig, DirSource, HashMap<String, String>> {
    Loader::with_env(DirSource::new(dir), env(pairs))
}

#[test]
fn staging_overlay_from_directory() {
    let temp = TempDir::new().expect("tmp");
    write(
        temp.path(),
        "config.yaml",
        "server:\n  port: ${getenv \"PORT:8081\"}\n  timeout: {api: 30, db: 10}\n",
    );
    write(
        temp.path(),
        "config.staging.yaml",
        "server:\n  timeout: {db: 20}\ndatabase:\n  host: staging-db\n",
    );

    let config = loader(temp.path(), &[("ENV", "staging")])
        .load_config()
        .expect("config");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.timeout, TimeoutConfig { api: 30, db: 20 });
    assert_eq!(config.database.host, "staging-db");
}

#[test]
fn missing_base_directory_fails() {
    let temp = TempDir::new().expect("tmp");
    let err = loader(&temp.path().join("absent"), &[])
        .load_config()
        .unwrap_err();
    assert!(matches!(err, ConfigError::SourceUnavailable { .. }), "{err}");
}

#[test]
fn selector_with_path_separator_is_rejected() {
    let temp = TempDir::new().expect("tmp");
    write(temp.path(), "config.yaml", "server:\n  port: 8081\n");
    let err = loader(temp.path(), &[("ENV", "x/../../secrets")])
        .load_config()
        .unwrap_err();
    assert!(matches!(err, ConfigError::SourceUnavailable { .. }), "{err}");
}

#[test]
fn holder_reloads_edited_files() {
    let temp = TempDir::new().expect("tmp");
    write(temp.path(), "config.yaml", "server:\n  port: 8081\n");
    let holder = ConfigHolder::new(loader(temp.path(), &[]));
    assert_eq!(holder.get().server.port, 8081);

    write(temp.path(), "config.yaml", "server:\n  port: 8083\n");
    assert_eq!(holder.get().server.port, 8081);
    holder.load().expect("reload");
    assert_eq!(holder.get().server.port, 8083);
}
