//! Configuration resolution against real files and environment variables.
//!
//! Covers:
//! - Resolution order (CLI > MTH_CONFIG > MTH_CONFIG_DIR > XDG > defaults)
//! - A missing CLI path falls through instead of failing
//! - Loaded capacities reach a live archive
//! - A custom catalogue governs records handed to the archive

use mth_core::{
    resolve_config, Archive, ConfigSource, EntityKind, Error, MemContainer, MetadataRecord,
};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &["MTH_CONFIG", "MTH_CONFIG_DIR", "XDG_CONFIG_HOME"];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| (key.to_string(), env::var(key).ok()))
            .collect();
        for key in keys {
            env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_config(path: &Path, run_capacity: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config parent");
    }
    fs::write(path, format!("[capacities]\nrun = {run_capacity}\n")).expect("write config");
}

#[test]
fn test_resolve_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        let cli = temp.path().join("cli.toml");
        let from_env = temp.path().join("env.toml");
        write_config(&cli, 7);
        write_config(&from_env, 9);
        env::set_var("MTH_CONFIG", &from_env);

        let resolved = resolve_config(Some(&cli)).expect("resolve");
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(cli.as_path()));
        assert_eq!(resolved.config.capacities.run, 7);
    });
}

#[test]
fn test_missing_cli_path_falls_back_to_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        let from_env = temp.path().join("env.toml");
        write_config(&from_env, 9);
        env::set_var("MTH_CONFIG", &from_env);

        let resolved = resolve_config(Some(&temp.path().join("missing.toml"))).expect("resolve");
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.config.capacities.run, 9);
    });
}

#[test]
fn test_config_dir_over_xdg() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        let config_dir = temp.path().join("dir");
        let xdg_home = temp.path().join("xdg");
        write_config(&config_dir.join("mth.toml"), 11);
        write_config(&xdg_home.join("mth").join("mth.toml"), 13);
        env::set_var("MTH_CONFIG_DIR", &config_dir);
        env::set_var("XDG_CONFIG_HOME", &xdg_home);

        let resolved = resolve_config(None).expect("resolve");
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.config.capacities.run, 11);
    });
}

#[cfg(target_os = "linux")]
#[test]
fn test_xdg_then_defaults() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        let xdg_home = temp.path().join("xdg");
        env::set_var("XDG_CONFIG_HOME", &xdg_home);

        let resolved = resolve_config(None).expect("resolve");
        assert_eq!(resolved.source, ConfigSource::BuiltinDefault);
        assert!(resolved.path.is_none());
        assert_eq!(resolved.config.capacities.run, 20);

        write_config(&xdg_home.join("mth").join("mth.toml"), 13);
        let resolved = resolve_config(None).expect("resolve");
        assert_eq!(resolved.source, ConfigSource::XdgConfig);
        assert_eq!(resolved.config.capacities.run, 13);
    });
}

#[test]
fn test_invalid_file_is_an_error() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("bad.toml");
        fs::write(&path, "[capacities]\nrun = 0\n").expect("write config");

        let err = resolve_config(Some(&path)).expect_err("zero capacity");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.code(), 40);
    });
}

#[test]
fn test_capacities_reach_the_archive() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("small.toml");
        write_config(&path, 3);

        let resolved = resolve_config(Some(&path)).expect("resolve");
        let archive = Archive::initialize(MemContainer::new(), &resolved.config).expect("archive");
        assert_eq!(archive.profiles().get(EntityKind::Run).capacity, 3);
    });
}

#[test]
fn test_custom_catalog_is_used() {
    let temp = TempDir::new().expect("temp dir");
    let catalog = temp.path().join("standards.json");
    fs::write(
        &catalog,
        r#"{"station": [{"path": "archive_id", "type": "string", "required": true, "style": "name"}]}"#,
    )
    .expect("write catalog");
    let config_path = temp.path().join("mth.toml");
    fs::write(&config_path, format!("catalog = {:?}\n", catalog.display().to_string()))
        .expect("write config");

    let config = mth_core::ArchiveConfig::load(&config_path).expect("load");
    let archive = Archive::initialize(MemContainer::new(), &config).expect("archive");
    let standards = archive.standards().expect("standards");
    assert_eq!(standards.summary_table().unwrap().row_count().unwrap(), 1);
    assert!(standards.find_rule("station.archive_id").is_ok());
}

#[test]
fn test_custom_catalog_rejects_foreign_attributes() {
    let temp = TempDir::new().expect("temp dir");
    let catalog = temp.path().join("standards.json");
    fs::write(
        &catalog,
        r#"{"station": [{"path": "archive_id", "type": "string", "required": true, "style": "name"}]}"#,
    )
    .expect("write catalog");
    let config = mth_core::ArchiveConfig {
        catalog: Some(catalog),
        ..Default::default()
    };
    let archive = Archive::initialize(MemContainer::new(), &config).expect("archive");
    let stations = archive.stations().expect("stations");

    let mut record = MetadataRecord::new(EntityKind::Station).expect("record");
    record.set("archive_id", "MT001").expect("archive_id");
    record.set("location.latitude", 40.5).expect("latitude");
    let err = stations.add_station("MT001", Some(record)).unwrap_err();
    assert!(matches!(err, Error::UnknownAttribute { .. }));
    assert!(stations.station_names().expect("names").is_empty());
    assert_eq!(stations.summary_table().unwrap().row_count().unwrap(), 0);

    let mut record = MetadataRecord::new(EntityKind::Station).expect("record");
    record.set("archive_id", "MT002").expect("archive_id");
    let (station, created) = stations.add_station("MT002", Some(record)).expect("add");
    assert!(created);
    assert_eq!(station.metadata().schema().len(), 1);
    let reopened = stations.get_station("MT002").expect("reopen");
    assert_eq!(reopened.metadata().get_str("archive_id"), Some("MT002"));
}
