//! Archive configuration and config file discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → defaults.
//!
//! ```toml
//! catalog = "/srv/mth/standards.json"
//!
//! [capacities]
//! run = 40
//! stations = 5000
//! ```

use mth_common::{EntityKind, Error, Result};
use mth_table::default_capacity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable names.
const ENV_CONFIG_PATH: &str = "MTH_CONFIG";
const ENV_CONFIG_DIR: &str = "MTH_CONFIG_DIR";

/// Standard config file name.
const CONFIG_FILENAME: &str = "mth.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "mth";

/// Hard row bounds of each kind's summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Capacities {
    pub survey: usize,
    pub stations: usize,
    pub station: usize,
    pub run: usize,
    pub standards: usize,
    pub filters: usize,
    pub reports: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            survey: default_capacity(EntityKind::Survey),
            stations: default_capacity(EntityKind::Stations),
            station: default_capacity(EntityKind::Station),
            run: default_capacity(EntityKind::Run),
            standards: default_capacity(EntityKind::Standards),
            filters: default_capacity(EntityKind::Filters),
            reports: default_capacity(EntityKind::Reports),
        }
    }
}

impl Capacities {
    /// Capacity for `kind`; channels keep no table and get zero.
    pub fn for_kind(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Survey => self.survey,
            EntityKind::Stations => self.stations,
            EntityKind::Station => self.station,
            EntityKind::Run => self.run,
            EntityKind::Standards => self.standards,
            EntityKind::Filters => self.filters,
            EntityKind::Reports => self.reports,
            EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary => 0,
        }
    }

    fn named(&self) -> [(&'static str, usize); 7] {
        [
            ("survey", self.survey),
            ("stations", self.stations),
            ("station", self.station),
            ("run", self.run),
            ("standards", self.standards),
            ("filters", self.filters),
            ("reports", self.reports),
        ]
    }
}

/// Archive-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Alternate standards catalogue (JSON). The embedded one is used when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    pub capacities: Capacities,
}

impl ArchiveConfig {
    /// Parse TOML text and validate it.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ArchiveConfig =
            toml::from_str(text).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))
    }

    /// Reject configurations no archive can be built from.
    pub fn validate(&self) -> Result<()> {
        if let Some((name, _)) = self
            .capacities
            .named()
            .into_iter()
            .find(|(_, capacity)| *capacity == 0)
        {
            return Err(Error::Config(format!("capacities.{name} must be positive")));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| Error::Config(err.to_string()))
    }
}

/// Where the configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: ArchiveConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Find and load the configuration.
///
/// Resolution order:
/// 1. Explicit CLI path (if provided and present)
/// 2. `MTH_CONFIG` environment variable
/// 3. `MTH_CONFIG_DIR` environment variable + `mth.toml`
/// 4. XDG config directory (`~/.config/mth/mth.toml`)
/// 5. Built-in defaults
pub fn resolve_config(cli_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (path, source) = locate_config_file(cli_path);
    let config = match &path {
        Some(path) => ArchiveConfig::load(path)?,
        None => ArchiveConfig::default(),
    };
    debug!(source = %source, path = ?path, "resolved archive config");
    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

fn locate_config_file(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::CliArgument);
        }
        warn!(path = %path.display(), "config file not found, falling back");
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(path) = xdg_config_dir().map(|dir| dir.join(CONFIG_FILENAME)) {
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for mth.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacities() {
        let capacities = Capacities::default();
        assert_eq!(capacities.for_kind(EntityKind::Run), 20);
        assert_eq!(capacities.for_kind(EntityKind::Standards), 500);
        assert_eq!(capacities.for_kind(EntityKind::Survey), 10_000);
        assert_eq!(capacities.for_kind(EntityKind::Magnetic), 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ArchiveConfig::from_toml("[capacities]\nrun = 40\n").unwrap();
        assert_eq!(config.capacities.run, 40);
        assert_eq!(config.capacities.station, 1000);
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = ArchiveConfig::from_toml("[capacities]\nreports = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(ref message) if message.contains("reports")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ArchiveConfig::from_toml("compression = 9\n").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = ArchiveConfig::default();
        config.capacities.run = 64;
        config.catalog = Some(PathBuf::from("/tmp/standards.json"));
        let back = ArchiveConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::CliArgument.to_string(), "CLI argument");
        assert_eq!(ConfigSource::BuiltinDefault.to_string(), "builtin default");
    }

    #[test]
    fn test_xdg_config_dir() {
        if let Some(path) = xdg_config_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }
}
