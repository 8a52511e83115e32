//! Logging configuration, read from `MTH_LOG`, `MTH_LOG_FORMAT` and
//! `RUST_LOG` with optional overrides from the embedding application.

use mth_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// Where archive events are rendered for people or for log shippers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(Error::Config(format!("unknown log format: {other}"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a level name; `warning` and `quiet` are accepted spellings.
pub fn parse_level(s: &str) -> Result<LevelFilter> {
    let name = s.trim().to_ascii_lowercase();
    let name = match name.as_str() {
        "warning" => "warn",
        "quiet" | "none" => "off",
        other => other,
    };
    name.parse::<LevelFilter>()
        .map_err(|_| Error::Config(format!("unknown log level: {s}")))
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Applied to every archive crate unless `RUST_LOG` is honored.
    pub level: LevelFilter,
    pub timestamps: bool,
    /// Use `RUST_LOG` directives verbatim instead of `level`.
    pub honor_rust_log: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            timestamps: true,
            honor_rust_log: false,
        }
    }
}

impl LogConfig {
    /// Settings from the process environment; `level` and `format` win
    /// over it when given.
    pub fn from_env(level: Option<LevelFilter>, format: Option<LogFormat>) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), level, format)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        level: Option<LevelFilter>,
        format: Option<LogFormat>,
    ) -> Self {
        let mut config = LogConfig::default();

        // unparseable values keep the default
        match lookup("MTH_LOG") {
            Some(raw) => {
                if let Ok(parsed) = parse_level(&raw) {
                    config.level = parsed;
                }
            }
            None => config.honor_rust_log = lookup("RUST_LOG").is_some(),
        }
        if let Some(parsed) = lookup("MTH_LOG_FORMAT").and_then(|raw| raw.parse().ok()) {
            config.format = parsed;
        }

        if let Some(level) = level {
            config.level = level;
            config.honor_rust_log = false;
        }
        config.format = format.unwrap_or(config.format);
        config
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    pub fn with_level(self, level: LevelFilter) -> Self {
        Self { level, honor_rust_log: false, ..self }
    }

    pub fn with_timestamps(self, timestamps: bool) -> Self {
        Self { timestamps, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn format_names() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!(LogFormat::Jsonl.to_string(), "jsonl");
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert_eq!(err.code(), 40);
    }

    #[test]
    fn level_spellings() {
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level(" quiet ").unwrap(), LevelFilter::OFF);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn mth_log_shadows_rust_log() {
        let config = LogConfig::from_lookup(
            env(&[("MTH_LOG", "debug"), ("RUST_LOG", "trace"), ("MTH_LOG_FORMAT", "jsonl")]),
            None,
            None,
        );
        assert_eq!(config.level, LevelFilter::DEBUG);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert!(!config.honor_rust_log);
    }

    #[test]
    fn rust_log_alone_is_honored() {
        let config = LogConfig::from_lookup(env(&[("RUST_LOG", "mth_core=trace")]), None, None);
        assert!(config.honor_rust_log);
        assert_eq!(config.level, LevelFilter::INFO);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = LogConfig::from_lookup(
            env(&[("MTH_LOG", "loud"), ("MTH_LOG_FORMAT", "xml")]),
            None,
            None,
        );
        assert_eq!(config.level, LevelFilter::INFO);
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn explicit_overrides_win() {
        let config = LogConfig::from_lookup(
            env(&[("MTH_LOG", "debug"), ("RUST_LOG", "trace")]),
            Some(LevelFilter::ERROR),
            Some(LogFormat::Jsonl),
        );
        assert_eq!(config.level, LevelFilter::ERROR);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert!(!config.honor_rust_log);
    }
}
