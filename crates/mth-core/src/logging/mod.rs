//! Structured logging setup for applications embedding mth archives.
//!
//! The library only emits `tracing` events; it never installs a subscriber
//! itself. Applications call [`init_logging`] once at startup:
//!
//! ```ignore
//! use mth_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_env(None, None))?;
//! ```
//!
//! Output goes to stderr, either human-readable or as JSON lines.

pub mod config;

pub use config::{parse_level, LogConfig, LogFormat};

use mth_common::{Error, Result};
use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events the level filter applies to.
const TARGETS: &[&str] = &["mth_core", "mth_table", "mth_metadata", "mth_standards"];

/// Build the event filter for `config`.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    if config.honor_rust_log {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    let level = config.level;
    let directives: Vec<String> = TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    EnvFilter::new(directives.join(","))
}

/// Install the global subscriber.
///
/// Fails with a configuration error if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = env_filter(config);

    let installed = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
    };

    installed.map_err(|err| Error::Config(format!("logging already initialized: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_filter_covers_every_crate() {
        let filter = env_filter(&LogConfig::default().with_level(LevelFilter::DEBUG));
        let rendered = filter.to_string().to_lowercase();
        for target in TARGETS {
            assert!(rendered.contains(&format!("{target}=debug")), "{rendered}");
        }
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default().with_level(LevelFilter::OFF);
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
