//! Logging setup for binaries built on this crate.
//!
//! The library only emits `tracing` events with `component` and `event`
//! fields; installing a subscriber is left to the binary.

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "TS_WRANGLER_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "TS_WRANGLER_LOG_FORMAT";
const LOG_TARGET_ENV: &str = "TS_WRANGLER_LOG_TARGET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" | "compact" => Ok(Self::Text),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Applies overrides found through `lookup`. Blank or unrecognised values
    /// keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.level = level.trim().to_string();
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV).and_then(|v| v.parse::<LogFormat>().ok()) {
            config.format = format;
        }
        if let Some(target) = lookup(LOG_TARGET_ENV).and_then(|v| parse_switch(&v)) {
            config.include_target = target;
        }
        config
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("invalid log level '{level}': {source}")]
    InvalidLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub fn logging_config_from_env() -> LoggingConfig {
    LoggingConfig::from_lookup(|key| env::var(key).ok())
}

/// Installs a stderr subscriber so report output on stdout stays clean.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let env_filter =
        EnvFilter::try_new(&config.level).map_err(|source| LoggingInitError::InvalidLevel {
            level: config.level.clone(),
            source,
        })?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.compact().finish())?,
    }

    Ok(())
}

pub fn log_app_start(app: &str, config: &LoggingConfig) {
    info!(
        component = app,
        event = "app.start",
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        log_format = ?config.format
    );
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> LoggingConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LoggingConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config_with(&[]), LoggingConfig::default());
    }

    #[test]
    fn overrides_are_read_case_insensitively() {
        let cfg = config_with(&[
            (LOG_LEVEL_ENV, " ts_wrangler=debug "),
            (LOG_FORMAT_ENV, "JSON"),
            (LOG_TARGET_ENV, "on"),
        ]);

        assert_eq!(cfg.level, "ts_wrangler=debug");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.include_target);
    }

    #[test]
    fn unrecognised_values_keep_defaults() {
        let cfg = config_with(&[
            (LOG_LEVEL_ENV, "   "),
            (LOG_FORMAT_ENV, "yaml"),
            (LOG_TARGET_ENV, "maybe"),
        ]);

        assert_eq!(cfg, LoggingConfig::default());
    }

    #[test]
    fn invalid_level_is_reported_before_installing() {
        let cfg = LoggingConfig {
            level: "ts_wrangler=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_logging(&cfg),
            Err(LoggingInitError::InvalidLevel { .. })
        ));
    }
}
