//! Tracing subscriber setup
//!
//! Libraries in this workspace only emit `tracing` events. An embedding
//! application calls [`init_logging`] once to decide where they go.

use crate::config_error;
use crate::error::ScholarResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Source file and line of each event
    pub include_location: bool,
    /// Thread id and name of each event
    pub include_thread: bool,
    pub log_to_file: bool,
    /// Appended to, never truncated. Required when `log_to_file` is set.
    pub log_file_path: Option<PathBuf>,
    /// Report span timings when spans close
    pub enable_performance_monitoring: bool,
    /// Extra `target=level` directives layered over `level`; ignored when
    /// `RUST_LOG` is set
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_to_file: false,
            log_file_path: None,
            enable_performance_monitoring: false,
            filter_directives: Vec::new(),
        }
    }
}

/// Effective filter for `config`, given the value of `RUST_LOG`
fn build_filter(config: &LoggingConfig, env: Option<&str>) -> ScholarResult<EnvFilter> {
    if let Some(env) = env.filter(|value| !value.trim().is_empty()) {
        return EnvFilter::try_new(env)
            .map_err(|e| config_error!(format!("Invalid RUST_LOG {:?}", env), "logging", e));
    }

    let mut filter = EnvFilter::try_new(&config.level).map_err(|e| {
        config_error!(format!("Invalid log level {:?}", config.level), "logging", e)
    })?;
    for directive in &config.filter_directives {
        let directive: Directive = directive.parse::<Directive>().map_err(|e| {
            config_error!(format!("Invalid filter directive {:?}", directive), "logging", e)
        })?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Install the global subscriber.
///
/// A non-empty `RUST_LOG` replaces both `config.level` and
/// `config.filter_directives`. Fails when a global subscriber is already
/// installed.
pub fn init_logging(config: &LoggingConfig) -> ScholarResult<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, env.as_deref())?;

    let span_events = if config.enable_performance_monitoring {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = fmt::layer()
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread)
        .with_thread_names(config.include_thread)
        .with_writer(make_writer(config)?);

    let output = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|e| config_error!("A global subscriber is already installed", "logging", e))
}

fn make_writer(config: &LoggingConfig) -> ScholarResult<BoxMakeWriter> {
    if !config.log_to_file {
        return Ok(BoxMakeWriter::new(std::io::stdout));
    }

    let path = config.log_file_path.as_ref().ok_or_else(|| {
        config_error!("log_file_path is required when log_to_file is enabled", "logging")
    })?;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| config_error!(format!("Cannot open log file {}", path.display()), "logging", e))?;

    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

pub mod performance {
    use std::time::Instant;

    /// Run `f` inside a `performance` span and report its duration at debug
    /// level
    pub fn measure_sync<T>(operation: &str, f: impl FnOnce() -> T) -> T {
        let span = tracing::info_span!("performance", operation);
        let started = Instant::now();
        let value = span.in_scope(f);
        tracing::debug!(
            target: "performance",
            operation,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Finished"
        );
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScholarError;

    #[test]
    fn file_logging_requires_path() {
        let config = LoggingConfig {
            log_to_file: true,
            log_file_path: None,
            ..Default::default()
        };
        assert!(matches!(make_writer(&config), Err(ScholarError::Config { .. })));
    }

    #[test]
    fn file_writer_opens_in_append_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scholar.log");
        std::fs::write(&path, "existing\n").unwrap();

        let config = LoggingConfig {
            log_to_file: true,
            log_file_path: Some(path.clone()),
            ..Default::default()
        };
        assert!(make_writer(&config).is_ok());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\n");
    }

    #[test]
    fn format_parses_lowercase() {
        let config: LoggingConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(config.filter_directives.is_empty());
    }

    #[test]
    fn bad_directive_is_a_config_error() {
        let config = LoggingConfig {
            filter_directives: vec!["scholar_core=loud".to_string()],
            ..Default::default()
        };
        assert!(matches!(build_filter(&config, None), Err(ScholarError::Config { .. })));
    }

    #[test]
    fn level_is_not_pinned_by_default_directives() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        let filter = build_filter(&config, None).unwrap().to_string();
        assert!(filter.contains("debug"));
        assert!(!filter.contains("=info"));
    }

    #[test]
    fn rust_log_replaces_level_and_directives() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            filter_directives: vec!["scholar_export=trace".to_string()],
            ..Default::default()
        };
        let filter = build_filter(&config, Some("warn")).unwrap().to_string();
        assert!(filter.contains("warn"));
        assert!(!filter.contains("debug"));
        assert!(!filter.contains("scholar_export"));

        let filter = build_filter(&config, None).unwrap().to_string();
        assert!(filter.contains("scholar_export=trace"));
        assert!(filter.contains("debug"));
    }

    #[test]
    fn measure_sync_returns_value() {
        assert_eq!(performance::measure_sync("add", || 2 + 2), 4);
    }
}
