//! Configuration management

use crate::config_error;
use crate::error::{ErrorContext, ScholarError, ScholarResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
    pub service: ServiceConfig,
    pub history: HistoryConfig,
    pub layout: LayoutConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Remote research service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; the research endpoint is `{base_url}/supervisor`
    pub base_url: String,
    /// Upper bound for one research request
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 120_000,
            user_agent: "scholar/0.1".to_string(),
        }
    }
}

/// History sidebar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Titles longer than this many characters are cut and suffixed with "..."
    pub title_max_chars: usize,
    /// Label for entries created by "new chat"
    pub blank_title: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            title_max_chars: 30,
            blank_title: "New Chat".to_string(),
        }
    }
}

/// Where the paginator checks for page overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Check after whole paragraphs only; web records are never checked.
    /// A paragraph taller than a page runs past the bottom margin.
    ParagraphBoundary,
    /// Break before any wrapped line, header or web record that would end
    /// past the capacity
    LineBoundary,
}

/// Page geometry for the paginated export, in millimetres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    /// Cursor position past which a new page starts
    pub page_capacity: f32,
    pub line_height: f32,
    pub header_height: f32,
    pub section_gap: f32,
    pub record_gap: f32,
    /// Wrap width in characters
    pub wrap_columns: usize,
    /// Distance of the footer baseline from the bottom edge
    pub footer_offset: f32,
    pub font_size: f32,
    pub header_font_size: f32,
    pub overflow: OverflowPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin_top: 20.0,
            margin_left: 20.0,
            page_capacity: 270.0,
            line_height: 7.0,
            header_height: 10.0,
            section_gap: 5.0,
            record_gap: 3.0,
            wrap_columns: 90,
            footer_offset: 10.0,
            font_size: 11.0,
            header_font_size: 14.0,
            overflow: OverflowPolicy::ParagraphBoundary,
        }
    }
}

/// Export artifact settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Maximum length of the sanitized task part of a filename
    pub filename_max_len: usize,
    /// Used when the task has no alphanumeric characters at all
    pub fallback_stem: String,
    /// Directory used by the bundled file sink
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename_max_len: 50,
            fallback_stem: "report".to_string(),
            output_dir: None,
        }
    }
}

impl ScholarConfig {
    /// `<config dir>/scholar/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scholar").join("config.toml"))
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScholarResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScholarError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ScholarConfig = toml::from_str(&content).map_err(|e| ScholarError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ScholarResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ScholarResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| config_error!(format!("Failed to serialize config: {}", e), "config", e))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| ScholarError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Override service settings from the environment.
    ///
    /// Reads a `.env` file first if one is present. Recognises
    /// `SCHOLAR_SERVICE_URL` and `SCHOLAR_TIMEOUT_MS`.
    pub fn apply_env(mut self) -> ScholarResult<Self> {
        let _ = dotenvy::dotenv();

        if let Ok(url) = std::env::var("SCHOLAR_SERVICE_URL") {
            self.service.base_url = url;
        }

        if let Ok(raw) = std::env::var("SCHOLAR_TIMEOUT_MS") {
            self.service.timeout_ms = raw.parse::<u64>().map_err(|e| {
                config_error!(format!("SCHOLAR_TIMEOUT_MS is not a number: {}", raw), "config", e)
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> ScholarResult<()> {
        let fail = |message: &str, suggestion: &str| ScholarError::Config {
            message: message.to_string(),
            source: None,
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion(suggestion),
        };

        if self.service.base_url.trim().is_empty() {
            return Err(fail(
                "Service base_url must not be empty",
                "Set service.base_url to the research service address",
            ));
        }

        if self.service.timeout_ms == 0 {
            return Err(fail(
                "Service timeout_ms must be greater than 0",
                "Set service.timeout_ms to a positive value",
            ));
        }

        if self.history.title_max_chars == 0 {
            return Err(fail(
                "History title_max_chars must be greater than 0",
                "Set history.title_max_chars to a positive value",
            ));
        }

        let layout = &self.layout;
        if layout.line_height <= 0.0 || layout.header_height <= 0.0 {
            return Err(fail(
                "Layout line_height and header_height must be positive",
                "Check the [layout] section",
            ));
        }

        if layout.page_capacity <= layout.margin_top || layout.page_capacity > layout.page_height
        {
            return Err(fail(
                "Layout page_capacity must lie between margin_top and page_height",
                "Check layout.page_capacity",
            ));
        }

        if layout.wrap_columns == 0 {
            return Err(fail(
                "Layout wrap_columns must be greater than 0",
                "Set layout.wrap_columns to a positive value",
            ));
        }

        if self.export.filename_max_len == 0 {
            return Err(fail(
                "Export filename_max_len must be greater than 0",
                "Set export.filename_max_len to a positive value",
            ));
        }

        Ok(())
    }
}
