//! Error type shared by every Scholar crate
//!
//! Each failure carries an [`ErrorContext`] naming where it happened and what
//! the user can do about it. Failures never leave partial state behind; the
//! caller decides whether to show [`ScholarError::user_message`] and moves on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, warn};

pub type ScholarResult<T> = Result<T, ScholarError>;

/// Boxed cause attached to an error
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Where and when a failure happened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Random id so one failure can be found across log lines
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    pub component: String,
    pub operation: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Hints shown next to the message, most useful first
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: BTreeMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(self, operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..self
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, hint: impl Into<String>) -> Self {
        self.recovery_suggestions.push(hint.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum ScholarError {
    /// Input rejected locally; nothing was sent anywhere
    #[error("Invalid {}: {message}", field.as_deref().unwrap_or("input"))]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    /// The research service answered with a failure, a malformed body, or not at all
    #[error("Research service failed: {message}")]
    Service {
        message: String,
        /// HTTP status when the service answered at all
        status: Option<u16>,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("{operation} gave up after {duration_ms} ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    /// A host facility (clipboard, file save, print) or an encoder failed
    #[error("Export failed: {message}")]
    Export {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("Bad configuration: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScholarError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ScholarError::Validation { context, .. }
            | ScholarError::Service { context, .. }
            | ScholarError::Timeout { context, .. }
            | ScholarError::Export { context, .. }
            | ScholarError::Config { context, .. } => Some(context),
            ScholarError::Io(_) | ScholarError::Serialization(_) => None,
        }
    }

    /// Whether the user can sensibly try the same action again.
    ///
    /// Nothing is retried automatically; this only drives the wording of the
    /// message shown to the user.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // 4xx means the request itself was wrong
            ScholarError::Service { status, .. } => !matches!(status, Some(400..=499)),
            ScholarError::Timeout { .. } | ScholarError::Export { .. } | ScholarError::Io(_) => true,
            ScholarError::Validation { .. }
            | ScholarError::Config { .. }
            | ScholarError::Serialization(_) => false,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ScholarError::Validation { message, .. } => message.clone(),
            ScholarError::Service { message, .. } => {
                format!("The research request failed: {}", message)
            }
            ScholarError::Timeout { duration_ms, .. } if *duration_ms < 1000 => format!(
                "The research request did not finish within {} ms",
                duration_ms
            ),
            ScholarError::Timeout { duration_ms, .. } => format!(
                "The research request did not finish within {} seconds",
                format_seconds(*duration_ms)
            ),
            ScholarError::Export { message, .. } => format!("Export failed: {}", message),
            other => other.to_string(),
        }
    }

    /// Emit one log event for this error.
    ///
    /// Rejected input is only interesting while debugging; failures the user
    /// can retry are warnings; everything else is an error.
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        let component = self.context().map(|c| c.component.as_str());
        let operation = self.context().and_then(|c| c.operation.as_deref());

        match self {
            ScholarError::Validation { field, .. } => {
                debug!(?error_id, ?field, error = %self, "Rejected input");
            }
            ScholarError::Service { status, .. } => {
                warn!(?error_id, ?component, ?operation, ?status, error = %self, "Research service failure");
            }
            _ if self.is_recoverable() => {
                warn!(?error_id, ?component, ?operation, error = %self, "Recoverable failure");
            }
            _ => {
                error!(?error_id, ?component, ?operation, error = %self, "Unrecoverable failure");
            }
        }
    }
}

/// Whole seconds print without a fraction, anything else with one decimal
fn format_seconds(duration_ms: u64) -> String {
    if duration_ms % 1000 == 0 {
        (duration_ms / 1000).to_string()
    } else {
        format!("{:.1}", duration_ms as f64 / 1000.0)
    }
}

/// `validation_error!(message, field, component)`
#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::ScholarError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion(format!("Provide a non-empty {}", $field)),
        }
    };
}

/// `service_error!(message, component[, source])`
#[macro_export]
macro_rules! service_error {
    ($msg:expr, $component:expr) => {
        $crate::ScholarError::Service {
            message: $msg.to_string(),
            status: None,
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ScholarError::Service {
            message: $msg.to_string(),
            status: None,
            source: Some($source.into()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the research service is reachable"),
        }
    };
}

/// `export_error!(message, component[, source])`
#[macro_export]
macro_rules! export_error {
    ($msg:expr, $component:expr) => {
        $crate::ScholarError::Export {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ScholarError::Export {
            message: $msg.to_string(),
            source: Some($source.into()),
            context: $crate::ErrorContext::new($component),
        }
    };
}

/// `config_error!(message, component[, source])`
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::ScholarError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ScholarError::Config {
            message: $msg.to_string(),
            source: Some($source.into()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: Option<u16>) -> ScholarError {
        ScholarError::Service {
            message: "upstream".to_string(),
            status,
            source: None,
            context: ErrorContext::new("test"),
        }
    }

    #[test]
    fn client_errors_are_not_recoverable() {
        assert!(!service(Some(400)).is_recoverable());
        assert!(!service(Some(499)).is_recoverable());
        assert!(service(Some(502)).is_recoverable());
        assert!(service(None).is_recoverable());
    }

    #[test]
    fn user_message_for_timeout_uses_seconds() {
        let err = ScholarError::Timeout {
            operation: "research".to_string(),
            duration_ms: 120_000,
            context: ErrorContext::new("test"),
        };
        assert!(err.user_message().contains("120 seconds"));
        assert_eq!(err.to_string(), "research gave up after 120000 ms");
    }

    #[test]
    fn user_message_for_short_timeouts_keeps_precision() {
        let timeout = |duration_ms| ScholarError::Timeout {
            operation: "research".to_string(),
            duration_ms,
            context: ErrorContext::new("test"),
        };
        assert!(timeout(250).user_message().ends_with("within 250 ms"));
        assert!(timeout(1_500).user_message().ends_with("within 1.5 seconds"));
        assert!(!timeout(999).user_message().contains("0 seconds"));
    }

    #[test]
    fn validation_display_names_the_field() {
        let err = validation_error!("Task must not be empty", "task", "test");
        assert_eq!(err.to_string(), "Invalid task: Task must not be empty");
    }

    #[test]
    fn boxed_sources_pass_through_macros() {
        let cause: BoxedSource = "printer offline".into();
        let err = export_error!("Failed to print", "test", cause);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("printer offline"));
    }
}
