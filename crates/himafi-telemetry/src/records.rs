//! Log and error record types shared by the batcher and its transports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Optional context and tags attached to an info/warn line.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub context: Option<Map<String, Value>>,
    pub tags: Option<Vec<String>>,
}

impl LogOptions {
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// A single structured log line. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, options: LogOptions) -> Self {
        Self {
            level,
            message: message.into(),
            context: options.context,
            tags: options.tags,
            timestamp: Utc::now(),
        }
    }
}

/// The error payload itself: a message plus whatever backtrace-like detail
/// was available at the reporting site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Capture a standard error together with its source chain.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let mut stack = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            stack: if stack.is_empty() {
                None
            } else {
                Some(stack.join("\n"))
            },
        }
    }
}

impl From<&str> for ErrorDetail {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ErrorDetail {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<anyhow::Error> for ErrorDetail {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            // The alternate Debug rendering carries the full cause chain.
            stack: Some(format!("{err:?}")),
        }
    }
}

/// Where an error happened, as far as the reporting site knows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ErrorContext {
    pub fn for_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One queued entry awaiting a batched flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
        assert_eq!(
            serde_json::from_str::<LogLevel>("\"error\"").unwrap(),
            LogLevel::Error
        );
    }

    #[test]
    fn log_record_wire_shape() {
        let record = LogRecord::new(
            LogLevel::Info,
            "hello",
            LogOptions::default().with_tags(["performance"]),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["tags"][0], "performance");
        // No context was given, so the key must be absent entirely.
        assert!(value.get("context").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn error_detail_from_str_has_no_stack() {
        let detail = ErrorDetail::from("boom");
        assert_eq!(detail.message, "boom");
        assert!(detail.stack.is_none());
    }

    #[test]
    fn error_detail_from_anyhow_keeps_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let detail = ErrorDetail::from(err);
        assert_eq!(detail.message, "outer");
        let stack = detail.stack.expect("chain rendered");
        assert!(stack.contains("inner"));
    }

    #[test]
    fn error_context_uses_camel_case_keys() {
        let context = ErrorContext::for_action("sign_in").with_user_id("u-1");
        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(value["userId"], "u-1");
        assert_eq!(value["action"], "sign_in");
        assert!(value.get("path").is_none());
    }

    #[test]
    fn error_record_skips_missing_context() {
        let record = ErrorRecord {
            error: ErrorDetail::new("x"),
            context: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("context").is_none());
        assert_eq!(value["error"]["message"], "x");
    }
}
