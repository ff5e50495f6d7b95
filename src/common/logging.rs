//! Structured Logging
//!
//! JSON or pretty `tracing` output, plus structured events for the
//! security signals the verification core raises.
//!
//! # Usage
//!
//! ```rust,ignore
//! use flyover_verifier::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, true)?;
//! tracing::info!(target: "flyover::refund", quote_hash = %hash, "checking refund");
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::error::FlyoverError;

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Quote fetch and validation
    Quote,
    /// Payment proof checks
    Payment,
    /// Refund eligibility decisions
    Refund,
    /// Counterparty misbehaviour
    Security,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub level: String,
    pub category: EventCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
}

impl LogEvent {
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: format!("{:?}", level).to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a domain error with its code and recoverability
    pub fn with_error(mut self, error: &FlyoverError) -> Self {
        self.error = Some(ErrorDetails {
            code: error.error_code().to_string(),
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Security Event Logging
// ============================================================================

/// Log a counterparty misbehaviour signal.
///
/// Emitted for every security violation before it is returned, so that a
/// malicious provider is visible in logs even if the caller swallows it.
pub fn log_security_event(error: &FlyoverError, correlation_id: &str) {
    let event = security_event(error, correlation_id);
    tracing::warn!(target: "flyover::security", "{}", event.to_json());
}

fn security_event(error: &FlyoverError, correlation_id: &str) -> LogEvent {
    LogEvent::new(LogLevel::Warn, EventCategory::Security, "counterparty rejected")
        .with_correlation_id(correlation_id)
        .with_error(error)
}

/// Log the outcome of a refund or payment decision
pub fn log_decision_event(
    category: EventCategory,
    quote_hash: &str,
    positive: bool,
    error: Option<&FlyoverError>,
) {
    let mut event = LogEvent::new(LogLevel::Info, category, "decision")
        .with_correlation_id(quote_hash)
        .with_data(serde_json::json!({
            "quote_hash": quote_hash,
            "positive": positive,
        }));

    if let Some(err) = error {
        event = event.with_error(err);
    }

    tracing::info!(target: "flyover::decision", "{}", event.to_json());
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Minimum log level to output
/// * `json_format` - Use JSON format (recommended for production)
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let level_name = format!("{:?}", level).to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "flyover={},flyover_verifier={},reqwest={}",
            level_name, level_name, level_name
        ))
    });

    if json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from FlyoverConfig
pub fn init_from_config(config: &super::config::FlyoverConfig) -> Result<(), LoggingError> {
    let level = LogLevel::from(config.log_level.as_str());
    let json_format = config.network == super::config::Network::Mainnet;

    init_logging(level, json_format)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let err = FlyoverError::AlreadyPaid;
        let event = LogEvent::new(LogLevel::Info, EventCategory::Refund, "decision")
            .with_correlation_id("quote-123")
            .with_data(serde_json::json!({"key": "value"}))
            .with_error(&err);

        let json = event.to_json();
        assert!(json.contains("\"category\":\"refund\""));
        assert!(json.contains("quote-123"));
        assert!(json.contains("ALREADY_PAID"));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::from("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_security_event_carries_correlation_id() {
        let id = generate_correlation_id();
        let err = FlyoverError::InvalidSignature {
            server_url: "https://lps.example".to_string(),
        };
        let event = security_event(&err, &id);

        assert_eq!(event.correlation_id.as_deref(), Some(id.as_str()));
        let json = event.to_json();
        assert!(json.contains("\"category\":\"security\""));
        assert!(json.contains("INVALID_SIGNATURE"));
        assert!(json.contains(&id));
    }

    #[test]
    fn test_correlation_ids_differ() {
        let id1 = generate_correlation_id();
        let id2 = generate_correlation_id();
        assert_eq!(id1.len(), 32);
        assert_ne!(id1, id2);
    }
}
