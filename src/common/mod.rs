//! Common Infrastructure Module
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - The domain error taxonomy and bridge revert-code table

pub mod config;
pub mod error;
pub mod logging;
pub mod revert;

// Re-exports for convenience
pub use config::{ConfigError, FlyoverConfig, Network, VerifierSettings};
pub use error::{FlyoverError, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_decision_event,
    log_security_event, EventCategory, LogEvent, LogLevel, LoggingError,
};
pub use revert::{describe_revert, explain_revert, extract_revert_code};
