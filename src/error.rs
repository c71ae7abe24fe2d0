//! Custom error types for redgreen.
//!
//! This module provides structured error types for the process layer,
//! the suggestion provider boundary, and configuration loading. Most of
//! these never escape the core: the test backend folds them into
//! [`TestRunResult::error_message`](crate::results::TestRunResult) and the
//! health monitor folds them into a `Failed` state.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for redgreen operations
#[derive(Error, Debug)]
pub enum RedGreenError {
    // =========================================================================
    // Process Errors
    // =========================================================================
    /// External command could not be started
    #[error("Failed to launch '{program}': {message}")]
    LaunchFailure { program: String, message: String },

    /// Process or provider call exceeded its time budget
    #[error("'{operation}' timed out after {}", format_budget(.timeout))]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    // =========================================================================
    // Provider Errors
    // =========================================================================
    /// Suggestion provider failed or returned nothing
    #[error("Suggestion provider unavailable: {detail}")]
    ProviderUnavailable { detail: String },

    // =========================================================================
    // Test Backend Errors
    // =========================================================================
    /// No launcher is known for the detected framework
    #[error("Test framework '{framework}' is not supported")]
    UnsupportedFramework { framework: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value or argument
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RedGreenError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a launch failure error
    pub fn launch(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LaunchFailure {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Create a provider unavailable error
    pub fn provider(detail: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            detail: detail.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if retrying the same operation later could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ProviderUnavailable { .. } | Self::Io(_)
        )
    }

    /// Check if this error came from the process layer
    pub fn is_process_error(&self) -> bool {
        matches!(self, Self::LaunchFailure { .. } | Self::Timeout { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LaunchFailure { .. } => 2,
            Self::Timeout { .. } => 3,
            Self::ProviderUnavailable { .. } => 4,
            Self::UnsupportedFramework { .. } => 5,
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            _ => 1,
        }
    }
}

/// Whole seconds print as `30s`, anything finer as `1500ms`.
fn format_budget(timeout: &Duration) -> String {
    if timeout.subsec_millis() == 0 && timeout.as_secs() > 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

/// Type alias for redgreen results
pub type Result<T> = std::result::Result<T, RedGreenError>;
