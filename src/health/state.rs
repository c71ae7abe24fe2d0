//! Health states, notifications and monitor settings.

use crate::config::HealthSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Health of the suggestion provider as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Healthy,
    /// Failing, below the failure threshold.
    Degraded,
    /// At or above the failure threshold, or a recovery attempt failed.
    Failed,
    /// Recovery action in progress.
    Restarting,
}

impl HealthState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
            Self::Restarting => "restarting",
        }
    }

    /// Human-readable status line for a state and failure streak.
    #[must_use]
    pub fn message(&self, consecutive_failures: u32) -> String {
        match self {
            Self::Healthy => "Suggestion provider is running normally".to_string(),
            Self::Degraded => format!(
                "Suggestion provider experiencing issues ({consecutive_failures} failures)"
            ),
            Self::Failed => format!(
                "Suggestion provider has failed ({consecutive_failures} consecutive failures)"
            ),
            Self::Restarting => "Attempting to restart suggestion provider...".to_string(),
            Self::Unknown => "Suggestion provider status unknown".to_string(),
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a state transition notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatusChange {
    pub previous: HealthState,
    pub state: HealthState,
    pub consecutive_failures: u32,
    pub last_successful_check: Option<DateTime<Utc>>,
    pub message: String,
}

/// Restart outcome texts carried by [`HealthEvent::RestartAttempted`].
pub mod restart_outcome {
    pub const ATTEMPTING: &str = "Attempting automatic restart";
    pub const SUCCEEDED: &str = "Restart successful";
    pub const FAILED: &str = "Restart failed - manual intervention required";
}

/// Notification broadcast to monitor subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HealthEvent {
    StatusChanged(HealthStatusChange),
    RestartAttempted { outcome: String },
}

/// Point-in-time view of the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub state: HealthState,
    pub consecutive_failures: u32,
    pub last_successful_check: Option<DateTime<Utc>>,
    pub last_restart_attempt: Option<DateTime<Utc>>,
    pub monitoring: bool,
}

/// Monitor timing and recovery policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub failure_threshold: u32,
    pub restart_cooldown: Duration,
    pub settle_delay: Duration,
    pub auto_restart: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self::from(&HealthSettings::default())
    }
}

impl From<&HealthSettings> for HealthConfig {
    fn from(settings: &HealthSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.interval_secs.max(1)),
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs.max(1)),
            failure_threshold: settings.failure_threshold.max(1),
            restart_cooldown: Duration::from_secs(settings.restart_cooldown_secs),
            settle_delay: Duration::from_secs(settings.settle_delay_secs),
            auto_restart: settings.auto_restart,
        }
    }
}
