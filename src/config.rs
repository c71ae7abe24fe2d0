//! Project configuration loaded from `.redgreen/settings.json`.
//!
//! Every field has a serde default, so a partial file (or none at all)
//! yields a usable configuration:
//!
//! ```json
//! {
//!   "runner":   { "timeout_secs": 120 },
//!   "provider": { "cli_path": "copilot", "timeout_secs": 30 },
//!   "health":   { "interval_secs": 60, "failure_threshold": 3 },
//!   "tdd":      { "max_iterations": 5 }
//! }
//! ```

use crate::error::{RedGreenError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Legal range for the provider request timeout, in seconds.
pub const PROVIDER_TIMEOUT_RANGE: (u64, u64) = (5, 120);

/// Legal range for the provider context budget, in characters.
pub const CONTEXT_CHARS_RANGE: (usize, usize) = (100, 20_000);

/// Upper bound for `tdd.max_iterations`.
pub const MAX_ITERATIONS_LIMIT: u32 = 50;

/// Test execution backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Wall-clock budget for one test run (default: 120).
    #[serde(default = "default_runner_timeout")]
    pub timeout_secs: u64,
}

fn default_runner_timeout() -> u64 {
    120
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_runner_timeout(),
        }
    }
}

impl RunnerConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Suggestion provider CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Explicit provider executable. Auto-detected when absent.
    #[serde(default)]
    pub cli_path: Option<String>,

    /// Per-request timeout (default: 30, clamped to 5..=120).
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Trailing context sent with each completion prompt (default: 1000).
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_max_context_chars() -> usize {
    1000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            cli_path: None,
            timeout_secs: default_provider_timeout(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

impl ProviderConfig {
    /// Request timeout clamped to the legal range.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        let (min, max) = PROVIDER_TIMEOUT_RANGE;
        Duration::from_secs(self.timeout_secs.clamp(min, max))
    }
}

/// Health monitor settings, all durations in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSettings {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Consecutive failed probes before the state becomes `Failed`.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_restart_cooldown")]
    pub restart_cooldown_secs: u64,

    /// Wait between the recovery action and the verification probe.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    /// Process names terminated by the default recovery action.
    #[serde(default = "default_process_names")]
    pub process_names: Vec<String>,

    #[serde(default = "default_true")]
    pub auto_restart: bool,
}

fn default_interval() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_restart_cooldown() -> u64 {
    300
}

fn default_settle_delay() -> u64 {
    2
}

fn default_process_names() -> Vec<String> {
    ["github-copilot-cli", "copilot", "gh"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            probe_timeout_secs: default_probe_timeout(),
            failure_threshold: default_failure_threshold(),
            restart_cooldown_secs: default_restart_cooldown(),
            settle_delay_secs: default_settle_delay(),
            process_names: default_process_names(),
            auto_restart: true,
        }
    }
}

/// TDD loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TddSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    5
}

impl Default for TddSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

/// Project configuration loaded from `.redgreen/settings.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub health: HealthSettings,

    #[serde(default)]
    pub tdd: TddSettings,
}

impl ProjectConfig {
    /// Load configuration from a project directory.
    ///
    /// A missing settings file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RedGreenError::Config`] when the file exists but cannot be
    /// read or is not valid JSON.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let settings_path = Self::settings_path(project_dir);

        if !settings_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&settings_path).map_err(|e| {
            RedGreenError::config_with_path(format!("cannot read settings: {e}"), settings_path.clone())
        })?;
        let config: ProjectConfig = serde_json::from_str(&content).map_err(|e| {
            RedGreenError::config_with_path(format!("invalid settings JSON: {e}"), settings_path.clone())
        })?;

        tracing::debug!(path = %settings_path.display(), "Loaded project settings");
        Ok(config)
    }

    /// Get the settings.json path for a project
    pub fn settings_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".redgreen/settings.json")
    }

    /// Per-user settings directory (informational; not merged).
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("redgreen"))
    }

    /// Override the provider executable (CLI flag or `REDGREEN_PROVIDER`).
    #[must_use]
    pub fn with_provider_path(mut self, cli_path: Option<String>) -> Self {
        if let Some(path) = cli_path.filter(|p| !p.trim().is_empty()) {
            self.provider.cli_path = Some(path);
        }
        self
    }

    /// List every out-of-range value. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.runner.timeout_secs == 0 {
            problems.push("runner.timeout_secs must be greater than 0".to_string());
        }

        let (min, max) = PROVIDER_TIMEOUT_RANGE;
        if !(min..=max).contains(&self.provider.timeout_secs) {
            problems.push(format!(
                "provider.timeout_secs must be between {min} and {max} (got {})",
                self.provider.timeout_secs
            ));
        }

        let (min, max) = CONTEXT_CHARS_RANGE;
        if !(min..=max).contains(&self.provider.max_context_chars) {
            problems.push(format!(
                "provider.max_context_chars must be between {min} and {max} (got {})",
                self.provider.max_context_chars
            ));
        }

        if let Some(ref path) = self.provider.cli_path {
            if path.trim().is_empty() {
                problems.push("provider.cli_path must not be empty".to_string());
            }
        }

        let health = &self.health;
        if health.interval_secs == 0 {
            problems.push("health.interval_secs must be greater than 0".to_string());
        }
        if health.probe_timeout_secs == 0 {
            problems.push("health.probe_timeout_secs must be greater than 0".to_string());
        }
        if health.failure_threshold == 0 {
            problems.push("health.failure_threshold must be at least 1".to_string());
        }
        if health.auto_restart && health.process_names.is_empty() {
            problems.push(
                "health.process_names must not be empty when auto_restart is enabled".to_string(),
            );
        }

        if self.tdd.max_iterations == 0 || self.tdd.max_iterations > MAX_ITERATIONS_LIMIT {
            problems.push(format!(
                "tdd.max_iterations must be between 1 and {MAX_ITERATIONS_LIMIT} (got {})",
                self.tdd.max_iterations
            ));
        }

        problems
    }

    /// Clamp every numeric value into its legal range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let (min, max) = PROVIDER_TIMEOUT_RANGE;
        self.provider.timeout_secs = self.provider.timeout_secs.clamp(min, max);
        let (min, max) = CONTEXT_CHARS_RANGE;
        self.provider.max_context_chars = self.provider.max_context_chars.clamp(min, max);

        self.runner.timeout_secs = self.runner.timeout_secs.max(1);
        self.health.interval_secs = self.health.interval_secs.max(1);
        self.health.probe_timeout_secs = self.health.probe_timeout_secs.max(1);
        self.health.failure_threshold = self.health.failure_threshold.max(1);
        self.tdd.max_iterations = self.tdd.max_iterations.clamp(1, MAX_ITERATIONS_LIMIT);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_settings(dir: &Path, json: &str) {
        let path = ProjectConfig::settings_path(dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    #[test]
    fn test_project_config_default() {
        let config = ProjectConfig::default();
        assert_eq!(config.runner.timeout_secs, 120);
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.provider.max_context_chars, 1000);
        assert_eq!(config.health.interval_secs, 60);
        assert_eq!(config.health.probe_timeout_secs, 10);
        assert_eq!(config.health.failure_threshold, 3);
        assert_eq!(config.health.restart_cooldown_secs, 300);
        assert_eq!(config.health.settle_delay_secs, 2);
        assert_eq!(
            config.health.process_names,
            vec!["github-copilot-cli", "copilot", "gh"]
        );
        assert!(config.health.auto_restart);
        assert_eq!(config.tdd.max_iterations, 5);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_project_config_load_missing() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_project_config_load_partial() {
        let temp = TempDir::new().unwrap();
        write_settings(
            temp.path(),
            r#"{ "provider": { "cli_path": "/opt/copilot" }, "tdd": { "max_iterations": 8 } }"#,
        );

        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config.provider.cli_path.as_deref(), Some("/opt/copilot"));
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.tdd.max_iterations, 8);
        assert_eq!(config.runner.timeout_secs, 120);
    }

    #[test]
    fn test_project_config_load_invalid_json() {
        let temp = TempDir::new().unwrap();
        write_settings(temp.path(), "{ not json");

        let err = ProjectConfig::load(temp.path()).unwrap_err();
        match err {
            RedGreenError::Config { path, .. } => {
                assert_eq!(path, Some(ProjectConfig::settings_path(temp.path())));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let mut config = ProjectConfig::default();
        config.provider.timeout_secs = 1;
        config.health.failure_threshold = 0;
        config.tdd.max_iterations = 0;

        let problems = config.validate();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("provider.timeout_secs"));
        assert!(problems.iter().any(|p| p.contains("failure_threshold")));
        assert!(problems.iter().any(|p| p.contains("max_iterations")));
    }

    #[test]
    fn test_normalized_clamps_values() {
        let mut config = ProjectConfig::default();
        config.provider.timeout_secs = 600;
        config.provider.max_context_chars = 5;
        config.runner.timeout_secs = 0;
        config.tdd.max_iterations = 500;

        let config = config.normalized();
        assert_eq!(config.provider.timeout_secs, 120);
        assert_eq!(config.provider.max_context_chars, 100);
        assert_eq!(config.runner.timeout_secs, 1);
        assert_eq!(config.tdd.max_iterations, MAX_ITERATIONS_LIMIT);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_provider_timeout_is_clamped() {
        let provider = ProviderConfig {
            timeout_secs: 2,
            ..ProviderConfig::default()
        };
        assert_eq!(provider.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_with_provider_path_ignores_blank() {
        let config = ProjectConfig::default().with_provider_path(Some("  ".to_string()));
        assert!(config.provider.cli_path.is_none());

        let config = config.with_provider_path(Some("gh".to_string()));
        assert_eq!(config.provider.cli_path.as_deref(), Some("gh"));
    }
}
