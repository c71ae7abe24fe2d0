//! Suggestion provider backed by a command-line tool.

use super::{build_completion_prompt, parse_suggestion, SuggestionProvider};
use crate::config::ProviderConfig;
use crate::error::{RedGreenError, Result};
use crate::process::{CommandSpec, ProcessRunner};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Executable plus fixed leading arguments; the prompt is appended last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProviderCommand {
    /// Split a configured command line such as `gh copilot suggest`.
    ///
    /// Returns `None` for a blank command line.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Locate a provider executable.
    ///
    /// Checks the per-user install locations, then `copilot` on `PATH`, and
    /// falls back to `gh copilot suggest`.
    #[must_use]
    pub fn discover() -> Self {
        let exe = if cfg!(windows) { "copilot.exe" } else { "copilot" };

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".copilot").join(exe));
        }
        if let Some(local) = dirs::data_local_dir() {
            candidates.push(local.join("GitHub Copilot CLI").join(exe));
        }

        if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
            debug!(path = %found.display(), "Found provider CLI");
            return Self {
                program: found.display().to_string(),
                args: Vec::new(),
            };
        }

        if let Ok(found) = which::which("copilot") {
            debug!(path = %found.display(), "Found provider CLI on PATH");
            return Self {
                program: found.display().to_string(),
                args: Vec::new(),
            };
        }

        debug!("No provider CLI found, falling back to gh copilot suggest");
        Self {
            program: "gh".to_string(),
            args: vec!["copilot".to_string(), "suggest".to_string()],
        }
    }

    fn with_prompt(&self, prompt: &str) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(&self.args)
            .arg(prompt)
    }
}

impl std::fmt::Display for ProviderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Drives a suggestion CLI as a subprocess, one process per request.
///
/// # Example
///
/// ```rust,ignore
/// use redgreen::provider::{CliSuggestionProvider, ProviderCommand};
/// use std::time::Duration;
///
/// let provider = CliSuggestionProvider::new(ProviderCommand::discover())
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct CliSuggestionProvider {
    command: ProviderCommand,
    timeout: Duration,
    max_context_chars: usize,
    runner: ProcessRunner,
}

impl CliSuggestionProvider {
    /// Create a provider for `command` with the default 30 second timeout.
    #[must_use]
    pub fn new(command: ProviderCommand) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            command,
            timeout: defaults.timeout(),
            max_context_chars: defaults.max_context_chars,
            runner: ProcessRunner::new(),
        }
    }

    /// Auto-discover the executable and use default settings.
    #[must_use]
    pub fn discover() -> Self {
        Self::new(ProviderCommand::discover())
    }

    /// Build from configuration; `cli_path` wins over discovery.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        let command = config
            .cli_path
            .as_deref()
            .and_then(ProviderCommand::parse)
            .unwrap_or_else(ProviderCommand::discover);

        Self::new(command)
            .with_timeout(config.timeout())
            .with_max_context_chars(config.max_context_chars)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_context_chars(mut self, max_chars: usize) -> Self {
        self.max_context_chars = max_chars;
        self
    }

    /// The command this provider runs.
    #[must_use]
    pub fn command(&self) -> &ProviderCommand {
        &self.command
    }

    /// Run the CLI with `prompt` and return its stdout.
    ///
    /// # Errors
    ///
    /// Launch failures and timeouts from the process layer, and
    /// [`RedGreenError::ProviderUnavailable`] when the CLI exits non-zero
    /// with something on stderr.
    pub async fn execute(&self, prompt: &str) -> Result<String> {
        let spec = self.command.with_prompt(prompt);
        let outcome = self.runner.run(&spec, self.timeout).await?;

        if !outcome.success() && !outcome.stderr.trim().is_empty() {
            return Err(RedGreenError::provider(format!(
                "{} exited with {}: {}",
                self.command.program,
                outcome.exit_code,
                outcome.stderr.trim()
            )));
        }

        Ok(outcome.stdout)
    }
}

#[async_trait]
impl SuggestionProvider for CliSuggestionProvider {
    async fn get_suggestion(
        &self,
        context: &str,
        current_fragment: &str,
        file_hint: &str,
    ) -> Option<String> {
        let prompt =
            build_completion_prompt(context, current_fragment, file_hint, self.max_context_chars);
        debug!(file = file_hint, prompt_chars = prompt.len(), "Requesting suggestion");

        match self.execute(&prompt).await {
            Ok(output) => parse_suggestion(&output),
            Err(e) => {
                warn!(
                    provider = %self.command,
                    error = %e,
                    recoverable = e.is_recoverable(),
                    "Suggestion request failed"
                );
                None
            }
        }
    }

    async fn test_connection(&self) -> bool {
        match self.execute("test").await {
            Ok(output) => !output.is_empty(),
            Err(e) => {
                debug!(provider = %self.command, error = %e, "Connection test failed");
                false
            }
        }
    }

    fn name(&self) -> &str {
        &self.command.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_command_parse() {
        let cmd = ProviderCommand::parse("gh copilot suggest").unwrap();
        assert_eq!(cmd.program, "gh");
        assert_eq!(cmd.args, vec!["copilot", "suggest"]);
        assert_eq!(cmd.to_string(), "gh copilot suggest");

        assert!(ProviderCommand::parse("   ").is_none());
    }

    #[test]
    fn test_prompt_is_last_argument() {
        let cmd = ProviderCommand::parse("gh copilot suggest").unwrap();
        let spec = cmd.with_prompt("complete \"this\"");
        assert_eq!(spec.program, "gh");
        assert_eq!(spec.args, vec!["copilot", "suggest", "complete \"this\""]);
    }

    #[test]
    fn test_from_config_uses_cli_path() {
        let config = ProviderConfig {
            cli_path: Some("/opt/bin/copilot --quiet".to_string()),
            timeout_secs: 500,
            max_context_chars: 300,
        };
        let provider = CliSuggestionProvider::from_config(&config);
        assert_eq!(provider.command().program, "/opt/bin/copilot");
        assert_eq!(provider.command().args, vec!["--quiet"]);
        assert_eq!(provider.timeout, Duration::from_secs(120));
        assert_eq!(provider.max_context_chars, 300);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_echo_provider_returns_suggestion() {
        // `echo` prints the prompt back.
        let provider = CliSuggestionProvider::new(ProviderCommand::parse("echo").unwrap());
        let suggestion = provider.get_suggestion("", "x = 1", "calc.py").await;
        let text = suggestion.unwrap();
        assert!(text.starts_with("Complete the following Python code:"));
        assert!(provider.test_connection().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_provider_is_unavailable() {
        let provider = CliSuggestionProvider::new(
            ProviderCommand::parse("/nonexistent/redgreen-provider").unwrap(),
        );
        assert!(provider.get_suggestion("", "x", "a.rs").await.is_none());
        assert!(!provider.test_connection().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_provider_with_stderr_is_error() {
        let provider = CliSuggestionProvider::new(ProviderCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo boom >&2; exit 1".to_string()],
        });
        let err = provider.execute("ignored").await.unwrap_err();
        assert!(matches!(err, RedGreenError::ProviderUnavailable { .. }));
        assert!(!provider.test_connection().await);
    }
}
