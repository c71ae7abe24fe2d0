//! Recovery actions run when the provider is declared failed.

use crate::error::Result;
use crate::process::ProcessRunner;
use async_trait::async_trait;
use tracing::info;

/// Action that tries to bring the suggestion provider back.
///
/// The monitor re-probes after the action; the action only needs to report
/// whether it ran.
#[async_trait]
pub trait RecoveryAction: Send + Sync {
    async fn recover(&self) -> Result<()>;
}

/// Terminates every process backing the provider, by name.
///
/// The provider CLI is spawned per request, so killing a wedged instance is
/// enough for the next request to start fresh.
#[derive(Debug, Clone)]
pub struct ProcessKillRecovery {
    names: Vec<String>,
    runner: ProcessRunner,
}

impl ProcessKillRecovery {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            runner: ProcessRunner::new(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[async_trait]
impl RecoveryAction for ProcessKillRecovery {
    async fn recover(&self) -> Result<()> {
        let matched = self.runner.kill_by_name(&self.names).await;
        info!(matched, names = ?self.names, "Terminated provider processes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_unknown_process_is_ok() {
        let recovery = ProcessKillRecovery::new(vec!["redgreen-no-such-process".to_string()]);
        assert_eq!(recovery.names(), ["redgreen-no-such-process"]);
        assert!(recovery.recover().await.is_ok());
    }
}
