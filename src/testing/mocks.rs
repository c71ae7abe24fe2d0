//! Mock implementations of the collaborator traits.
//!
//! These mocks provide controllable test doubles for the suggestion
//! provider, the test backend and the health recovery action, enabling
//! deterministic unit tests of the orchestrator and the monitor.

use crate::error::{RedGreenError, Result};
use crate::health::RecoveryAction;
use crate::provider::SuggestionProvider;
use crate::results::{FrameworkKind, TestFailure, TestRunResult};
use crate::runner::{TestRunner, TestSelection};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Passing run with `total` tests.
#[must_use]
pub fn passing_run(total: u32) -> TestRunResult {
    TestRunResult {
        framework: FrameworkKind::XUnit,
        total,
        passed: total,
        ..Default::default()
    }
}

/// Run with `total` tests where each `(name, message)` failed.
#[must_use]
pub fn failing_run(total: u32, failures: &[(&str, &str)]) -> TestRunResult {
    let failures: Vec<TestFailure> = failures
        .iter()
        .map(|(name, message)| TestFailure::new(*name, *message))
        .collect();
    TestRunResult {
        framework: FrameworkKind::XUnit,
        total,
        passed: total.saturating_sub(failures.len() as u32),
        failures,
        ..Default::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Mock Suggestion Provider
// ============================================================================

/// Mock suggestion provider with scripted answers.
///
/// Answer resolution for `get_suggestion`, first match wins:
/// 1. a rule whose pattern is contained in the requested fragment
/// 2. the next queued response
/// 3. the default response
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockSuggestionProvider::new()
///     .with_rule("Generate comprehensive unit tests", "[Fact] public void Adds() {}")
///     .with_connection(true);
/// ```
#[derive(Debug, Default)]
pub struct MockSuggestionProvider {
    rules: Vec<(String, String)>,
    responses: Mutex<VecDeque<Option<String>>>,
    default_response: Option<String>,
    connections: Mutex<VecDeque<bool>>,
    default_connected: AtomicBool,
    delay: Option<Duration>,
    fragments: Mutex<Vec<String>>,
    call_count: AtomicU32,
    connection_count: AtomicU32,
}

impl MockSuggestionProvider {
    /// Create a mock that is disconnected and answers nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `response` whenever the fragment contains `pattern`.
    #[must_use]
    pub fn with_rule(mut self, pattern: &str, response: &str) -> Self {
        self.rules.push((pattern.to_string(), response.to_string()));
        self
    }

    /// Queue answers consumed one per call before the default applies.
    #[must_use]
    pub fn with_responses(self, responses: Vec<Option<&str>>) -> Self {
        *lock(&self.responses) = responses
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        self
    }

    /// Answer used once rules and queue are exhausted.
    #[must_use]
    pub fn with_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Result of `test_connection` once the sequence is exhausted.
    #[must_use]
    pub fn with_connection(mut self, connected: bool) -> Self {
        self.default_connected = AtomicBool::new(connected);
        self
    }

    /// Queue `test_connection` results consumed one per call.
    #[must_use]
    pub fn with_connection_sequence(self, sequence: Vec<bool>) -> Self {
        *lock(&self.connections) = sequence.into();
        self
    }

    /// Sleep before answering either call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `get_suggestion` calls.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of `test_connection` calls.
    pub fn connection_count(&self) -> u32 {
        self.connection_count.load(Ordering::SeqCst)
    }

    /// Every fragment received by `get_suggestion`, in order.
    pub fn fragments(&self) -> Vec<String> {
        lock(&self.fragments).clone()
    }

    /// Drop any queued connection results and answer `connected` from now on.
    pub fn set_connected(&self, connected: bool) {
        lock(&self.connections).clear();
        self.default_connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl SuggestionProvider for MockSuggestionProvider {
    async fn get_suggestion(
        &self,
        _context: &str,
        current_fragment: &str,
        _file_hint: &str,
    ) -> Option<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.fragments).push(current_fragment.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((_, response)) = self
            .rules
            .iter()
            .find(|(pattern, _)| current_fragment.contains(pattern.as_str()))
        {
            return Some(response.clone());
        }

        if let Some(queued) = lock(&self.responses).pop_front() {
            return queued;
        }

        self.default_response.clone()
    }

    async fn test_connection(&self) -> bool {
        self.connection_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.connections)
            .pop_front()
            .unwrap_or_else(|| self.default_connected.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "mock-provider"
    }
}

// ============================================================================
// Mock Test Runner
// ============================================================================

/// Mock test backend returning scripted results.
///
/// Queued results are returned in order; the default (a passing run with
/// one test) applies afterwards.
#[derive(Debug)]
pub struct MockTestRunner {
    results: Mutex<VecDeque<TestRunResult>>,
    default_result: TestRunResult,
    selections: Mutex<Vec<TestSelection>>,
    call_count: AtomicU32,
}

impl Default for MockTestRunner {
    fn default() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            default_result: passing_run(1),
            selections: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }
}

impl MockTestRunner {
    /// Create a runner that always passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue results consumed one per run.
    #[must_use]
    pub fn with_results(self, results: Vec<TestRunResult>) -> Self {
        *lock(&self.results) = results.into();
        self
    }

    /// Result returned once the queue is exhausted.
    #[must_use]
    pub fn with_default(mut self, result: TestRunResult) -> Self {
        self.default_result = result;
        self
    }

    /// Number of runs.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Selection of every run, in order.
    pub fn selections(&self) -> Vec<TestSelection> {
        lock(&self.selections).clone()
    }
}

#[async_trait]
impl TestRunner for MockTestRunner {
    async fn run(&self, project: &Path, selection: &TestSelection) -> TestRunResult {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.selections).push(selection.clone());

        let mut result = lock(&self.results)
            .pop_front()
            .unwrap_or_else(|| self.default_result.clone());
        result.project_path = Some(project.to_path_buf());
        result
    }
}

// ============================================================================
// Mock Recovery Action
// ============================================================================

/// Mock recovery action counting invocations.
///
/// Optionally flips a shared [`MockSuggestionProvider`]'s connection so the
/// verification probe after recovery succeeds.
#[derive(Debug, Default)]
pub struct MockRecoveryAction {
    error: Option<String>,
    heals: Option<std::sync::Arc<MockSuggestionProvider>>,
    call_count: AtomicU32,
}

impl MockRecoveryAction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the action to fail.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Reconnect `provider` when the action runs.
    #[must_use]
    pub fn healing(mut self, provider: std::sync::Arc<MockSuggestionProvider>) -> Self {
        self.heals = Some(provider);
        self
    }

    /// Number of recovery attempts.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecoveryAction for MockRecoveryAction {
    async fn recover(&self) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(ref error) = self.error {
            return Err(RedGreenError::provider(error.clone()));
        }
        if let Some(ref provider) = self.heals {
            provider.set_connected(true);
        }
        Ok(())
    }
}
