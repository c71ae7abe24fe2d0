//! Testing infrastructure for redgreen.
//!
//! This module provides mocks, fixtures, and assertions for testing the
//! TDD loop and the health monitor without a real suggestion provider or
//! test toolchain.
//!
//! # Architecture
//!
//! The testing infrastructure is organized into:
//! - **Mocks**: Test doubles for the provider, test backend and recovery traits
//! - **Fixtures**: Temporary projects and captured runner output (test-only)
//! - **Assertions**: Custom assertions for test run results and health events
//!
//! # Example
//!
//! ```rust,ignore
//! use redgreen::testing::{failing_run, MockSuggestionProvider, MockTestRunner};
//!
//! let provider = MockSuggestionProvider::new().with_rule("Analyze this", "x = 2");
//! let runner = MockTestRunner::new().with_results(vec![failing_run(1, &[("T.A", "boom")])]);
//! ```

pub mod assertions;
#[cfg(test)]
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use assertions::*;
#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{parse, FrameworkKind};
    use crate::runner::{detect_project_framework, TestRunner, TestSelection};
    use crate::SuggestionProvider;
    use std::path::Path;
    use std::sync::Arc;

    // =========================================================================
    // Mock Suggestion Provider Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_provider_default_answers_nothing() {
        let provider = MockSuggestionProvider::default();
        assert!(provider.get_suggestion("", "anything", "a.cs").await.is_none());
        assert!(!provider.test_connection().await);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_rule_beats_queue() {
        let provider = MockSuggestionProvider::new()
            .with_rule("fix", "rule answer")
            .with_responses(vec![Some("queued")])
            .with_response("fallback");

        assert_eq!(
            provider.get_suggestion("", "please fix", "a.cs").await.as_deref(),
            Some("rule answer")
        );
        assert_eq!(
            provider.get_suggestion("", "other", "a.cs").await.as_deref(),
            Some("queued")
        );
        assert_eq!(
            provider.get_suggestion("", "other", "a.cs").await.as_deref(),
            Some("fallback")
        );
        assert_eq!(provider.fragments(), vec!["please fix", "other", "other"]);
    }

    #[tokio::test]
    async fn test_mock_provider_connection_sequence() {
        let provider = MockSuggestionProvider::new()
            .with_connection(true)
            .with_connection_sequence(vec![false, false]);

        assert!(!provider.test_connection().await);
        assert!(!provider.test_connection().await);
        assert!(provider.test_connection().await);

        provider.set_connected(false);
        assert!(!provider.test_connection().await);
    }

    // =========================================================================
    // Mock Test Runner Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_runner_queue_then_default() {
        let runner = MockTestRunner::new()
            .with_results(vec![failing_run(2, &[("T.A", "boom")])])
            .with_default(passing_run(2));

        let first = runner.run_test_class(Path::new("proj"), "T").await;
        assert_run_failed(&first);
        assert_eq!(first.project_path.as_deref(), Some(Path::new("proj")));

        let second = runner.run_tests(Path::new("proj")).await;
        assert_run_passed(&second);

        assert_eq!(runner.call_count(), 2);
        assert_eq!(
            runner.selections(),
            vec![TestSelection::Class("T".to_string()), TestSelection::All]
        );
    }

    // =========================================================================
    // Mock Recovery Action Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_recovery_heals_provider() {
        use crate::health::RecoveryAction;

        let provider = Arc::new(MockSuggestionProvider::new());
        let recovery = MockRecoveryAction::new().healing(provider.clone());

        assert!(!provider.test_connection().await);
        recovery.recover().await.unwrap();
        assert!(provider.test_connection().await);
        assert_eq!(recovery.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_recovery_with_error() {
        use crate::health::RecoveryAction;

        let recovery = MockRecoveryAction::new().with_error("kill failed");
        let err = recovery.recover().await.unwrap_err();
        assert!(err.to_string().contains("kill failed"));
    }

    // =========================================================================
    // Test Fixture Tests (only available in test builds)
    // =========================================================================

    #[test]
    fn test_fixture_projects_are_detected() {
        let xunit = TestFixture::dotnet_project(true);
        assert_eq!(detect_project_framework(&xunit.project_file()), FrameworkKind::XUnit);
        assert_eq!(detect_project_framework(xunit.path()), FrameworkKind::XUnit);

        let nunit = TestFixture::dotnet_project(false);
        assert_eq!(detect_project_framework(nunit.path()), FrameworkKind::NUnit);

        let jest = TestFixture::jest_project();
        assert_eq!(detect_project_framework(jest.path()), FrameworkKind::Jest);

        let pytest = TestFixture::pytest_project();
        assert_eq!(detect_project_framework(pytest.path()), FrameworkKind::Pytest);

        let empty = TestFixture::empty();
        assert_eq!(detect_project_framework(empty.path()), FrameworkKind::Unknown);
    }

    #[test]
    fn test_captured_outputs_parse() {
        let xunit = parse(XUNIT_FAILING_OUTPUT, FrameworkKind::XUnit);
        assert_eq!(xunit.total, 3);
        assert_failure_count(&xunit, 1);
        assert_failure_named(&xunit, "Add");
        assert_counts_consistent(&xunit);

        let pytest = parse(PYTEST_FAILING_OUTPUT, FrameworkKind::Pytest);
        assert_eq!(pytest.total, 3);
        assert_failure_named(&pytest, "TestCalc.test_add");
        assert_counts_consistent(&pytest);
    }
}
