//! Custom assertions for domain-specific testing.
//!
//! Provides expressive assertions over normalized test run results and
//! health events.

use crate::health::{HealthEvent, HealthState};
use crate::results::TestRunResult;

/// Assert that a test run succeeded.
///
/// # Panics
///
/// Panics with a descriptive message if the run failed or errored.
///
/// # Example
///
/// ```rust,ignore
/// let result = runner.run_tests(project).await;
/// assert_run_passed(&result);
/// ```
pub fn assert_run_passed(result: &TestRunResult) {
    assert!(
        result.succeeded(),
        "Expected test run to pass, but it failed.\nSummary: {}\nFailures: {:?}",
        result.summary(),
        result.failures
    );
}

/// Assert that a test run did not succeed.
///
/// # Panics
///
/// Panics if the run passed when it should have failed.
pub fn assert_run_failed(result: &TestRunResult) {
    assert!(
        !result.succeeded(),
        "Expected test run to fail, but it passed.\nSummary: {}",
        result.summary()
    );
}

/// Assert the number of recorded failures.
///
/// # Panics
///
/// Panics if the expected failure count doesn't match.
///
/// # Example
///
/// ```rust,ignore
/// let result = parse(output, FrameworkKind::XUnit);
/// assert_failure_count(&result, 2);
/// ```
pub fn assert_failure_count(result: &TestRunResult, expected: usize) {
    assert_eq!(
        result.failures.len(),
        expected,
        "Expected {} failures, but got {}.\nFailures: {:?}",
        expected,
        result.failures.len(),
        result.failures
    );
}

/// Assert that some failure's test name contains `substring`.
///
/// # Panics
///
/// Panics if no failure name contains the expected substring.
pub fn assert_failure_named(result: &TestRunResult, substring: &str) {
    let names: Vec<&str> = result.failures.iter().map(|f| f.name.as_str()).collect();
    assert!(
        names.iter().any(|n| n.contains(substring)),
        "Expected a failure named like '{}', but none found.\nFailures: {:?}",
        substring,
        names
    );
}

/// Assert that the counters add up and match the failure list.
///
/// # Panics
///
/// Panics if `passed + failed + skipped != total` or the failure list
/// length differs from the failed count.
pub fn assert_counts_consistent(result: &TestRunResult) {
    assert!(
        result.is_consistent(),
        "Inconsistent counters: total={} passed={} failed={} skipped={}",
        result.total,
        result.passed,
        result.failed(),
        result.skipped
    );
}

/// Assert the sequence of states announced by status-change events.
///
/// # Panics
///
/// Panics if the announced states differ from `expected`.
///
/// # Example
///
/// ```rust,ignore
/// assert_state_sequence(&events, &[HealthState::Failed, HealthState::Restarting]);
/// ```
pub fn assert_state_sequence(events: &[HealthEvent], expected: &[HealthState]) {
    let states: Vec<HealthState> = events
        .iter()
        .filter_map(|e| match e {
            HealthEvent::StatusChanged(change) => Some(change.state),
            HealthEvent::RestartAttempted { .. } => None,
        })
        .collect();
    assert_eq!(
        states, expected,
        "Unexpected health state sequence.\nEvents: {:?}",
        events
    );
}
