//! Canonical test-run model and the multi-format result normalizer.
//!
//! Test runners print wildly different summaries. This module turns the raw
//! combined output of one run into a [`TestRunResult`], picking one parsing
//! strategy per [`FrameworkKind`]:
//!
//! | Kind     | Summary shape                                             |
//! |----------|-----------------------------------------------------------|
//! | XUnit    | `total: 10; failed: 2; succeeded: 8; skipped: 0`          |
//! | NUnit    | `Passed: 8` / `Failed: 2` / `Skipped: 0`                  |
//! | MSTest   | `Total tests: 10` / `Passed: 8` / `Failed: 2`             |
//! | Jest     | `Tests: 2 failed, 8 passed, 10 total`                     |
//! | Pytest   | `=== 2 failed, 8 passed in 0.12s ===`                     |
//!
//! When no summary can be matched every counter stays at zero and the
//! failure list stays empty. Callers must not read such a result as a green
//! run without checking [`TestRunResult::total`].
//!
//! # Example
//!
//! ```rust
//! use redgreen::results::{parse, FrameworkKind};
//!
//! let raw = "Test summary: total: 10; failed: 2; succeeded: 8; skipped: 0";
//! let result = parse(raw, FrameworkKind::XUnit);
//! assert_eq!(result.total, 10);
//! assert_eq!(result.passed, 8);
//! assert_eq!(result.failures.len(), 2);
//! assert!(!result.succeeded());
//! ```

pub mod jest;
pub mod mstest;
pub mod nunit;
pub mod parser;
pub mod pytest;
pub mod xunit;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Framework Kind
// ============================================================================

/// Tag identifying which test-report text shape to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkKind {
    /// Not detected; parsing yields an empty result.
    #[default]
    Unknown,
    /// xUnit.net via `dotnet test`
    XUnit,
    /// NUnit via `dotnet test`
    NUnit,
    /// MSTest via `dotnet test`
    MsTest,
    /// Jest via `npm test`
    Jest,
    /// pytest
    Pytest,
}

impl FrameworkKind {
    /// All kinds, in detection priority order, `Unknown` last.
    #[must_use]
    pub fn all() -> &'static [FrameworkKind] {
        &[
            Self::XUnit,
            Self::NUnit,
            Self::MsTest,
            Self::Jest,
            Self::Pytest,
            Self::Unknown,
        ]
    }

    /// Lowercase identifier, also the substring searched for by [`detect`](Self::detect).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::XUnit => "xunit",
            Self::NUnit => "nunit",
            Self::MsTest => "mstest",
            Self::Jest => "jest",
            Self::Pytest => "pytest",
        }
    }

    /// Whether the framework runs through `dotnet test`.
    #[must_use]
    pub const fn is_dotnet(&self) -> bool {
        matches!(self, Self::XUnit | Self::NUnit | Self::MsTest)
    }

    /// Guess the framework from project or config file text.
    ///
    /// Case-insensitive substring search, first hit wins in the order
    /// xunit, nunit, mstest, jest, pytest. This is a heuristic: a project
    /// file mentioning several frameworks resolves to the first.
    #[must_use]
    pub fn detect(project_text: &str) -> Self {
        let lower = project_text.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .filter(|kind| *kind != Self::Unknown)
            .find(|kind| lower.contains(kind.as_str()))
            .unwrap_or(Self::Unknown)
    }

    /// Read a project file and detect its framework.
    ///
    /// An unreadable or missing file yields `Unknown`.
    #[must_use]
    pub fn detect_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::detect(&content),
            Err(_) => Self::Unknown,
        }
    }
}

impl fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown framework name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrameworkError {
    input: String,
}

impl fmt::Display for ParseFrameworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown test framework: '{}'", self.input)
    }
}

impl std::error::Error for ParseFrameworkError {}

impl FromStr for FrameworkKind {
    type Err = ParseFrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xunit" => Ok(Self::XUnit),
            "nunit" => Ok(Self::NUnit),
            "mstest" | "vstest" => Ok(Self::MsTest),
            "jest" => Ok(Self::Jest),
            "pytest" | "py.test" => Ok(Self::Pytest),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseFrameworkError {
                input: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Test Failure
// ============================================================================

/// One failing test extracted from a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    /// Test identifier as printed by the runner (class-qualified when known).
    pub name: String,
    /// Failure message.
    pub error_message: String,
    /// Stack trace excerpt, possibly empty.
    pub stack_fragment: String,
    /// Expected value, when the message states one.
    pub expected: Option<String>,
    /// Actual value, when the message states one.
    pub actual: Option<String>,
}

impl TestFailure {
    /// Create a failure with a name and message.
    #[must_use]
    pub fn new(name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error_message: error_message.into(),
            stack_fragment: String::new(),
            expected: None,
            actual: None,
        }
    }

    /// Attach a stack fragment.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack_fragment = stack.into();
        self
    }

    /// Attach expected and actual values.
    #[must_use]
    pub fn with_values(mut self, expected: Option<String>, actual: Option<String>) -> Self {
        self.expected = expected;
        self.actual = actual;
        self
    }
}

// ============================================================================
// Test Run Result
// ============================================================================

/// Outcome of one test execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestRunResult {
    /// Project that was run, when produced by a test backend.
    pub project_path: Option<PathBuf>,
    /// Framework whose report shape was parsed.
    pub framework: FrameworkKind,
    /// Total test count as reported.
    pub total: u32,
    /// Passed test count.
    pub passed: u32,
    /// Skipped test count.
    pub skipped: u32,
    /// Failing tests in report order.
    pub failures: Vec<TestFailure>,
    /// When execution started; `None` for text parsed without a run.
    pub started_at: Option<DateTime<Utc>>,
    /// When execution ended; `None` for text parsed without a run.
    pub ended_at: Option<DateTime<Utc>>,
    /// Launch failure or timeout description.
    pub error_message: Option<String>,
}

impl TestRunResult {
    /// Empty result for a framework.
    #[must_use]
    pub fn empty(framework: FrameworkKind) -> Self {
        Self {
            framework,
            ..Default::default()
        }
    }

    /// Result describing a run that never produced a report.
    #[must_use]
    pub fn errored(framework: FrameworkKind, message: impl Into<String>) -> Self {
        Self {
            framework,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// No failures and no execution error.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.error_message.is_none()
    }

    /// Number of failing tests.
    #[must_use]
    pub fn failed(&self) -> u32 {
        u32::try_from(self.failures.len()).unwrap_or(u32::MAX)
    }

    /// Wall-clock duration when both timestamps are known.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => (end - start).to_std().ok(),
            _ => None,
        }
    }

    /// Whether the counters satisfy `total >= passed + failed + skipped`.
    ///
    /// Frameworks report inconsistently, so this is informational only.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::from(self.total)
            >= u64::from(self.passed) + self.failures.len() as u64 + u64::from(self.skipped)
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if let Some(ref error) = self.error_message {
            return format!("{}: run failed - {}", self.framework, error);
        }
        format!(
            "{}: {} total, {} passed, {} failed, {} skipped",
            self.framework,
            self.total,
            self.passed,
            self.failures.len(),
            self.skipped
        )
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Normalize raw runner output into a [`TestRunResult`].
///
/// Pure and deterministic: the same text and kind always produce equal
/// results. Timestamps and project path are left unset.
#[must_use]
pub fn parse(raw_text: &str, framework: FrameworkKind) -> TestRunResult {
    let mut result = TestRunResult::empty(framework);

    match framework {
        FrameworkKind::XUnit => xunit::parse_into(raw_text, &mut result),
        FrameworkKind::NUnit => nunit::parse_into(raw_text, &mut result),
        FrameworkKind::MsTest => mstest::parse_into(raw_text, &mut result),
        FrameworkKind::Jest => jest::parse_into(raw_text, &mut result),
        FrameworkKind::Pytest => pytest::parse_into(raw_text, &mut result),
        FrameworkKind::Unknown => {}
    }

    result
}
