//! xUnit.net report parsing.
//!
//! Reads the `dotnet test` summary in either of its two shapes:
//!
//! ```text
//! Test summary: total: 10; failed: 2; succeeded: 8; skipped: 0; duration: 1.2s
//! Failed!  - Failed:     2, Passed:     8, Skipped:     0, Total:    10
//! ```

use super::parser::{parse_dotnet_failures, reconcile_failures, scan_failure_lines};
use super::TestRunResult;
use regex::Regex;

/// Aggregate counts read from an xUnit summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Summary {
    total: u32,
    failed: u32,
    passed: u32,
    skipped: u32,
}

fn parse_summary(output: &str) -> Option<Summary> {
    let modern = Regex::new(
        r"total:\s*(\d+);\s*failed:\s*(\d+);\s*succeeded:\s*(\d+);\s*skipped:\s*(\d+)",
    )
    .ok()?;
    if let Some(caps) = modern.captures(output) {
        return Some(Summary {
            total: caps[1].parse().ok()?,
            failed: caps[2].parse().ok()?,
            passed: caps[3].parse().ok()?,
            skipped: caps[4].parse().ok()?,
        });
    }

    let vstest = Regex::new(
        r"Failed:\s*(\d+),\s*Passed:\s*(\d+),\s*Skipped:\s*(\d+),\s*Total:\s*(\d+)",
    )
    .ok()?;
    let caps = vstest.captures(output)?;
    Some(Summary {
        failed: caps[1].parse().ok()?,
        passed: caps[2].parse().ok()?,
        skipped: caps[3].parse().ok()?,
        total: caps[4].parse().ok()?,
    })
}

/// Fill `result` from xUnit output. Leaves it untouched when no summary matches.
pub fn parse_into(output: &str, result: &mut TestRunResult) {
    let Some(summary) = parse_summary(output) else {
        return;
    };

    let mut found = parse_dotnet_failures(output);
    if found.is_empty() {
        found = scan_failure_lines(output);
    }

    result.total = summary.total;
    result.passed = summary.passed;
    result.skipped = summary.skipped;
    result.failures = reconcile_failures(found, summary.failed);
}

#[cfg(test)]
mod tests {
    use crate::results::{parse, FrameworkKind};

    #[test]
    fn test_summary_roundtrip() {
        let result = parse(
            "Test summary: total: 10; failed: 2; succeeded: 8; skipped: 0",
            FrameworkKind::XUnit,
        );
        assert_eq!(result.total, 10);
        assert_eq!(result.passed, 8);
        assert_eq!(result.failures.len(), 2);
        assert_eq!(result.skipped, 0);
        assert!(!result.succeeded());
    }

    #[test]
    fn test_vstest_summary_with_blocks() {
        let output = "\
  Failed Calc.Tests.CalculatorTests.Add_ReturnsSum [4 ms]
  Error Message:
   Assert.Equal() Failure
   Expected: 5
   Actual:   -1
  Stack Trace:
     at Calc.Tests.CalculatorTests.Add_ReturnsSum() in CalculatorTests.cs:line 12

Failed!  - Failed:     1, Passed:     1, Skipped:     0, Total:     2, Duration: 8 ms
";
        let result = parse(output, FrameworkKind::XUnit);
        assert_eq!(result.total, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].name.contains("Add"));
        assert_eq!(result.failures[0].actual.as_deref(), Some("-1"));
    }

    #[test]
    fn test_all_passing() {
        let result = parse(
            "Passed!  - Failed:     0, Passed:    12, Skipped:     1, Total:    13",
            FrameworkKind::XUnit,
        );
        assert_eq!(result.total, 13);
        assert_eq!(result.passed, 12);
        assert_eq!(result.skipped, 1);
        assert!(result.succeeded());
    }

    #[test]
    fn test_build_error_without_summary() {
        let result = parse(
            "Calculator.cs(9,13): error CS0103: The name 'x' does not exist\nBuild FAILED.",
            FrameworkKind::XUnit,
        );
        assert_eq!(result.total, 0);
        assert!(result.failures.is_empty());
    }
}
