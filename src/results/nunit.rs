//! NUnit report parsing.
//!
//! The counters are matched independently (`Passed: N`, `Failed: N`,
//! `Skipped: N`) and the total is derived from them.

use super::parser::{capture_count, parse_dotnet_failures, reconcile_failures, scan_failure_lines};
use super::TestRunResult;

/// Fill `result` from NUnit output. Leaves it untouched when no counter matches.
pub fn parse_into(output: &str, result: &mut TestRunResult) {
    let passed = capture_count(output, r"Passed:\s*(\d+)");
    let failed = capture_count(output, r"Failed:\s*(\d+)");
    let skipped = capture_count(output, r"Skipped:\s*(\d+)");

    if let Some(passed) = passed {
        result.passed = passed;
    }
    if let Some(failed) = failed {
        let mut found = parse_dotnet_failures(output);
        if found.is_empty() {
            found = scan_failure_lines(output);
        }
        result.failures = reconcile_failures(found, failed);
    }
    if let Some(skipped) = skipped {
        result.skipped = skipped;
    }

    result.total = result
        .passed
        .saturating_add(result.failed())
        .saturating_add(result.skipped);
}
