//! MSTest report parsing.
//!
//! ```text
//! Total tests: 3
//!      Passed: 2
//!      Failed: 1
//! ```
//!
//! `dotnet test` with the MSTest adapter prints the vstest summary instead:
//!
//! ```text
//! Failed!  - Failed: 1, Passed: 2, Skipped: 0, Total: 3
//! ```

use super::parser::{capture_count, parse_dotnet_failures, reconcile_failures, scan_failure_lines};
use super::TestRunResult;

/// Fill `result` from MSTest output. Counters without a match stay at zero.
pub fn parse_into(output: &str, result: &mut TestRunResult) {
    if let Some(total) = capture_count(output, r"Total tests:\s*(\d+)")
        .or_else(|| capture_count(output, r"Total:\s*(\d+)"))
    {
        result.total = total;
    }
    if let Some(passed) = capture_count(output, r"Passed:\s*(\d+)") {
        result.passed = passed;
    }
    if let Some(skipped) = capture_count(output, r"Skipped:\s*(\d+)") {
        result.skipped = skipped;
    }
    if let Some(failed) = capture_count(output, r"Failed:\s*(\d+)") {
        let mut found = parse_dotnet_failures(output);
        if found.is_empty() {
            found = scan_failure_lines(output);
        }
        result.failures = reconcile_failures(found, failed);
    }
}
