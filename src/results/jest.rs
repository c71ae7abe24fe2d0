//! Jest report parsing.
//!
//! ```text
//!   ● Calculator › adds two numbers
//!
//!     expect(received).toBe(expected) // Object.is equality
//!
//!     Expected: 5
//!     Received: -1
//!
//!       at Object.<anonymous> (calculator.test.js:4:20)
//!
//! Tests:       1 failed, 1 skipped, 3 passed, 5 total
//! ```

use super::parser::{extract_expected_actual, reconcile_failures};
use super::{TestFailure, TestRunResult};
use regex::Regex;

/// Aggregate counts from the `Tests:` line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Summary {
    failed: u32,
    passed: u32,
    skipped: u32,
    total: u32,
}

fn parse_summary(output: &str) -> Option<Summary> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Tests:"))?;
    let counts = Regex::new(r"(\d+)\s+(failed|passed|skipped|todo|total)").ok()?;

    let mut summary = Summary::default();
    let mut saw_total = false;
    for caps in counts.captures_iter(line) {
        let n: u32 = caps[1].parse().ok()?;
        match &caps[2] {
            "failed" => summary.failed = n,
            "passed" => summary.passed = n,
            "skipped" | "todo" => summary.skipped += n,
            _ => {
                summary.total = n;
                saw_total = true;
            }
        }
    }

    saw_total.then_some(summary)
}

/// Collect `●` failure blocks.
fn parse_failure_blocks(output: &str) -> Vec<TestFailure> {
    let mut failures = Vec::new();
    let mut name: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    let mut flush = |name: &mut Option<String>, body: &mut Vec<&str>| {
        if let Some(test) = name.take() {
            let message = body
                .iter()
                .map(|l| l.trim())
                .find(|l| !l.is_empty() && !l.starts_with("at "))
                .unwrap_or_default()
                .to_string();
            let stack = body
                .iter()
                .map(|l| l.trim())
                .filter(|l| l.starts_with("at "))
                .collect::<Vec<_>>()
                .join("\n");
            let (expected, actual) = extract_expected_actual(&body.join("\n"));
            failures.push(
                TestFailure::new(test, message)
                    .with_stack(stack)
                    .with_values(expected, actual),
            );
        }
        body.clear();
    };

    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('●') {
            flush(&mut name, &mut body);
            let title = rest.trim();
            if !title.starts_with("Console") && !title.is_empty() {
                name = Some(title.replace(" › ", " > "));
            }
        } else if trimmed.starts_with("Test Suites:") || trimmed.starts_with("Tests:") {
            flush(&mut name, &mut body);
        } else if name.is_some() {
            body.push(line);
        }
    }
    flush(&mut name, &mut body);

    failures
}

/// Fill `result` from Jest output. Leaves it untouched when no `Tests:` line matches.
pub fn parse_into(output: &str, result: &mut TestRunResult) {
    let Some(summary) = parse_summary(output) else {
        return;
    };

    result.total = summary.total;
    result.passed = summary.passed;
    result.skipped = summary.skipped;
    result.failures = reconcile_failures(parse_failure_blocks(output), summary.failed);
}
