//! pytest report parsing.
//!
//! The summary is the last line carrying outcome counts, e.g.
//! `==== 1 failed, 2 passed, 1 skipped in 0.12s ====`. Collection errors
//! (`1 error`) count as failures. Failure names come from the short test
//! summary (`FAILED tests/test_calc.py::TestCalc::test_add - assert -1 == 5`),
//! stack fragments from the matching `____ test_add ____` section.

use super::parser::{extract_expected_actual, reconcile_failures};
use super::{TestFailure, TestRunResult};
use regex::Regex;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Summary {
    passed: u32,
    failed: u32,
    skipped: u32,
}

fn parse_summary(output: &str) -> Option<Summary> {
    let counts = Regex::new(r"(\d+)\s+(passed|failed|skipped|errors?|xfailed|xpassed)\b").ok()?;

    let line = output.lines().rev().find(|line| {
        (line.contains(" passed") || line.contains(" failed") || line.contains(" error"))
            && counts.is_match(line)
    })?;

    let mut summary = Summary::default();
    for caps in counts.captures_iter(line) {
        let n: u32 = caps[1].parse().ok()?;
        match &caps[2] {
            "passed" | "xpassed" => summary.passed += n,
            "failed" | "error" | "errors" => summary.failed += n,
            _ => summary.skipped += n,
        }
    }
    Some(summary)
}

/// Section body under a `____ name ____` header, up to the next header.
fn failure_section(output: &str, test: &str) -> String {
    let Ok(header) = Regex::new(r"^_{3,}\s+(.+?)\s+_{3,}$") else {
        return String::new();
    };

    let mut capturing = false;
    let mut lines = Vec::new();
    for line in output.lines() {
        if let Some(caps) = header.captures(line.trim()) {
            if capturing {
                break;
            }
            let title = &caps[1];
            capturing = title == test || title.ends_with(&format!(".{test}"));
            continue;
        }
        if capturing {
            if line.starts_with("====") {
                break;
            }
            lines.push(line.trim_end());
        }
    }

    lines.join("\n").trim().to_string()
}

/// Expected/actual from a bare `assert actual == expected` message.
fn assert_values(message: &str) -> (Option<String>, Option<String>) {
    Regex::new(r"assert\s+(.+?)\s+==\s+(.+)$")
        .ok()
        .and_then(|re| {
            re.captures(message)
                .map(|c| (Some(c[2].trim().to_string()), Some(c[1].trim().to_string())))
        })
        .unwrap_or((None, None))
}

fn parse_failure_lines(output: &str) -> Vec<TestFailure> {
    let Ok(line_re) = Regex::new(r"^(?:FAILED|ERROR)\s+(\S+)(?:\s+-\s+(.*))?$") else {
        return Vec::new();
    };

    output
        .lines()
        .filter_map(|line| line_re.captures(line.trim()))
        .map(|caps| {
            let node_id = caps[1].to_string();
            let name = node_id
                .split_once("::")
                .map_or(node_id.as_str(), |(_, rest)| rest)
                .to_string();
            let message = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();

            let short = name.rsplit("::").next().unwrap_or(&name).to_string();
            let stack = failure_section(output, &short);

            let (mut expected, mut actual) = extract_expected_actual(&stack);
            if expected.is_none() && actual.is_none() {
                (expected, actual) = assert_values(&message);
            }

            TestFailure::new(name.replace("::", "."), message)
                .with_stack(stack)
                .with_values(expected, actual)
        })
        .collect()
}

/// Fill `result` from pytest output. Leaves it untouched when no summary matches.
pub fn parse_into(output: &str, result: &mut TestRunResult) {
    let Some(summary) = parse_summary(output) else {
        return;
    };

    result.passed = summary.passed;
    result.skipped = summary.skipped;
    result.failures = reconcile_failures(parse_failure_lines(output), summary.failed);
    result.total = summary
        .passed
        .saturating_add(summary.failed)
        .saturating_add(summary.skipped);
}
