//! Parsing utilities shared by the framework strategies.
//!
//! - [`capture_count`] - first integer captured by a summary pattern
//! - [`scan_failure_lines`] - framework-agnostic failure line scan
//! - [`parse_dotnet_failures`] - `dotnet test` console failure blocks
//! - [`reconcile_failures`] - align the failure list with a reported count

use super::TestFailure;
use regex::Regex;

/// Name given to failures whose identifier could not be extracted.
pub const UNKNOWN_TEST: &str = "Unknown Test";

/// Return the first capture group of `pattern` parsed as a count.
#[must_use]
pub fn capture_count(text: &str, pattern: &str) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Extract a `Class.Method` style name from a failure line.
#[must_use]
pub fn extract_test_name(line: &str) -> String {
    if let Ok(re) = Regex::new(r"Tests\.(\w+)\.(\w+)") {
        if let Some(caps) = re.captures(line) {
            return format!("{}.{}", &caps[1], &caps[2]);
        }
    }

    if let Ok(re) = Regex::new(r"(\w+\.\w+)\s*\(") {
        if let Some(caps) = re.captures(line) {
            return caps[1].to_string();
        }
    }

    UNKNOWN_TEST.to_string()
}

/// Pull `Expected:` / `Actual:` values out of a failure message block.
///
/// Recognizes `Actual:`, `Received:` (Jest) and `But was:` (NUnit).
#[must_use]
pub fn extract_expected_actual(block: &str) -> (Option<String>, Option<String>) {
    let expected = Regex::new(r"(?m)^\s*Expected:\s*(.+?)\s*$")
        .ok()
        .and_then(|re| re.captures(block).map(|c| c[1].to_string()));
    let actual = Regex::new(r"(?m)^\s*(?:Actual|Received|But was):\s*(.+?)\s*$")
        .ok()
        .and_then(|re| re.captures(block).map(|c| c[1].to_string()));
    (expected, actual)
}

/// Framework-agnostic failure scan.
///
/// A line containing `Error Message:` or `FAILED` opens a failure; a later
/// `Stack Trace:` line attaches to the open failure.
#[must_use]
pub fn scan_failure_lines(output: &str) -> Vec<TestFailure> {
    let mut failures = Vec::new();
    let mut current: Option<TestFailure> = None;

    for line in output.lines() {
        if line.contains("Error Message:") || line.contains("FAILED") {
            if let Some(done) = current.take() {
                failures.push(done);
            }
            current = Some(TestFailure::new(extract_test_name(line), line.trim()));
        } else if line.contains("Stack Trace:") {
            if let Some(ref mut open) = current {
                open.stack_fragment = line.trim().to_string();
            }
        }
    }

    if let Some(done) = current {
        failures.push(done);
    }

    failures
}

/// Section of a `dotnet test` failure block currently being read.
#[derive(Clone, Copy, PartialEq, Eq)]
enum DotnetSection {
    Header,
    Message,
    Stack,
}

/// Parse the failure blocks printed by `dotnet test` (vstest console).
///
/// ```text
///   Failed Calc.Tests.CalculatorTests.Add_ReturnsSum [4 ms]
///   Error Message:
///    Assert.Equal() Failure
///    Expected: 5
///    Actual:   -1
///   Stack Trace:
///      at Calc.Tests.CalculatorTests.Add_ReturnsSum() in CalculatorTests.cs:line 12
/// ```
///
/// Also accepts the single-line MSBuild form
/// `error TESTERROR: Ns.Class.Method (4ms): Error Message: ...`.
#[must_use]
pub fn parse_dotnet_failures(output: &str) -> Vec<TestFailure> {
    let mut failures = Vec::new();

    let Ok(header) = Regex::new(r"^\s*Failed\s+([\w.`+<>,]+(?:\(.*\))?)\s*\[") else {
        return failures;
    };
    let testerror =
        Regex::new(r"error TESTERROR:\s*([\w.`+<>]+)\s*\(.*?\):\s*Error Message:\s*(.*)$").ok();

    let mut name: Option<String> = None;
    let mut message: Vec<String> = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut section = DotnetSection::Header;

    let mut flush = |name: &mut Option<String>, message: &mut Vec<String>, stack: &mut Vec<String>| {
        if let Some(test) = name.take() {
            let message_text = message.join("\n");
            let (expected, actual) = extract_expected_actual(&message_text);
            failures.push(
                TestFailure::new(short_dotnet_name(&test), first_line(&message_text))
                    .with_stack(stack.join("\n"))
                    .with_values(expected, actual),
            );
        }
        message.clear();
        stack.clear();
    };

    for line in output.lines() {
        if let Some(caps) = testerror.as_ref().and_then(|re| re.captures(line)) {
            flush(&mut name, &mut message, &mut stack);
            name = Some(caps[1].to_string());
            message.push(caps[2].trim().to_string());
            flush(&mut name, &mut message, &mut stack);
            section = DotnetSection::Header;
            continue;
        }

        if let Some(caps) = header.captures(line) {
            flush(&mut name, &mut message, &mut stack);
            name = Some(caps[1].to_string());
            section = DotnetSection::Header;
            continue;
        }

        if name.is_none() {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("Error Message:") {
            section = DotnetSection::Message;
            let rest = trimmed.trim_start_matches("Error Message:").trim();
            if !rest.is_empty() {
                message.push(rest.to_string());
            }
        } else if trimmed.starts_with("Stack Trace:") {
            section = DotnetSection::Stack;
        } else if trimmed.is_empty() || trimmed.starts_with("Passed ") || trimmed.starts_with("Skipped ") {
            if section == DotnetSection::Stack {
                flush(&mut name, &mut message, &mut stack);
                section = DotnetSection::Header;
            }
        } else {
            match section {
                DotnetSection::Message => message.push(trimmed.to_string()),
                DotnetSection::Stack => stack.push(trimmed.to_string()),
                DotnetSection::Header => {}
            }
        }
    }
    flush(&mut name, &mut message, &mut stack);

    failures
}

/// Drop the namespace from a fully qualified test name, keeping
/// `Class.Method` and any theory arguments so each case stays distinct.
fn short_dotnet_name(full: &str) -> String {
    let (base, args) = match full.find('(') {
        Some(idx) => full.split_at(idx),
        None => (full, ""),
    };
    let parts: Vec<&str> = base.split('.').collect();
    let short = if parts.len() >= 2 {
        parts[parts.len() - 2..].join(".")
    } else {
        base.to_string()
    };
    format!("{short}{args}")
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

/// Make the failure list length match the count the summary reported.
///
/// Missing entries are filled with [`UNKNOWN_TEST`] placeholders, surplus
/// entries beyond the reported count are dropped. Names already seen are
/// not duplicated.
#[must_use]
pub fn reconcile_failures(found: Vec<TestFailure>, reported: u32) -> Vec<TestFailure> {
    let reported = reported as usize;
    let mut failures: Vec<TestFailure> = Vec::with_capacity(reported);

    for failure in found {
        if failures.len() >= reported {
            break;
        }
        let duplicate = failure.name != UNKNOWN_TEST
            && failures.iter().any(|f| f.name == failure.name);
        if !duplicate {
            failures.push(failure);
        }
    }

    while failures.len() < reported {
        failures.push(TestFailure::new(
            UNKNOWN_TEST,
            "Failure reported by the runner summary but no failure details were found",
        ));
    }

    failures
}
