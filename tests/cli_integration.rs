//! Integration tests for the redgreen CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const XUNIT_FAILING: &str = "\
  Failed CalculatorTests.Add [3 ms]
  Error Message:
   Assert.Equal() Failure
   Expected: 5
   Actual:   -1
  Stack Trace:
     at CalculatorTests.Add() in /src/CalculatorTests.cs:line 12

Failed!  - Failed:     1, Passed:     2, Skipped:     0, Total:     3, Duration: 41 ms
";

const JEST_PASSING: &str = "\
PASS src/calc.test.js
Tests:       4 passed, 4 total
";

/// Get a Command for the redgreen binary
fn redgreen() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("redgreen"));
    cmd.env_remove("REDGREEN_PROVIDER").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help() {
    redgreen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Test-driven development loop automation",
        ));
}

#[test]
fn test_version() {
    redgreen()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

// =========================================================================
// parse
// =========================================================================

#[test]
fn test_parse_failing_xunit_output() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("dotnet-test.log");
    fs::write(&output, XUNIT_FAILING).unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .arg("parse")
        .arg(&output)
        .arg("--framework")
        .arg("xunit")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"))
        .stdout(predicate::str::contains("CalculatorTests.Add"))
        .stdout(predicate::str::contains("Expected: 5"));
}

#[test]
fn test_parse_json_from_stdin() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["parse", "-", "--framework", "jest", "--json"])
        .write_stdin(JEST_PASSING)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"framework\": \"jest\""))
        .stdout(predicate::str::contains("\"passed\": 4"));
}

#[test]
fn test_parse_rejects_unknown_framework() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["parse", "-", "--framework", "junit"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("junit"));
}

// =========================================================================
// detect / run
// =========================================================================

#[test]
fn test_detect_dotnet_project() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("Calc.Tests.csproj"),
        r#"<Project Sdk="Microsoft.NET.Sdk"><ItemGroup><PackageReference Include="xunit" Version="2.6.2" /></ItemGroup></Project>"#,
    )
    .unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("xunit"));
}

#[test]
fn test_detect_empty_project() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .arg("detect")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No supported test framework"));
}

#[test]
fn test_run_without_framework_reports_failure() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .arg("run")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Run failed:"))
        .stdout(predicate::str::contains("not supported"));
}

#[test]
fn test_run_method_requires_class() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["run", "--method", "Adds"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--class"));
}

#[test]
fn test_missing_project_is_rejected() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path().join("nope"))
        .arg("detect")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("does not exist"));
}

// =========================================================================
// cycle
// =========================================================================

#[test]
fn test_cycle_needs_language_for_unknown_extension() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("calc.txt");
    fs::write(&source, "add").unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .arg("cycle")
        .arg(&source)
        .assert()
        .code(7)
        .stderr(predicate::str::contains("pass --language"));
}

// =========================================================================
// config
// =========================================================================

#[test]
fn test_config_paths() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["config", "paths"])
        .assert()
        .success()
        .stdout(predicate::str::contains("settings.json"));
}

#[test]
fn test_config_show_defaults() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_iterations\": 5"))
        .stdout(predicate::str::contains("\"failure_threshold\": 3"));
}

#[test]
fn test_config_show_applies_provider_override() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .env("REDGREEN_PROVIDER", "my-copilot --quiet")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("my-copilot --quiet"));
}

#[test]
fn test_config_validate_ok() {
    let temp = TempDir::new().unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_validate_reports_problems() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".redgreen")).unwrap();
    fs::write(
        temp.path().join(".redgreen/settings.json"),
        r#"{ "tdd": { "max_iterations": 0 }, "provider": { "timeout_secs": 500 } }"#,
    )
    .unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["config", "validate"])
        .assert()
        .code(7)
        .stdout(predicate::str::contains("tdd.max_iterations"))
        .stdout(predicate::str::contains("provider.timeout_secs"))
        .stderr(predicate::str::contains("2 configuration problem(s)"));
}

#[test]
fn test_invalid_settings_json() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".redgreen")).unwrap();
    fs::write(temp.path().join(".redgreen/settings.json"), "{ not json").unwrap();

    redgreen()
        .arg("--project")
        .arg(temp.path())
        .args(["config", "show"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("invalid settings JSON"));
}
