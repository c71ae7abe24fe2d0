//! Benchmark suite for redgreen subsystems.
//!
//! This module provides performance benchmarks for:
//! - Result normalization (one run per framework, growing failure counts)
//! - Framework detection (project directories with many files)
//! - Fix application and prompt assembly
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Save baseline for comparison
//! cargo bench -- --save-baseline main
//!
//! # Compare against baseline
//! cargo bench -- --baseline main
//! ```
//!
//! Criterion writes its reports to `target/criterion/`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redgreen::results::{parse, FrameworkKind};
use redgreen::tdd::{analysis, prompts, FixSuggestion};
use redgreen::{Language, TestFailure};
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Result Normalization Benchmarks
// ============================================================================

fn xunit_output(failures: usize) -> String {
    let mut out = String::new();
    for i in 0..failures {
        out.push_str(&format!(
            "  Failed Calc.Tests.CalculatorTests.Case{i} [3 ms]\n  Error Message:\n   Assert.Equal() Failure\n   Expected: {i}\n   Actual:   -1\n  Stack Trace:\n     at Calc.Tests.CalculatorTests.Case{i}() in CalculatorTests.cs:line {i}\n\n"
        ));
    }
    out.push_str(&format!(
        "Failed!  - Failed: {failures}, Passed: 100, Skipped: 0, Total: {}, Duration: 1 s\n",
        failures + 100
    ));
    out
}

fn jest_output(failures: usize) -> String {
    let mut out = String::from("FAIL src/calc.test.js\n");
    for i in 0..failures {
        out.push_str(&format!(
            "  ● Calculator › case {i}\n\n    expect(received).toBe(expected)\n\n    Expected: {i}\n    Received: -1\n\n      at Object.<anonymous> (src/calc.test.js:{i}:5)\n\n"
        ));
    }
    out.push_str(&format!(
        "Tests:       {failures} failed, 100 passed, {} total\n",
        failures + 100
    ));
    out
}

fn pytest_output(failures: usize) -> String {
    let mut out = String::from("=================================== FAILURES ===================================\n");
    for i in 0..failures {
        out.push_str(&format!(
            "______________________________ TestCalc.test_case_{i} _______________________________\n\n>       assert add(2, 3) == {i}\nE       assert 5 == {i}\n\n"
        ));
    }
    out.push_str("=========================== short test summary info ============================\n");
    for i in 0..failures {
        out.push_str(&format!(
            "FAILED tests/test_calc.py::TestCalc::test_case_{i} - assert 5 == {i}\n"
        ));
    }
    out.push_str(&format!(
        "========================= {failures} failed, 100 passed in 0.42s ==========================\n"
    ));
    out
}

/// Benchmark parsing of failing runs for each framework.
fn bench_result_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("result_parsing");

    for failures in [1, 10, 100] {
        let inputs = [
            (FrameworkKind::XUnit, xunit_output(failures)),
            (FrameworkKind::Jest, jest_output(failures)),
            (FrameworkKind::Pytest, pytest_output(failures)),
        ];

        group.throughput(Throughput::Elements(failures as u64));
        for (kind, text) in &inputs {
            group.bench_with_input(BenchmarkId::new(kind.as_str(), failures), text, |b, text| {
                b.iter(|| black_box(parse(black_box(text), *kind)));
            });
        }
    }

    group.finish();
}

// ============================================================================
// Framework Detection Benchmarks
// ============================================================================

/// Benchmark directory-level detection with unrelated files present.
fn bench_framework_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("framework_detection");

    for size in [10, 100, 500] {
        let temp_dir = create_dotnet_project_with_files(size);
        let project = temp_dir.path().to_path_buf();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("dotnet_dir", size), &project, |b, path| {
            b.iter(|| black_box(redgreen::runner::detect_project_framework(black_box(path))));
        });
    }

    group.finish();
}

// ============================================================================
// TDD Text Handling Benchmarks
// ============================================================================

/// Benchmark fix application and fix-analysis prompt assembly.
fn bench_tdd_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdd_text");
    let source = "public int Add(int a, int b) { return a - b; }\n".repeat(200);

    for count in [1, 10, 50] {
        let fixes: Vec<FixSuggestion> = (0..count)
            .map(|i| FixSuggestion {
                test_name: format!("CalculatorTests.Case{i}"),
                root_cause: "Root cause: subtraction".to_string(),
                proposed_fix: "public int Add(int a, int b) { return a + b; }".to_string(),
                explanation: String::new(),
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("apply_fixes", count), &fixes, |b, fixes| {
            b.iter(|| black_box(analysis::apply_fixes(&source, fixes, Language::CSharp)));
        });
    }

    let failure = TestFailure::new("CalculatorTests.Add", "Assert.Equal() Failure")
        .with_stack("at CalculatorTests.Add() in CalculatorTests.cs:line 12")
        .with_values(Some("5".to_string()), Some("-1".to_string()));
    group.bench_function("fix_analysis_prompt", |b| {
        b.iter(|| black_box(prompts::fix_analysis(&source, &failure, Language::CSharp)));
    });

    group.finish();
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a .NET test project with `file_count` source files beside it.
fn create_dotnet_project_with_files(file_count: usize) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    fs::write(
        temp_dir.path().join("Calc.Tests.csproj"),
        r#"<Project Sdk="Microsoft.NET.Sdk"><ItemGroup><PackageReference Include="xunit" Version="2.6.2" /></ItemGroup></Project>"#,
    )
    .expect("Failed to write csproj");

    for i in 0..file_count {
        fs::write(
            temp_dir.path().join(format!("Case{i}Tests.cs")),
            format!("public class Case{i}Tests {{ [Fact] public void Works() {{ }} }}\n"),
        )
        .expect("Failed to write source file");
    }

    temp_dir
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(parse_benches, bench_result_parsing);

criterion_group!(detect_benches, bench_framework_detection);

criterion_group!(tdd_benches, bench_tdd_text);

criterion_main!(parse_benches, detect_benches, tdd_benches);
