//! Test fixtures for creating reproducible test environments.
//!
//! Provides temporary projects for each supported test framework and
//! captured runner output for the result parsers.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test fixture representing a temporary project directory.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::dotnet_project(true);
/// assert_eq!(detect_project_framework(&fixture.project_file()), FrameworkKind::XUnit);
/// ```
pub struct TestFixture {
    temp_dir: TempDir,
    project_file: Option<PathBuf>,
}

impl TestFixture {
    /// Create an empty project directory.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            project_file: None,
        }
    }

    /// Create a .NET test project referencing xUnit or NUnit.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn dotnet_project(xunit: bool) -> Self {
        let mut fixture = Self::empty();
        let package = if xunit { "xunit" } else { "NUnit" };
        let path = fixture.write_file("Calc.Tests.csproj", &Self::csproj_content(package));
        fixture.project_file = Some(path);
        fixture
    }

    /// Create a JavaScript project whose test script runs Jest.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn jest_project() -> Self {
        let mut fixture = Self::empty();
        let path = fixture.write_file(
            "package.json",
            r#"{
  "name": "calc",
  "scripts": { "test": "jest" },
  "devDependencies": { "jest": "^29.7.0" }
}
"#,
        );
        fixture.project_file = Some(path);
        fixture
    }

    /// Create a Python project configured for pytest.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn pytest_project() -> Self {
        let mut fixture = Self::empty();
        let path = fixture.write_file("pytest.ini", "[pytest]\ntestpaths = tests\n");
        fixture.write_file(
            "tests/test_calc.py",
            "from calc import add\n\n\ndef test_add():\n    assert add(2, 3) == 5\n",
        );
        fixture.project_file = Some(path);
        fixture
    }

    /// Write `content` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Get the path to the project directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Project marker file, or the directory for an empty fixture.
    #[must_use]
    pub fn project_file(&self) -> PathBuf {
        self.project_file
            .clone()
            .unwrap_or_else(|| self.temp_dir.path().to_path_buf())
    }

    fn csproj_content(package: &str) -> String {
        format!(
            r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <IsTestProject>true</IsTestProject>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Microsoft.NET.Test.Sdk" Version="17.8.0" />
    <PackageReference Include="{package}" Version="2.6.2" />
  </ItemGroup>
</Project>
"#
        )
    }
}

// ============================================================================
// Captured runner output
// ============================================================================

/// `dotnet test` output for an xUnit project with one failing assertion.
pub const XUNIT_FAILING_OUTPUT: &str = "\
Starting test execution, please wait...
A total of 1 test files matched the specified pattern.
[xUnit.net 00:00:00.52]     CalculatorTests.Add [FAIL]
  Failed CalculatorTests.Add [3 ms]
  Error Message:
   Assert.Equal() Failure
   Expected: 5
   Actual:   -1
  Stack Trace:
     at CalculatorTests.Add() in /src/CalculatorTests.cs:line 12

Failed!  - Failed:     1, Passed:     2, Skipped:     0, Total:     3, Duration: 41 ms
";

/// pytest output with one failure.
pub const PYTEST_FAILING_OUTPUT: &str = "\
============================= test session starts ==============================
collected 3 items

tests/test_calc.py .F.                                                   [100%]

=================================== FAILURES ===================================
______________________________ TestCalc.test_add _______________________________

    def test_add(self):
>       assert add(2, 3) == 5
E       assert -1 == 5

tests/test_calc.py:6: AssertionError
=========================== short test summary info ============================
FAILED tests/test_calc.py::TestCalc::test_add - assert -1 == 5
========================= 1 failed, 2 passed in 0.03s ==========================
";
