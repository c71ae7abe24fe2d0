//! Test execution backend.
//!
//! Picks the launcher for a project's framework, runs it through the
//! [`ProcessRunner`] and normalizes the combined output. Launch failures,
//! timeouts and unsupported frameworks never escape as errors: they are
//! folded into [`TestRunResult::error_message`] with zeroed counters.
//!
//! | Framework            | Command                                            |
//! |----------------------|----------------------------------------------------|
//! | xUnit / NUnit / MSTest | `dotnet test <project> --verbosity normal [--filter <expr>]` |
//! | Jest                 | `npm test [-- --testNamePattern=<expr>]`           |
//! | pytest               | `pytest . [-k <expr>]`                             |
//!
//! Project paths are made absolute before the command is built, so a
//! relative path is never resolved a second time against the launcher's
//! working directory.

use crate::error::{RedGreenError, Result};
use crate::process::{CommandSpec, ProcessRunner};
use crate::results::{parse, FrameworkKind, TestRunResult};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which tests of a project to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSelection {
    All,
    Class(String),
    Method { class: String, method: String },
}

impl TestSelection {
    /// Framework-specific filter expression, `None` for [`TestSelection::All`].
    #[must_use]
    pub fn filter(&self, framework: FrameworkKind) -> Option<String> {
        let (class, method) = match self {
            TestSelection::All => return None,
            TestSelection::Class(class) => (class.as_str(), None),
            TestSelection::Method { class, method } => (class.as_str(), Some(method.as_str())),
        };

        let filter = match (framework, method) {
            (kind, None) if kind.is_dotnet() => format!("FullyQualifiedName~{class}"),
            (kind, Some(m)) if kind.is_dotnet() => format!("FullyQualifiedName~{class}.{m}"),
            (FrameworkKind::Jest, Some(m)) => format!("{class}.*{m}"),
            (FrameworkKind::Pytest, Some(m)) => format!("{class} and {m}"),
            (_, Some(m)) => format!("{class}.{m}"),
            (_, None) => class.to_string(),
        };
        Some(filter)
    }
}

/// Runs a project's tests and reports a normalized result.
///
/// Implementations never fail: problems are reported through
/// [`TestRunResult::error_message`].
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run the selected tests of `project`.
    async fn run(&self, project: &Path, selection: &TestSelection) -> TestRunResult;

    /// Run every test in the project.
    async fn run_tests(&self, project: &Path) -> TestRunResult {
        self.run(project, &TestSelection::All).await
    }

    /// Run one test class.
    async fn run_test_class(&self, project: &Path, class: &str) -> TestRunResult {
        self.run(project, &TestSelection::Class(class.to_string()))
            .await
    }

    /// Run one test method.
    async fn run_test_method(&self, project: &Path, class: &str, method: &str) -> TestRunResult {
        let selection = TestSelection::Method {
            class: class.to_string(),
            method: method.to_string(),
        };
        self.run(project, &selection).await
    }
}

/// Files inspected when the project reference is a directory.
const PROJECT_MARKERS: &[&str] = &[
    "package.json",
    "pytest.ini",
    "pyproject.toml",
    "setup.cfg",
    "tox.ini",
    "requirements.txt",
];

fn is_dotnet_project_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("csproj" | "fsproj" | "vbproj")
    )
}

/// Detect the framework of a project file or directory.
///
/// A file is read and searched directly. For a directory, .NET project files
/// and the [`PROJECT_MARKERS`] found directly inside it are searched in
/// name order; the first non-`Unknown` answer wins.
#[must_use]
pub fn detect_project_framework(project: &Path) -> FrameworkKind {
    if project.is_file() {
        return FrameworkKind::detect_from_path(project);
    }

    let Ok(entries) = std::fs::read_dir(project) else {
        return FrameworkKind::Unknown;
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && (is_dotnet_project_file(path)
                    || path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| PROJECT_MARKERS.contains(&n)))
        })
        .collect();
    candidates.sort();

    candidates
        .iter()
        .map(|path| FrameworkKind::detect_from_path(path))
        .find(|kind| *kind != FrameworkKind::Unknown)
        .unwrap_or(FrameworkKind::Unknown)
}

/// Directory the launcher runs in: the project's parent for a project file,
/// the project itself for a directory.
#[must_use]
pub fn project_dir(project: &Path) -> PathBuf {
    if project.is_dir() {
        return project.to_path_buf();
    }
    match project.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Build the launcher command for a framework.
///
/// # Errors
///
/// Returns [`RedGreenError::UnsupportedFramework`] for
/// [`FrameworkKind::Unknown`], or an IO error if the project path cannot
/// be made absolute.
pub fn build_command(
    framework: FrameworkKind,
    project: &Path,
    filter: Option<&str>,
) -> Result<CommandSpec> {
    let project = std::path::absolute(project)?;
    let dir = project_dir(&project);

    let spec = match framework {
        FrameworkKind::XUnit | FrameworkKind::NUnit | FrameworkKind::MsTest => {
            let mut spec = CommandSpec::new("dotnet")
                .arg("test")
                .arg(project.display().to_string())
                .args(["--verbosity", "normal"]);
            if let Some(filter) = filter {
                spec = spec.args(["--filter", filter]);
            }
            spec
        }
        FrameworkKind::Jest => {
            let mut spec = CommandSpec::new(npm_program()).arg("test");
            if let Some(filter) = filter {
                spec = spec.args(["--".to_string(), format!("--testNamePattern={filter}")]);
            }
            spec
        }
        FrameworkKind::Pytest => {
            let mut spec = CommandSpec::new("pytest").arg(".");
            if let Some(filter) = filter {
                spec = spec.args(["-k", filter]);
            }
            spec
        }
        FrameworkKind::Unknown => {
            return Err(RedGreenError::UnsupportedFramework {
                framework: framework.to_string(),
            })
        }
    };

    Ok(spec.current_dir(dir))
}

fn npm_program() -> &'static str {
    if cfg!(windows) {
        "npm.cmd"
    } else {
        "npm"
    }
}

/// [`TestRunner`] that launches the framework's own command-line tool.
///
/// # Example
///
/// ```rust,ignore
/// use redgreen::runner::{CommandTestRunner, TestRunner};
/// use std::path::Path;
///
/// let runner = CommandTestRunner::new();
/// let result = runner.run_tests(Path::new("tests/App.Tests.csproj")).await;
/// println!("{}", result.summary());
/// ```
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    runner: ProcessRunner,
    timeout: Duration,
    framework: Option<FrameworkKind>,
    fallback: FrameworkKind,
}

impl Default for CommandTestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTestRunner {
    /// Create a runner with the default 120 second budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: ProcessRunner::new(),
            timeout: Duration::from_secs(120),
            framework: None,
            fallback: FrameworkKind::Unknown,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip detection and always use `framework`.
    #[must_use]
    pub fn with_framework(mut self, framework: FrameworkKind) -> Self {
        self.framework = Some(framework);
        self
    }

    /// Use `framework` when detection finds nothing in the project.
    #[must_use]
    pub fn with_fallback(mut self, framework: FrameworkKind) -> Self {
        self.fallback = framework;
        self
    }

    /// Framework used for `project`: the override, else detection, else
    /// the fallback.
    #[must_use]
    pub fn framework_for(&self, project: &Path) -> FrameworkKind {
        if let Some(framework) = self.framework {
            return framework;
        }
        match detect_project_framework(project) {
            FrameworkKind::Unknown => self.fallback,
            detected => detected,
        }
    }
}

#[async_trait]
impl TestRunner for CommandTestRunner {
    async fn run(&self, project: &Path, selection: &TestSelection) -> TestRunResult {
        let started_at = Utc::now();
        let framework = self.framework_for(project);
        let filter = selection.filter(framework);

        let outcome = match build_command(framework, project, filter.as_deref()) {
            Ok(spec) => {
                debug!(project = %project.display(), %framework, command = %spec.display(), "Running tests");
                self.runner.run(&spec, self.timeout).await
            }
            Err(e) => Err(e),
        };

        let mut result = match outcome {
            Ok(outcome) => parse(&outcome.combined(), framework),
            Err(e) => {
                warn!(
                    project = %project.display(),
                    error = %e,
                    process = e.is_process_error(),
                    "Test run failed"
                );
                TestRunResult::errored(framework, e.to_string())
            }
        };

        result.project_path = Some(project.to_path_buf());
        result.started_at = Some(started_at);
        result.ended_at = Some(Utc::now());

        info!(project = %project.display(), "{}", result.summary());
        result
    }
}
