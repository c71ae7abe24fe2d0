//! Bounded external process execution.
//!
//! [`ProcessRunner`] launches a command, drains stdout and stderr
//! concurrently, and races both drains plus the exit wait against a
//! wall-clock timeout.
//!
//! ```text
//! spawn ──► ┌ read stdout ┐
//!           │             ├─ join ─► wait ─► RunOutcome
//!           └ read stderr ┘
//!      timeout fires first ─► kill tree + reap ─► RedGreenError::Timeout
//! ```
//!
//! Both pipes must be read at the same time. A child that fills the stderr
//! pipe while only stdout is being read blocks forever.
//!
//! On Unix every child leads its own process group, so a timeout kills the
//! whole group and not just the direct child. `dotnet test`, `npm test` and
//! shell wrappers all fork workers that would otherwise outlive the budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use redgreen::process::{CommandSpec, ProcessRunner};
//! use std::time::Duration;
//!
//! let spec = CommandSpec::new("dotnet").args(["test", "App.Tests.csproj"]);
//! let outcome = ProcessRunner::new().run(&spec, Duration::from_secs(120)).await?;
//! println!("exit {}: {}", outcome.exit_code, outcome.combined());
//! ```

use crate::error::{RedGreenError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

/// Timeout applied to each process-kill helper invocation.
const KILL_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Description of an external command to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed verbatim (no shell quoting is applied).
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`.
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for the given program with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Render the command line for logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Output of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Everything written to standard output.
    pub stdout: String,
    /// Everything written to standard error.
    pub stderr: String,
    /// Exit code, or -1 when the process was terminated by a signal.
    pub exit_code: i32,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
}

impl RunOutcome {
    /// Whether the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, separated by a newline.
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Launches external commands with a bounded time budget.
///
/// Stateless and cheap to clone; one instance can be shared by the test
/// backend, the suggestion provider and the health monitor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run a command to completion or until `timeout` elapses.
    ///
    /// A non-zero exit code is returned as a normal [`RunOutcome`].
    ///
    /// # Errors
    ///
    /// - [`RedGreenError::InvalidConfig`] if the program name is empty
    /// - [`RedGreenError::LaunchFailure`] if the process cannot be spawned
    /// - [`RedGreenError::Timeout`] if the process outlives `timeout`; the
    ///   process is killed and partial output is discarded
    pub async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<RunOutcome> {
        if spec.program.trim().is_empty() {
            return Err(RedGreenError::invalid("program", "command program is empty"));
        }

        let mut command = AsyncCommand::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = spec.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        debug!(command = %spec.display(), timeout_ms = timeout.as_millis() as u64, "Launching process");

        let start = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|e| RedGreenError::launch(&spec.program, e.to_string()))?;
        let pid = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let completion = async {
            let (out, err) = futures::future::join(drain(stdout), drain(stderr)).await;
            let status = child.wait().await;
            (out, err, status)
        };

        let finished = tokio::time::timeout(timeout, completion).await;

        match finished {
            Ok((out, err, status)) => {
                let status = status.map_err(|e| RedGreenError::launch(&spec.program, e.to_string()))?;
                let outcome = RunOutcome {
                    stdout: String::from_utf8_lossy(&out?).to_string(),
                    stderr: String::from_utf8_lossy(&err?).to_string(),
                    exit_code: status.code().unwrap_or(-1),
                    duration: start.elapsed(),
                };
                debug!(
                    command = %spec.display(),
                    exit_code = outcome.exit_code,
                    duration_ms = outcome.duration.as_millis() as u64,
                    "Process finished"
                );
                Ok(outcome)
            }
            Err(_elapsed) => {
                warn!(command = %spec.display(), "Process timed out, killing");
                if let Some(pid) = pid {
                    kill_tree(pid).await;
                }
                if let Err(e) = child.kill().await {
                    warn!(command = %spec.display(), error = %e, "Failed to kill timed out process");
                }
                Err(RedGreenError::timeout(spec.display(), timeout))
            }
        }
    }

    /// Terminate every running process whose name matches one of `names`.
    ///
    /// Best-effort: failures are logged, never returned. Returns how many of
    /// the names matched at least one process.
    pub async fn kill_by_name(&self, names: &[String]) -> usize {
        let mut matched = 0;

        for name in names {
            let spec = kill_command(name);
            match self.run(&spec, KILL_COMMAND_TIMEOUT).await {
                Ok(outcome) if outcome.success() => {
                    debug!(process = %name, "Killed matching processes");
                    matched += 1;
                }
                Ok(_) => debug!(process = %name, "No matching process"),
                Err(e) => warn!(process = %name, error = %e, "Process kill command failed"),
            }
        }

        matched
    }
}

/// Read a child pipe to EOF. A missing pipe reads as empty.
async fn drain<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill `pid` and everything it spawned. Best-effort.
async fn kill_tree(pid: u32) {
    let spec = tree_kill_command(pid);
    let mut command = AsyncCommand::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    match tokio::time::timeout(KILL_COMMAND_TIMEOUT, command.status()).await {
        Ok(Ok(status)) if status.success() => debug!(pid, "Killed process tree"),
        Ok(Ok(status)) => debug!(pid, code = status.code().unwrap_or(-1), "Process tree already gone"),
        Ok(Err(e)) => warn!(pid, error = %e, "Process tree kill failed"),
        Err(_) => warn!(pid, "Process tree kill timed out"),
    }
}

/// Platform command that kills a process group (Unix) or tree (Windows).
fn tree_kill_command(pid: u32) -> CommandSpec {
    if cfg!(windows) {
        CommandSpec::new("taskkill").args(["/T", "/F", "/PID", &pid.to_string()])
    } else {
        CommandSpec::new("kill").args(["-KILL", "--", &format!("-{pid}")])
    }
}

/// Platform command that kills processes by exact name.
fn kill_command(name: &str) -> CommandSpec {
    if cfg!(windows) {
        CommandSpec::new("taskkill").args(["/F", "/IM", &format!("{name}.exe")])
    } else {
        CommandSpec::new("pkill").args(["-x", name])
    }
}
