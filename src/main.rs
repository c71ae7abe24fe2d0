//! redgreen - Test-Driven Development Loop Automation
//!
//! Command-line front end for the result normalizer, the test backend, the
//! TDD loop and the provider health monitor.

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use redgreen::config::MAX_ITERATIONS_LIMIT;
use redgreen::health::{HealthEvent, ProcessKillRecovery};
use redgreen::runner::{detect_project_framework, project_dir};
use redgreen::tdd::TddCycleResult;
use redgreen::{
    CliSuggestionProvider, CommandTestRunner, FrameworkKind, HealthConfig, HealthMonitor,
    HealthState, Language, ProjectConfig, RedGreenError, TddOrchestrator, TestRunResult,
    TestRunner, TestSelection,
};

#[derive(Parser)]
#[command(name = "redgreen")]
#[command(version)]
#[command(about = "Test-driven development loop automation - generate, run, diagnose, fix, repeat", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory or project file (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Suggestion provider command line (overrides settings and discovery)
    #[arg(long, global = true, env = "REDGREEN_PROVIDER")]
    provider: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize captured test runner output
    Parse {
        /// File holding the raw output ("-" reads stdin)
        file: PathBuf,

        /// Framework that produced the output
        #[arg(short, long)]
        framework: FrameworkKind,

        /// Print the normalized result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect the test framework of the project
    Detect,

    /// Run the project's tests and report normalized results
    Run {
        /// Only run tests in this class
        #[arg(long)]
        class: Option<String>,

        /// Only run this method (requires --class)
        #[arg(long, requires = "class")]
        method: Option<String>,

        /// Skip detection and use this framework
        #[arg(short, long)]
        framework: Option<FrameworkKind>,

        /// Run timeout in seconds (overrides settings)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one generate/run/analyze cycle
    Cycle {
        /// Source file under test
        source: PathBuf,

        /// Existing test code (generated when omitted)
        #[arg(short, long)]
        tests: Option<PathBuf>,

        /// Source language (inferred from the file extension when omitted)
        #[arg(short, long)]
        language: Option<Language>,

        /// Print the cycle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Repeat cycles until the tests pass or progress stops
    Iterate {
        /// Source file under test
        source: PathBuf,

        /// Existing test code (generated when omitted)
        #[arg(short, long)]
        tests: Option<PathBuf>,

        /// Source language (inferred from the file extension when omitted)
        #[arg(short, long)]
        language: Option<Language>,

        /// Maximum cycles (overrides settings)
        #[arg(short, long)]
        max_iterations: Option<u32>,

        /// Write the final working copy here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the suggestion provider, once or continuously
    Health {
        /// Keep monitoring and print every event until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Probe interval in seconds (overrides settings)
        #[arg(long)]
        interval: Option<u64>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Report out-of-range settings
    Validate,
    /// Print the settings file locations
    Paths,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "redgreen=debug,info"
    } else {
        "redgreen=info,warn"
    };

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match dispatch(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn dispatch(cli: Cli) -> redgreen::Result<i32> {
    let project = cli.project.canonicalize().unwrap_or(cli.project.clone());

    if !project.exists() {
        return Err(RedGreenError::invalid(
            "project",
            format!("{} does not exist", project.display()),
        ));
    }

    let config_dir = project_dir(&project);
    let config = ProjectConfig::load(&config_dir)?
        .normalized()
        .with_provider_path(cli.provider.clone());

    match cli.command {
        Commands::Parse {
            file,
            framework,
            json,
        } => {
            let raw = read_input(&file)?;
            let result = redgreen::results::parse(&raw, framework);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_run(&result);
            }
            Ok(run_exit_code(&result))
        }

        Commands::Detect => {
            let framework = detect_project_framework(&project);
            if framework == FrameworkKind::Unknown {
                println!(
                    "{} No supported test framework found in {}",
                    "Warning:".yellow().bold(),
                    project.display()
                );
                return Ok(1);
            }
            println!("{}", framework);
            Ok(0)
        }

        Commands::Run {
            class,
            method,
            framework,
            timeout,
            json,
        } => {
            let mut runner = CommandTestRunner::new().with_timeout(
                timeout.map_or_else(|| config.runner.timeout(), Duration::from_secs),
            );
            if let Some(framework) = framework {
                runner = runner.with_framework(framework);
            }

            let selection = match (class, method) {
                (Some(class), Some(method)) => TestSelection::Method { class, method },
                (Some(class), None) => TestSelection::Class(class),
                _ => TestSelection::All,
            };

            let bar = spinner(
                &format!("Running {} tests...", runner.framework_for(&project)),
                json,
            );
            let result = runner.run(&project, &selection).await;
            bar.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_run(&result);
            }
            Ok(run_exit_code(&result))
        }

        Commands::Cycle {
            source,
            tests,
            language,
            json,
        } => {
            let language = resolve_language(&source, language)?;
            let code = std::fs::read_to_string(&source)?;
            let test_code = read_optional(tests.as_deref())?;
            let orchestrator = orchestrator(&config, language);

            let bar = spinner("Running TDD cycle...", json);
            let cycle = orchestrator
                .run_cycle(&code, &test_code, &project, language)
                .await;
            bar.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&cycle)?);
            } else {
                print_cycle(&cycle, test_code.trim().is_empty());
            }
            Ok(if cycle.succeeded() { 0 } else { 1 })
        }

        Commands::Iterate {
            source,
            tests,
            language,
            max_iterations,
            output,
            json,
        } => {
            let language = resolve_language(&source, language)?;
            let code = std::fs::read_to_string(&source)?;
            let test_code = read_optional(tests.as_deref())?;
            let max = max_iterations
                .unwrap_or(config.tdd.max_iterations)
                .min(MAX_ITERATIONS_LIMIT);
            let orchestrator = orchestrator(&config, language);

            let bar = spinner(&format!("Iterating (up to {max} cycles)..."), json);
            let outcome = orchestrator
                .run_iterative(&code, &test_code, &project, language, max)
                .await;
            bar.finish_and_clear();

            if let Some(ref path) = output {
                std::fs::write(path, &outcome.final_code)?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                for (i, cycle) in outcome.iterations.iter().enumerate() {
                    println!("\n{} {}", "Iteration".cyan().bold(), i + 1);
                    println!("{}", "─".repeat(40));
                    print_cycle(cycle, false);
                }
                println!();
                if outcome.succeeded {
                    println!("{} {}", "OK".green().bold(), outcome.message);
                } else {
                    println!("{} {}", "FAILED".red().bold(), outcome.message);
                }
                if let Some(path) = output {
                    println!("   Working copy written to {}", path.display());
                }
            }
            Ok(if outcome.succeeded { 0 } else { 1 })
        }

        Commands::Health {
            watch,
            interval,
            json,
        } => {
            let mut health_config = HealthConfig::from(&config.health);
            if let Some(secs) = interval {
                health_config.interval = Duration::from_secs(secs.max(1));
            }

            let provider = Arc::new(CliSuggestionProvider::from_config(&config.provider));
            let recovery = Arc::new(ProcessKillRecovery::new(
                config.health.process_names.clone(),
            ));
            let monitor = HealthMonitor::new(provider.clone(), health_config)
                .with_recovery(recovery);

            if watch {
                watch_health(&monitor, json).await?;
                return Ok(0);
            }

            let bar = spinner(&format!("Probing {}...", provider.command()), json);
            let state = monitor.check_now().await;
            bar.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&monitor.snapshot())?);
            } else {
                print_health(state, monitor.consecutive_failures());
            }
            if state == HealthState::Healthy {
                Ok(0)
            } else {
                Err(RedGreenError::provider(
                    state.message(monitor.consecutive_failures()),
                ))
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(0)
            }
            ConfigAction::Validate => {
                let settings = ProjectConfig::settings_path(&config_dir);
                let raw = ProjectConfig::load(&config_dir)?;
                let problems = raw.validate();
                if problems.is_empty() {
                    println!("{} Configuration is valid", "OK".green().bold());
                    return Ok(0);
                }
                for problem in &problems {
                    println!("   {} {}", "-".red(), problem);
                }
                Err(RedGreenError::config_with_path(
                    format!("{} configuration problem(s)", problems.len()),
                    settings,
                ))
            }
            ConfigAction::Paths => {
                println!(
                    "Project settings: {}",
                    ProjectConfig::settings_path(&config_dir).display()
                );
                match ProjectConfig::user_config_dir() {
                    Some(dir) => println!("User config dir:  {}", dir.display()),
                    None => println!("User config dir:  (unavailable)"),
                }
                Ok(0)
            }
        },
    }
}

/// Build the TDD loop. A project with no detectable framework falls back
/// to the source language's usual one.
fn orchestrator(config: &ProjectConfig, language: Language) -> TddOrchestrator {
    let provider = Arc::new(CliSuggestionProvider::from_config(&config.provider));
    let runner = Arc::new(
        CommandTestRunner::new()
            .with_timeout(config.runner.timeout())
            .with_fallback(language.framework_kind()),
    );
    TddOrchestrator::new(provider, runner)
}

fn resolve_language(source: &Path, explicit: Option<Language>) -> redgreen::Result<Language> {
    if let Some(language) = explicit {
        return Ok(language);
    }
    source
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
        .ok_or_else(|| {
            RedGreenError::invalid(
                "language",
                format!("cannot infer from {}; pass --language", source.display()),
            )
        })
}

fn read_input(path: &Path) -> redgreen::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn read_optional(path: Option<&Path>) -> redgreen::Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(String::new()),
    }
}

fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn run_exit_code(result: &TestRunResult) -> i32 {
    if result.succeeded() {
        0
    } else {
        1
    }
}

fn print_run(result: &TestRunResult) {
    if let Some(ref error) = result.error_message {
        println!("{} {}", "Run failed:".red().bold(), error);
        return;
    }

    let failed = result.failures.len();
    let status = if failed == 0 {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{} {} - {} total, {} passed, {} failed, {} skipped",
        status,
        result.framework,
        result.total,
        result.passed.to_string().green(),
        failed.to_string().red(),
        result.skipped.to_string().yellow()
    );
    if let Some(duration) = result.duration() {
        println!("   Duration: {:.2}s", duration.as_secs_f64());
    }

    for failure in &result.failures {
        println!("\n   {} {}", "✗".red(), failure.name.bold());
        if !failure.error_message.is_empty() {
            println!("     {}", failure.error_message);
        }
        if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
            println!("     Expected: {}", expected.green());
            println!("     Actual:   {}", actual.red());
        }
    }
}

fn print_cycle(cycle: &TddCycleResult, show_generated: bool) {
    if show_generated && !cycle.generated_tests.is_empty() {
        println!("{}", "Generated tests:".cyan().bold());
        println!("{}", cycle.generated_tests);
        println!("{}", "─".repeat(40));
    }

    print_run(&cycle.test_results);

    for fix in &cycle.suggested_fixes {
        println!("\n   {} {}", "Fix for".yellow().bold(), fix.test_name);
        println!("     Root cause: {}", fix.root_cause);
        if fix.is_actionable() {
            for line in fix.proposed_fix.lines() {
                println!("     {}", line.dimmed());
            }
        }
    }
}

fn print_health(state: HealthState, failures: u32) {
    let label = match state {
        HealthState::Healthy => state.to_string().green().bold(),
        HealthState::Degraded | HealthState::Restarting => state.to_string().yellow().bold(),
        HealthState::Failed => state.to_string().red().bold(),
        HealthState::Unknown => state.to_string().dimmed(),
    };
    println!("{} {}", label, state.message(failures));
}

async fn watch_health(monitor: &HealthMonitor, json: bool) -> redgreen::Result<()> {
    let mut events = monitor.subscribe();
    monitor.start();
    if !json {
        println!(
            "{} Monitoring every {}s (Ctrl-C to stop)",
            "Health:".cyan().bold(),
            monitor.config().interval.as_secs()
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) if json => println!("{}", serde_json::to_string(&event)?),
                Ok(HealthEvent::StatusChanged(change)) => {
                    print_health(change.state, change.consecutive_failures);
                }
                Ok(HealthEvent::RestartAttempted { outcome }) => {
                    println!("   {} {}", "Restart:".yellow(), outcome);
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Dropped health events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    monitor.stop();
    Ok(())
}
