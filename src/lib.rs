//! redgreen - Test-Driven Development Loop Automation
//!
//! Automates the red-green cycle against an external code-suggestion
//! provider: generate tests, run them with the project's own toolchain,
//! normalize the results, ask for fixes, and try again.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`process`] - Bounded external command execution with output capture
//! - [`results`] - Normalization of xUnit, NUnit, MSTest, Jest and pytest output
//! - [`runner`] - Framework detection and the test backend
//! - [`provider`] - Suggestion provider trait and the CLI-backed provider
//! - [`tdd`] - The generate/run/analyze/fix loop
//! - [`health`] - Provider liveness monitoring with automatic recovery
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures, assertions)
//!
//! # Example
//!
//! ```rust,ignore
//! use redgreen::{CliSuggestionProvider, CommandTestRunner, Language, ProjectConfig, TddOrchestrator};
//! use std::sync::Arc;
//!
//! let config = ProjectConfig::load(".")?;
//! let provider = Arc::new(CliSuggestionProvider::from_config(&config.provider));
//! let runner = Arc::new(CommandTestRunner::new().with_timeout(config.runner.timeout()));
//!
//! let orchestrator = TddOrchestrator::new(provider, runner);
//! let outcome = orchestrator
//!     .run_iterative(&source, "", project, Language::CSharp, config.tdd.max_iterations)
//!     .await;
//! println!("{}", outcome.message);
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod language;
pub mod process;
pub mod provider;
pub mod results;
pub mod runner;
pub mod tdd;
pub mod testing;

pub use config::ProjectConfig;
pub use error::{RedGreenError, Result};
pub use health::{HealthConfig, HealthEvent, HealthMonitor, HealthState};
pub use language::{Language, ParseLanguageError};
pub use process::{CommandSpec, ProcessRunner, RunOutcome};
pub use provider::{CliSuggestionProvider, SuggestionProvider};
pub use results::{FrameworkKind, TestFailure, TestRunResult};
pub use runner::{CommandTestRunner, TestRunner, TestSelection};
pub use tdd::{FixSuggestion, IterativeTddResult, TddCycleResult, TddOrchestrator};
