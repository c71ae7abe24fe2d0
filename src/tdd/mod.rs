//! The red-green loop.
//!
//! [`TddOrchestrator`] drives one or more cycles of:
//!
//! 1. generate tests for the source (when none were supplied)
//! 2. run the project's tests through a [`TestRunner`]
//! 3. ask the [`SuggestionProvider`] for a diagnosis of every failure
//! 4. append the proposed fixes to the working copy
//!
//! The orchestrator never edits files. The project on disk is what gets
//! tested; the working copy it returns is a proposal for the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! let orchestrator = TddOrchestrator::new(provider, runner);
//! let outcome = orchestrator
//!     .run_iterative(source, "", Path::new("Calc.Tests.csproj"), Language::CSharp, 5)
//!     .await;
//! println!("{}", outcome.message);
//! ```

pub mod analysis;
pub mod prompts;

use crate::language::Language;
use crate::provider::SuggestionProvider;
use crate::results::{TestFailure, TestRunResult};
use crate::runner::TestRunner;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use analysis::{apply_fixes, parse_refactorings, strip_code_fences};

/// Diagnosis of one failing test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub test_name: String,
    pub root_cause: String,
    /// Replacement code; may be empty when only an explanation came back.
    pub proposed_fix: String,
    pub explanation: String,
}

impl FixSuggestion {
    /// Whether the suggestion carries code that can be applied.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        !self.proposed_fix.trim().is_empty()
    }
}

/// Outcome of a single generate/run/analyze pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TddCycleResult {
    /// Test code used for the run, generated or supplied.
    pub generated_tests: String,
    pub test_results: TestRunResult,
    pub suggested_fixes: Vec<FixSuggestion>,
}

impl TddCycleResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.test_results.succeeded()
    }
}

/// Outcome of the bounded loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterativeTddResult {
    pub succeeded: bool,
    /// Every cycle that ran, in order.
    pub iterations: Vec<TddCycleResult>,
    /// Working copy with all applied fixes.
    pub final_code: String,
    pub message: String,
}

/// Broad category of a refactoring suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefactoringKind {
    ExtractMethod,
    Rename,
    RemoveDuplication,
    ApplyPattern,
    SimplifyLogic,
    Other,
}

/// One refactoring proposed for code whose tests pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringSuggestion {
    pub description: String,
    pub kind: RefactoringKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_code: Option<String>,
}

/// Drives the TDD loop over a provider and a test backend.
pub struct TddOrchestrator {
    provider: Arc<dyn SuggestionProvider>,
    runner: Arc<dyn TestRunner>,
}

impl TddOrchestrator {
    #[must_use]
    pub fn new(provider: Arc<dyn SuggestionProvider>, runner: Arc<dyn TestRunner>) -> Self {
        Self { provider, runner }
    }

    async fn ask(&self, prompt: &str, stem: &str, language: Language) -> Option<String> {
        let hint = prompts::file_hint(stem, language);
        let answer = self.provider.get_suggestion("", prompt, &hint).await;
        if answer.is_none() {
            debug!(provider = self.provider.name(), hint = %hint, "No answer from provider");
        }
        answer
    }

    /// Ask the provider for a test suite covering `source`.
    ///
    /// Returns an empty string when the provider has nothing to offer.
    pub async fn generate_tests(&self, source: &str, language: Language) -> String {
        let target = prompts::target_identifier(source);
        let prompt = prompts::test_generation(source, &target, language);

        match self.ask(&prompt, "test", language).await {
            Some(text) => strip_code_fences(&text),
            None => {
                warn!(unit = %target, "Test generation returned nothing");
                String::new()
            }
        }
    }

    /// Ask for tests of a single method.
    pub async fn generate_method_test(
        &self,
        method_code: &str,
        method_name: &str,
        language: Language,
    ) -> String {
        let prompt = prompts::method_test(method_code, method_name, language);
        self.ask(&prompt, "test", language)
            .await
            .map(|text| strip_code_fences(&text))
            .unwrap_or_default()
    }

    /// Request a diagnosis for each failure, in order.
    ///
    /// Failures the provider cannot answer are skipped.
    pub async fn analyze_failures(
        &self,
        source: &str,
        failures: &[TestFailure],
        language: Language,
    ) -> Vec<FixSuggestion> {
        let mut fixes = Vec::with_capacity(failures.len());
        for failure in failures {
            let prompt = prompts::fix_analysis(source, failure, language);
            match self.ask(&prompt, "fix", language).await {
                Some(text) => fixes.push(analysis::fix_from_analysis(&failure.name, &text)),
                None => debug!(test = %failure.name, "No fix suggestion"),
            }
        }
        fixes
    }

    /// One generate/run/analyze pass.
    pub async fn run_cycle(
        &self,
        source: &str,
        test_code: &str,
        project: &Path,
        language: Language,
    ) -> TddCycleResult {
        let generated_tests = if test_code.trim().is_empty() {
            self.generate_tests(source, language).await
        } else {
            test_code.to_string()
        };

        let test_results = self.runner.run_tests(project).await;
        info!(summary = %test_results.summary(), "Cycle test run finished");

        let suggested_fixes = if test_results.failures.is_empty() {
            Vec::new()
        } else {
            self.analyze_failures(source, &test_results.failures, language)
                .await
        };

        TddCycleResult {
            generated_tests,
            test_results,
            suggested_fixes,
        }
    }

    /// Repeat cycles until the tests pass, no progress is possible, or
    /// `max_iterations` cycles have run.
    pub async fn run_iterative(
        &self,
        source: &str,
        test_code: &str,
        project: &Path,
        language: Language,
        max_iterations: u32,
    ) -> IterativeTddResult {
        let mut working = source.to_string();
        let mut tests = test_code.to_string();
        let mut iterations: Vec<TddCycleResult> = Vec::new();

        for i in 1..=max_iterations {
            debug!(iteration = i, max_iterations, "Starting TDD cycle");
            let cycle = self.run_cycle(&working, &tests, project, language).await;

            if cycle.succeeded() {
                iterations.push(cycle);
                info!(iterations = i, "All tests passed");
                return IterativeTddResult {
                    succeeded: true,
                    iterations,
                    final_code: working,
                    message: format!("All tests passed after {i} iteration(s)"),
                };
            }

            if tests.trim().is_empty() && cycle.generated_tests.trim().is_empty() {
                iterations.push(cycle);
                warn!(iterations = i, "No tests could be generated; stopping");
                return IterativeTddResult {
                    succeeded: false,
                    iterations,
                    final_code: working,
                    message: format!("No tests could be generated after {i} iteration(s)"),
                };
            }

            if let Some(err) = cycle.test_results.error_message.clone() {
                iterations.push(cycle);
                warn!(error = %err, "Test run failed; stopping");
                return IterativeTddResult {
                    succeeded: false,
                    iterations,
                    final_code: working,
                    message: format!("Test run failed: {err}"),
                };
            }

            if cycle.suggested_fixes.is_empty() {
                iterations.push(cycle);
                warn!(iterations = i, "No fix suggestions; stopping");
                return IterativeTddResult {
                    succeeded: false,
                    iterations,
                    final_code: working,
                    message: format!("No fix suggestions available after {i} iteration(s)"),
                };
            }

            if !cycle.suggested_fixes.iter().any(FixSuggestion::is_actionable) {
                iterations.push(cycle);
                warn!(iterations = i, "Suggestions carried no code; stopping");
                return IterativeTddResult {
                    succeeded: false,
                    iterations,
                    final_code: working,
                    message: format!("No applicable fixes after {i} iteration(s)"),
                };
            }

            working = apply_fixes(&working, &cycle.suggested_fixes, language);
            if tests.trim().is_empty() {
                tests = cycle.generated_tests.clone();
            }
            iterations.push(cycle);
        }

        IterativeTddResult {
            succeeded: false,
            iterations,
            final_code: working,
            message: format!("Tests still failing after {max_iterations} iterations"),
        }
    }

    /// Ask for refactorings that keep `test_code` passing.
    pub async fn suggest_refactorings(
        &self,
        source: &str,
        test_code: &str,
        language: Language,
    ) -> Vec<RefactoringSuggestion> {
        let prompt = prompts::refactoring(source, test_code, language);
        match self.ask(&prompt, "refactor", language).await {
            Some(text) => parse_refactorings(&text),
            None => Vec::new(),
        }
    }
}
