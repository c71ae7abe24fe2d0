//! Suggestion provider abstraction.
//!
//! The TDD orchestrator and the health monitor talk to the AI-assisted
//! suggestion backend only through [`SuggestionProvider`]. The trait never
//! returns errors: an unavailable provider answers `None` / `false`, and the
//! callers treat that as "no suggestion".
//!
//! - [`CliSuggestionProvider`] drives a suggestion CLI as a subprocess
//! - [`MockSuggestionProvider`](crate::testing::MockSuggestionProvider) scripts responses in tests
//!
//! # Example
//!
//! ```rust,ignore
//! use redgreen::provider::{CliSuggestionProvider, SuggestionProvider};
//!
//! let provider = CliSuggestionProvider::discover();
//! if provider.test_connection().await {
//!     let text = provider.get_suggestion(context, "fn add(", "calc.rs").await;
//! }
//! ```

mod cli;

pub use cli::{CliSuggestionProvider, ProviderCommand};

use crate::language::Language;
use async_trait::async_trait;
use std::path::Path;

/// Source of code completions and free-form analysis text.
///
/// Implementations must be `Send + Sync` so a single provider can be shared
/// through an `Arc` by the orchestrator and the health monitor.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Ask for a suggestion.
    ///
    /// * `context` - surrounding source text (may be empty)
    /// * `current_fragment` - the line or prompt to complete
    /// * `file_hint` - a file name whose extension names the language
    ///
    /// Returns `None` when the provider is unavailable or answered nothing.
    async fn get_suggestion(
        &self,
        context: &str,
        current_fragment: &str,
        file_hint: &str,
    ) -> Option<String>;

    /// Cheap liveness check used by the health monitor.
    async fn test_connection(&self) -> bool;

    /// Human-readable provider name for logs.
    fn name(&self) -> &str {
        "suggestion-provider"
    }
}

/// Language name for a file hint, used in completion prompts.
#[must_use]
pub fn language_for_hint(file_hint: &str) -> String {
    let ext = Path::new(file_hint)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if let Some(lang) = Language::from_extension(&ext) {
        return lang.to_string();
    }

    match ext.as_str() {
        "xml" => "XML",
        "json" => "JSON",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        _ => "code",
    }
    .to_string()
}

/// Keep the trailing lines of `context` that fit in `max_chars`.
///
/// Blank lines are dropped. Context already within budget is returned as is.
#[must_use]
pub fn truncate_context(context: &str, max_chars: usize) -> String {
    if context.chars().count() <= max_chars {
        return context.to_string();
    }

    let mut kept = Vec::new();
    let mut used = 0;
    for line in context.lines().rev().filter(|l| !l.trim().is_empty()) {
        let len = line.chars().count();
        if used + len > max_chars {
            break;
        }
        kept.push(line);
        used += len;
    }
    kept.reverse();

    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Build the completion prompt sent to the provider.
#[must_use]
pub fn build_completion_prompt(
    context: &str,
    current_fragment: &str,
    file_hint: &str,
    max_context_chars: usize,
) -> String {
    format!(
        "Complete the following {language} code:\n\n\
         File: {file_hint}\n\n\
         Context:\n{context}\n\n\
         Current line to complete:\n{current_fragment}\n\n\
         Provide only the code completion, without explanations.",
        language = language_for_hint(file_hint),
        context = truncate_context(context, max_context_chars),
    )
}

fn is_chatter(line: &str) -> bool {
    let lower = line.to_lowercase();
    line.starts_with('#')
        || line.starts_with("//")
        || lower.contains("here")
        || lower.contains("completion")
}

/// Extract the useful part of raw provider output.
///
/// The first fenced block wins. Otherwise leading comment and chatter lines
/// ("Here is the completion:") are dropped and the rest is returned. Output
/// made only of chatter is returned unchanged.
#[must_use]
pub fn parse_suggestion(output: &str) -> Option<String> {
    let output = output.trim();
    if output.is_empty() {
        return None;
    }

    if let Some(open) = output.find("```") {
        if let Some(newline) = output[open..].find('\n') {
            let code_start = open + newline + 1;
            if let Some(close) = output[code_start..].find("```") {
                let code = output[code_start..code_start + close].trim();
                if !code.is_empty() {
                    return Some(code.to_string());
                }
            }
        }
    }

    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    match lines.iter().position(|l| !is_chatter(l)) {
        Some(first) => Some(
            lines[first..]
                .iter()
                .map(|l| l.trim_end())
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string(),
        ),
        None => Some(output.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_for_hint() {
        assert_eq!(language_for_hint("test.cs"), "C#");
        assert_eq!(language_for_hint("Main.java"), "Java");
        assert_eq!(language_for_hint("index.HTM"), "HTML");
        assert_eq!(language_for_hint("notes.txt"), "code");
        assert_eq!(language_for_hint("Makefile"), "code");
    }

    #[test]
    fn test_truncate_context_within_budget() {
        assert_eq!(truncate_context("a\n\nb", 10), "a\n\nb");
        assert_eq!(truncate_context("", 10), "");
    }

    #[test]
    fn test_truncate_context_keeps_tail() {
        let context = "first line\n\nsecond line\nthird";
        let truncated = truncate_context(context, 20);
        assert_eq!(truncated, "second line\nthird\n");
    }

    #[test]
    fn test_truncate_context_single_long_line() {
        assert_eq!(truncate_context(&"x".repeat(50), 10), "");
    }

    #[test]
    fn test_build_completion_prompt() {
        let prompt = build_completion_prompt("int a = 1;", "int b =", "Calc.cs", 1000);
        assert!(prompt.starts_with("Complete the following C# code:"));
        assert!(prompt.contains("File: Calc.cs"));
        assert!(prompt.contains("Context:\nint a = 1;"));
        assert!(prompt.contains("Current line to complete:\nint b ="));
        assert!(prompt.ends_with("without explanations."));
    }

    #[test]
    fn test_parse_suggestion_empty() {
        assert_eq!(parse_suggestion(""), None);
        assert_eq!(parse_suggestion("  \n \n"), None);
    }

    #[test]
    fn test_parse_suggestion_code_fence() {
        let output = "Here you go:\n```csharp\nreturn a + b;\n```\nDone.";
        assert_eq!(parse_suggestion(output).as_deref(), Some("return a + b;"));
    }

    #[test]
    fn test_parse_suggestion_skips_chatter() {
        let output = "// completion follows\nHere is the code:\nreturn a + b;\n}";
        assert_eq!(parse_suggestion(output).as_deref(), Some("return a + b;\n}"));
    }

    #[test]
    fn test_parse_suggestion_only_chatter() {
        let output = "# nothing here";
        assert_eq!(parse_suggestion(output).as_deref(), Some("# nothing here"));
    }

    #[test]
    fn test_parse_suggestion_unclosed_fence_falls_back() {
        let output = "```rust\nlet x = 1;";
        assert_eq!(parse_suggestion(output).as_deref(), Some("```rust\nlet x = 1;"));
    }
}
