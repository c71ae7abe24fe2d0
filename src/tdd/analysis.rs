//! Post-processing of provider responses.
//!
//! Everything here is plain text handling: no parsing of the target
//! language, no semantic checks. Fixes are appended, never spliced.

use super::{FixSuggestion, RefactoringKind, RefactoringSuggestion};
use crate::language::Language;

/// Root cause used when the analysis is empty.
pub const UNKNOWN_CAUSE: &str = "Unknown cause";

/// Strip a markdown fence wrapper, keeping the code between the first and
/// last fence. The language tag line after the opening fence is dropped.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    if let (Some(start), Some(end)) = (text.find("```"), text.rfind("```")) {
        if end > start {
            let block = &text[start..end];
            let code = block.split_once('\n').map_or("", |(_, rest)| rest);
            return code.trim().to_string();
        }
    }
    text.trim().to_string()
}

/// First line mentioning a root cause or problem, else the first line.
#[must_use]
pub fn extract_root_cause(analysis: &str) -> String {
    if let Some(line) = analysis.lines().find(|line| {
        let lower = line.to_lowercase();
        lower.contains("root cause") || lower.contains("problem")
    }) {
        return line.trim().to_string();
    }

    match analysis.lines().next().map(str::trim) {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => UNKNOWN_CAUSE.to_string(),
    }
}

/// The proposed code: a fenced block if present, else code-looking lines.
#[must_use]
pub fn extract_code_fix(analysis: &str) -> String {
    if analysis.contains("```") {
        return strip_code_fences(analysis);
    }

    analysis
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            line.contains('(')
                || line.contains('{')
                || line.contains('=')
                || trimmed.starts_with("public")
                || trimmed.starts_with("private")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// All non-blank lines outside fence markers.
#[must_use]
pub fn extract_explanation(analysis: &str) -> String {
    analysis
        .lines()
        .filter(|line| !line.contains("```") && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a fix suggestion from a raw analysis response.
#[must_use]
pub fn fix_from_analysis(test_name: &str, analysis: &str) -> FixSuggestion {
    FixSuggestion {
        test_name: test_name.to_string(),
        root_cause: extract_root_cause(analysis),
        proposed_fix: extract_code_fix(analysis),
        explanation: extract_explanation(analysis),
    }
}

/// Append every non-empty proposed fix to `source` as a delimited block.
///
/// ```text
/// // --- Suggested fix for CalculatorTests.Add ---
/// int Add(int a, int b) { return a + b; }
/// // --- end suggested fix ---
/// ```
#[must_use]
pub fn apply_fixes(source: &str, fixes: &[FixSuggestion], language: Language) -> String {
    let marker = language.comment_prefix();
    let mut result = source.to_string();

    for fix in fixes.iter().filter(|f| f.is_actionable()) {
        result.push_str(&format!(
            "\n\n{marker} --- Suggested fix for {} ---\n{}\n{marker} --- end suggested fix ---",
            fix.test_name,
            fix.proposed_fix.trim_end()
        ));
    }

    result
}

impl RefactoringKind {
    /// Classify a suggestion by keywords in its description.
    #[must_use]
    pub fn classify(description: &str) -> Self {
        let lower = description.to_lowercase();
        if lower.contains("extract") && lower.contains("method") {
            Self::ExtractMethod
        } else if lower.contains("rename") {
            Self::Rename
        } else if lower.contains("duplicat") {
            Self::RemoveDuplication
        } else if lower.contains("pattern") {
            Self::ApplyPattern
        } else if lower.contains("simplif") || lower.contains("complex") {
            Self::SimplifyLogic
        } else {
            Self::Other
        }
    }
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim();
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ").or_else(|| line[digits..].strip_prefix(") ")) {
            return rest.trim();
        }
    }
    line
}

/// One suggestion per non-blank line; a fenced block attaches to the
/// suggestion before it as proposed code.
#[must_use]
pub fn parse_refactorings(text: &str) -> Vec<RefactoringSuggestion> {
    let mut suggestions: Vec<RefactoringSuggestion> = Vec::new();
    let mut code: Option<Vec<&str>> = None;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            match code.take() {
                Some(lines) => {
                    if let Some(last) = suggestions.last_mut() {
                        last.proposed_code = Some(lines.join("\n"));
                    }
                }
                None => code = Some(Vec::new()),
            }
            continue;
        }

        if let Some(ref mut lines) = code {
            lines.push(line);
            continue;
        }

        let description = strip_list_marker(line);
        if description.is_empty() {
            continue;
        }
        suggestions.push(RefactoringSuggestion {
            description: description.to_string(),
            kind: RefactoringKind::classify(description),
            proposed_code: None,
        });
    }

    suggestions
}
