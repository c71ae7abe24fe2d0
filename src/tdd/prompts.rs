//! Prompt text sent to the suggestion provider.

use crate::language::Language;
use crate::results::TestFailure;
use regex::Regex;

/// Identifier used when no class or function name can be found.
pub const DEFAULT_TARGET: &str = "TestClass";

/// Best-effort name of the unit under test.
///
/// Looks for a class declaration, then a function keyword (`def`, `fn`,
/// `function`, `func`), then a C-style `Type Name(...) {` signature.
#[must_use]
pub fn target_identifier(source: &str) -> String {
    const PATTERNS: &[&str] = &[
        r"\b(?:class|struct|interface)\s+([A-Za-z_]\w*)",
        r"\b(?:def|fn|function|func)\s+([A-Za-z_]\w*)",
        r"\b[A-Za-z_][\w<>\[\]]*\s+([A-Za-z_]\w*)\s*\([^)]*\)\s*\{",
    ];

    PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .find_map(|re| re.captures(source).map(|c| c[1].to_string()))
        .unwrap_or_else(|| DEFAULT_TARGET.to_string())
}

fn framework_phrase(language: Language) -> &'static str {
    language
        .test_framework()
        .unwrap_or("appropriate test framework")
}

/// Prompt asking for a full test suite for `source`.
#[must_use]
pub fn test_generation(source: &str, target: &str, language: Language) -> String {
    format!(
        "Generate comprehensive unit tests for this {language} class:\n\n\
         {source}\n\n\
         Requirements:\n\
         - Test all public methods\n\
         - Cover happy paths and edge cases\n\
         - Include error handling tests\n\
         - Use appropriate assertions\n\
         - Follow {framework} conventions\n\
         - Add descriptive test names\n\n\
         Class under test: {target}",
        framework = framework_phrase(language),
    )
}

/// Prompt asking for tests of a single method.
#[must_use]
pub fn method_test(method_code: &str, method_name: &str, language: Language) -> String {
    format!(
        "Generate a comprehensive unit test for this {language} method:\n\n\
         {method_code}\n\n\
         Method under test: {method_name}\n\n\
         Test should cover:\n\
         - Happy path scenarios\n\
         - Edge cases\n\
         - Error conditions\n\
         - Null/empty inputs\n\n\
         Use {framework}.",
        framework = framework_phrase(language),
    )
}

/// Prompt asking for the diagnosis of one failing test.
#[must_use]
pub fn fix_analysis(source: &str, failure: &TestFailure, language: Language) -> String {
    let mut prompt = format!(
        "Analyze this {language} test failure and suggest a fix:\n\n\
         SOURCE CODE:\n{source}\n\n\
         TEST NAME: {name}\n\
         ERROR MESSAGE: {message}\n",
        name = failure.name,
        message = failure.error_message,
    );
    if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
        prompt.push_str(&format!("EXPECTED: {expected}\nACTUAL: {actual}\n"));
    }
    prompt.push_str(&format!(
        "STACK TRACE:\n{}\n\n\
         Provide:\n\
         1. Root cause analysis\n\
         2. Specific code fix\n\
         3. Explanation of the fix",
        failure.stack_fragment
    ));
    prompt
}

/// Prompt asking for refactorings that keep the tests green.
#[must_use]
pub fn refactoring(source: &str, test_code: &str, language: Language) -> String {
    format!(
        "Analyze this {language} code and suggest refactorings while keeping tests passing:\n\n\
         SOURCE CODE:\n{source}\n\n\
         TESTS:\n{test_code}\n\n\
         Suggest refactorings for:\n\
         - Code duplication\n\
         - Complex methods\n\
         - Poor naming\n\
         - Design patterns\n\
         - Performance improvements\n\n\
         Ensure all tests will still pass after refactoring."
    )
}

/// File hint passed with each request so the provider knows the language.
#[must_use]
pub fn file_hint(stem: &str, language: Language) -> String {
    format!("{stem}.{}", language.file_extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_identifier() {
        assert_eq!(target_identifier("public class Calculator { }"), "Calculator");
        assert_eq!(target_identifier("def add(a, b):\n    return a + b"), "add");
        assert_eq!(target_identifier("int Add(a,b){return a-b;}"), "Add");
        assert_eq!(target_identifier("x = 1"), DEFAULT_TARGET);
    }

    #[test]
    fn test_generation_prompt_names_framework() {
        let prompt = test_generation("class Calc {}", "Calc", Language::CSharp);
        assert!(prompt.starts_with("Generate comprehensive unit tests for this C# class:"));
        assert!(prompt.contains("Follow xUnit conventions"));
        assert!(prompt.ends_with("Class under test: Calc"));

        let prompt = test_generation("fn add() {}", "add", Language::Rust);
        assert!(prompt.contains("Follow appropriate test framework conventions"));
    }

    #[test]
    fn test_fix_analysis_prompt() {
        let failure = TestFailure::new("CalculatorTests.Add", "Assert.Equal() Failure")
            .with_stack("at CalculatorTests.Add()")
            .with_values(Some("5".to_string()), Some("-1".to_string()));
        let prompt = fix_analysis("int Add(a,b){return a-b;}", &failure, Language::CSharp);

        assert!(prompt.contains("TEST NAME: CalculatorTests.Add"));
        assert!(prompt.contains("ERROR MESSAGE: Assert.Equal() Failure"));
        assert!(prompt.contains("EXPECTED: 5\nACTUAL: -1"));
        assert!(prompt.contains("STACK TRACE:\nat CalculatorTests.Add()"));
        assert!(prompt.contains("1. Root cause analysis"));
    }

    #[test]
    fn test_file_hint() {
        assert_eq!(file_hint("test", Language::Python), "test.py");
        assert_eq!(file_hint("fix", Language::CSharp), "fix.cs");
    }
}
