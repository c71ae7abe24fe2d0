//! Source languages understood by the TDD loop.
//!
//! The language decides which test framework the generation prompt asks for,
//! which file name hint the suggestion provider receives, and which result
//! parser fits the project by default.
//!
//! # Example
//!
//! ```rust
//! use redgreen::Language;
//!
//! let lang: Language = "c#".parse().unwrap();
//! assert_eq!(lang, Language::CSharp);
//! assert_eq!(lang.test_framework(), Some("xUnit"));
//! assert_eq!(lang.file_extension(), "cs");
//! assert_eq!(format!("{}", Language::TypeScript), "TypeScript");
//! ```

use crate::results::FrameworkKind;
use std::fmt;
use std::str::FromStr;

/// Programming languages the orchestrator can generate tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C#
    CSharp,
    /// Visual Basic .NET
    VisualBasic,
    /// JavaScript
    JavaScript,
    /// TypeScript
    TypeScript,
    /// Python
    Python,
    /// Java
    Java,
    /// Go
    Go,
    /// Rust
    Rust,
    /// C++
    Cpp,
    /// PHP
    Php,
    /// Ruby
    Ruby,
    /// SQL
    Sql,
}

static ALL_LANGUAGES: &[Language] = &[
    Language::CSharp,
    Language::VisualBasic,
    Language::JavaScript,
    Language::TypeScript,
    Language::Python,
    Language::Java,
    Language::Go,
    Language::Rust,
    Language::Cpp,
    Language::Php,
    Language::Ruby,
    Language::Sql,
];

impl Language {
    /// Returns all supported languages.
    #[must_use]
    pub fn all() -> &'static [Language] {
        ALL_LANGUAGES
    }

    /// Conventional unit test framework, when the language has one we name.
    #[must_use]
    pub fn test_framework(&self) -> Option<&'static str> {
        match self {
            Language::CSharp => Some("xUnit"),
            Language::JavaScript | Language::TypeScript => Some("Jest"),
            Language::Python => Some("pytest"),
            Language::Java => Some("JUnit"),
            _ => None,
        }
    }

    /// Result parser matching [`Language::test_framework`].
    #[must_use]
    pub fn framework_kind(&self) -> FrameworkKind {
        match self {
            Language::CSharp => FrameworkKind::XUnit,
            Language::JavaScript | Language::TypeScript => FrameworkKind::Jest,
            Language::Python => FrameworkKind::Pytest,
            _ => FrameworkKind::Unknown,
        }
    }

    /// File extension (without the dot) used for provider file hints.
    #[must_use]
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::CSharp => "cs",
            Language::VisualBasic => "vb",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Python => "py",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rs",
            Language::Cpp => "cpp",
            Language::Php => "php",
            Language::Ruby => "rb",
            Language::Sql => "sql",
        }
    }

    /// Line comment marker, used to delimit appended fix blocks.
    #[must_use]
    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Language::Python | Language::Ruby => "#",
            Language::Sql => "--",
            Language::VisualBasic => "'",
            _ => "//",
        }
    }

    /// Map a file extension (with or without the leading dot) to a language.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Language> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        let lang = match ext.as_str() {
            "cs" => Language::CSharp,
            "vb" => Language::VisualBasic,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "py" => Language::Python,
            "java" => Language::Java,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "cpp" | "cc" | "cxx" | "h" | "hpp" => Language::Cpp,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "sql" => Language::Sql,
            _ => return None,
        };
        Some(lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::CSharp => "C#",
            Language::VisualBasic => "Visual Basic",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Cpp => "C++",
            Language::Php => "PHP",
            Language::Ruby => "Ruby",
            Language::Sql => "SQL",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when parsing an invalid language name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    input: String,
}

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language: '{}'", self.input)
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c#" | "csharp" | "cs" => Ok(Language::CSharp),
            "vb" | "vb.net" | "visualbasic" | "visual basic" => Ok(Language::VisualBasic),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "c++" | "cpp" => Ok(Language::Cpp),
            "php" => Ok(Language::Php),
            "ruby" | "rb" => Ok(Language::Ruby),
            "sql" => Ok(Language::Sql),
            _ => Err(ParseLanguageError {
                input: s.to_string(),
            }),
        }
    }
}
