//! @ai:module:intent Per-language comment syntax and declaration patterns for the file doc source
//! @ai:module:layer domain
//! @ai:module:public_api Language, CommentStyle, detect_language, is_supported_file
//! @ai:module:stateless true

use std::path::Path;

/// @ai:intent A source language the file doc source can scan for documented classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Java,
}

/// @ai:intent Comment delimiters of a language
#[derive(Debug, Clone)]
pub struct CommentStyle {
    pub line: Vec<&'static str>,
    pub block_start: Option<&'static str>,
    pub block_end: Option<&'static str>,
    pub block_line_prefix: Option<&'static str>,
}

const ALL_LANGUAGES: [Language; 5] = [
    Language::Rust,
    Language::Python,
    Language::TypeScript,
    Language::JavaScript,
    Language::Java,
];

impl Language {
    /// @ai:intent Get the comment style for this language
    /// @ai:effects pure
    pub fn comment_style(&self) -> CommentStyle {
        match self {
            Language::Rust => CommentStyle {
                line: vec!["///", "//!", "//"],
                block_start: Some("/*"),
                block_end: Some("*/"),
                block_line_prefix: Some("*"),
            },
            Language::Python => CommentStyle {
                line: vec!["#"],
                block_start: None,
                block_end: None,
                block_line_prefix: None,
            },
            Language::TypeScript | Language::JavaScript | Language::Java => CommentStyle {
                line: vec!["//"],
                block_start: Some("/*"),
                block_end: Some("*/"),
                block_line_prefix: Some("*"),
            },
        }
    }

    /// @ai:intent Regex whose first capture names a class-like declaration
    /// @ai:effects pure
    pub fn declaration_pattern(&self) -> &'static str {
        match self {
            Language::Rust => {
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:struct|enum|trait)\s+(\w+)|impl(?:<[^>]*>)?\s+(?:\w+\s+for\s+)?(\w+))"
            }
            Language::Python => r"^\s*class\s+(\w+)",
            Language::TypeScript | Language::JavaScript => {
                r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)"
            }
            Language::Java => {
                r"^\s*(?:(?:public|protected|private|abstract|final|static)\s+)*(?:class|interface|record|enum)\s+(\w+)"
            }
        }
    }

    /// @ai:intent Regex whose first capture names a method declaration
    /// @ai:effects pure
    pub fn function_pattern(&self) -> &'static str {
        match self {
            Language::Rust => r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)",
            Language::Python => r"^\s*(?:async\s+)?def\s+(\w+)",
            Language::TypeScript | Language::JavaScript => {
                r"^\s*(?:(?:public|private|protected|static|async)\s+)*(?:function\s+)?(\w+)\s*\([^)]*\)\s*(?::[^{]*)?\{"
            }
            Language::Java => {
                r"^\s*(?:(?:public|private|protected|static|final|abstract|synchronized)\s+)*[\w<>\[\],\s]+?\s+(\w+)\s*\("
            }
        }
    }

    /// @ai:intent Get file extensions for this language
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Rust => &["rs"],
            Language::Python => &["py"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx", "mjs"],
            Language::Java => &["java"],
        }
    }
}

/// @ai:intent Detect the source language from a file path
/// @ai:example ("movies.rs") -> Some(Rust)
/// @ai:example ("movies.txt") -> None
/// @ai:effects pure
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    ALL_LANGUAGES
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
}

pub fn is_supported_file(path: &Path) -> bool {
    detect_language(path).is_some()
}
