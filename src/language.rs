//! Supported source languages and their declaration syntax patterns.
//!
//! The patterns are deliberately line-oriented heuristics. They recognize
//! the common shape of namespace, class and method declarations well
//! enough to attach doc blocks to them; they are not parsers for the
//! languages involved.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Languages the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Php,
    Java,
    TypeScript,
    JavaScript,
}

impl Language {
    /// Every supported language.
    pub fn all() -> &'static [Language] {
        &[
            Language::Php,
            Language::Java,
            Language::TypeScript,
            Language::JavaScript,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Php => "php",
            Language::Java => "java",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
        }
    }

    /// File extensions claimed by this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Php => &["php"],
            Language::Java => &["java"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx", "mjs"],
        }
    }

    /// Detect a language from a file extension.
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Language::all()
            .iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
            .copied()
    }

    /// Pattern capturing the namespace (or package) a file declares, when
    /// the language has one.
    pub fn namespace_pattern(&self) -> Option<Regex> {
        let pattern = match self {
            Language::Php => r"^\s*namespace\s+([A-Za-z_][A-Za-z0-9_\\]*)\s*;",
            Language::Java => r"^\s*package\s+([A-Za-z_][\w.]*)\s*;",
            Language::TypeScript => {
                r"^\s*(?:export\s+)?(?:declare\s+)?namespace\s+([A-Za-z_$][\w$.]*)"
            }
            Language::JavaScript => return None,
        };
        Some(compile(pattern))
    }

    /// Pattern capturing the name of a class-like declaration.
    pub fn class_pattern(&self) -> Regex {
        compile(match self {
            Language::Php => {
                r"^\s*(?:(?:final|abstract|readonly)\s+)*(?:class|interface|trait|enum)\s+([A-Za-z_][A-Za-z0-9_]*)"
            }
            Language::Java => {
                r"^\s*(?:(?:public|final|abstract|static|sealed)\s+)*(?:class|interface|enum|record)\s+([A-Za-z_][A-Za-z0-9_]*)"
            }
            Language::TypeScript | Language::JavaScript => {
                r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][A-Za-z0-9_$]*)"
            }
        })
    }

    /// Pattern capturing the name of a method declaration inside a class
    /// body.
    pub fn method_pattern(&self) -> Regex {
        compile(match self {
            Language::Php => {
                r"^\s*(?:(?:public|protected|private|static|final|abstract)\s+)*function\s+&?([A-Za-z_][A-Za-z0-9_]*)\s*\("
            }
            Language::Java => {
                r"^\s*(?:(?:public|protected|private|static|final|abstract|synchronized|native|default)\s+)+[\w.<>\[\]]+\s+([A-Za-z_]\w*)\s*\("
            }
            // No lookahead in the regex crate, so the no-`;` tail keeps
            // plain call statements from matching as declarations.
            Language::TypeScript | Language::JavaScript => {
                r"^\s*(?:(?:public|private|protected|static|readonly|async|override|get|set)\s+)*([A-Za-z_$][A-Za-z0-9_$]*)\s*\([^;]*$"
            }
        })
    }

    /// Control-flow words the loose method pattern can capture by
    /// mistake in brace-and-paren languages.
    pub fn is_reserved(&self, word: &str) -> bool {
        match self {
            Language::Php | Language::Java => false,
            Language::TypeScript | Language::JavaScript => matches!(
                word,
                "if" | "else"
                    | "for"
                    | "while"
                    | "switch"
                    | "catch"
                    | "return"
                    | "function"
                    | "new"
                    | "typeof"
                    | "await"
                    | "yield"
                    | "do"
                    | "try"
                    | "throw"
                    | "delete"
                    | "in"
                    | "of"
                    | "super"
                    | "this"
            ),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are static literals; a failure here is a bug, not input.
    Regex::new(pattern).expect("invalid declaration pattern")
}
