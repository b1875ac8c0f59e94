//! Source dialects, backed by the grammars bundled in ast-grep-language.

use crate::ts::errors::ParseError;
use ast_grep_language::SupportLang;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The grammar used to parse sources, patterns and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "js", alias = "jsx")]
    JavaScript,
    #[serde(alias = "ts")]
    TypeScript,
    Tsx,
}

const NAMES: &[&str] = &["javascript", "js", "jsx", "typescript", "ts", "tsx"];

impl Dialect {
    /// The ast-grep language whose tree-sitter grammar parses this dialect.
    pub fn support_lang(self) -> SupportLang {
        match self {
            Dialect::JavaScript => SupportLang::JavaScript,
            Dialect::TypeScript => SupportLang::TypeScript,
            Dialect::Tsx => SupportLang::Tsx,
        }
    }

    /// File extensions picked up when walking directories.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Dialect::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Dialect::TypeScript => &["ts", "mts", "cts"],
            Dialect::Tsx => &["tsx"],
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::JavaScript => "javascript",
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
        })
    }
}

impl FromStr for Dialect {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "jsx" => Ok(Dialect::JavaScript),
            "typescript" | "ts" => Ok(Dialect::TypeScript),
            "tsx" => Ok(Dialect::Tsx),
            other => Err(ParseError::UnknownDialect {
                name: s.to_string(),
                suggestion: closest_name(other),
            }),
        }
    }
}

fn closest_name(input: &str) -> Option<String> {
    NAMES
        .iter()
        .map(|name| (name, strsim::jaro_winkler(input, name)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.to_string())
}
