use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("snippet contains no statement")]
    EmptySnippet,

    #[error("unknown dialect '{name}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownDialect {
        name: String,
        suggestion: Option<String>,
    },
}
