use crate::ts::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("failed to parse snippet: {0}")]
    Parse(#[from] ParseError),
}
