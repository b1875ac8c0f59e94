//! Tree-sitter integration: turns JavaScript/TypeScript source into owned
//! [`Node`](crate::tree::Node) trees.
//!
//! Parsing is strict. Source containing ERROR or MISSING nodes is rejected
//! rather than matched against a partially recovered tree.

pub mod errors;
pub mod lang;
pub mod parser;
pub mod validator;

pub use errors::ParseError;
pub use lang::Dialect;
pub use parser::CodeParser;
pub use validator::{validate_rewrite, validate_syntax};
