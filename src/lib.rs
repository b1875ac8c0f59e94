//! Code Match: structural pattern matching and rewriting for JavaScript and
//! TypeScript sources.
//!
//! Patterns and templates are written as ordinary code in which names with a
//! placeholder prefix (`$$` by default) capture and re-insert subtrees.
//!
//! # Architecture
//!
//! Sources are parsed with tree-sitter into an owned [`tree::Node`] model
//! that remembers its source layout, so untouched code prints back exactly.
//! The [`engine`] matches pattern trees against it and splices instantiated
//! templates in place. A [`Session`] holds one parsed source and the
//! `$$COUNT` counter across any number of find and replace calls.
//!
//! # Placeholders
//!
//! - `$$X` - matches any single node and captures it
//! - `"$$S"` - matches any literal; in templates, becomes a string literal
//! - `{ $$BODY }` - matches a whole block; in templates, splices its statements
//! - `$$COUNT` - in templates only, a number that grows by one per use
//!
//! # Example
//!
//! ```no_run
//! use code_match::{Options, Session};
//!
//! let mut session = Session::new("console.log(\"hi\"); f();", Options::default())?;
//! let found = session.find("console.log($$X)")?;
//! assert_eq!(found.len(), 1);
//!
//! session.replace("console.log($$X)", "logger.info($$X)")?;
//! println!("{}", session.to_source());
//! # Ok::<(), code_match::SessionError>(())
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod edit;
pub mod engine;
pub mod pool;
pub mod sanitize;
pub mod session;
pub mod tree;
pub mod ts;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, Options, Rule, RulesFile};
pub use diagnostics::{DiagnosticsSink, MemorySink, NullSink, StderrSink, Table};
pub use edit::{EditError, EditResult, EditVerification, FileRewrite};
pub use engine::{
    Bindings, Counter, EngineError, MatchAction, MatchRecord, Matcher, Placeholders, Snippet,
};
pub use sanitize::{clean, Sanitizer};
pub use session::{Session, SessionError};
pub use tree::{print, Node, NodePath, Tree, Value};
pub use ts::{CodeParser, Dialect, ParseError};
