//! Pattern matching and rewriting over owned syntax trees.
//!
//! Patterns and templates are ordinary code snippets in which names carrying
//! the placeholder prefix (`$$` by default) stand for captured subtrees:
//!
//! ```text
//! pattern:  if ($$COND) { $$BODY }
//! template: if ($$COND) { trace($$COUNT); $$BODY }
//! ```
//!
//! [`search`] finds every subtree shaped like a pattern. [`Rewriter`] replaces
//! each match with an instantiation of a template, optionally steered per
//! match by a callback returning a [`MatchAction`].

pub mod errors;
pub mod matcher;
pub mod placeholder;
pub mod rewrite;
pub mod search;
pub mod template;

pub use errors::EngineError;
pub use matcher::{Bindings, Matcher, IGNORED_FIELDS};
pub use placeholder::{Placeholders, COUNTER_SUFFIX, DEFAULT_PREFIX};
pub use rewrite::{MatchAction, OnMatch, Rewriter};
pub use search::{preview, search, MatchRecord};
pub use template::{Counter, Instantiator};

use crate::cache::get_or_parse_snippet;
use crate::tree::Node;
use crate::ts::Dialect;

/// A pattern or template, either as source text or already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Snippet {
    Text(String),
    Node(Node),
}

impl Snippet {
    /// Parses text snippets; an expression statement yields its expression.
    pub fn resolve(self, dialect: Dialect) -> Result<Node, EngineError> {
        match self {
            Snippet::Text(text) => Ok(get_or_parse_snippet(&text, dialect)?),
            Snippet::Node(node) => Ok(node),
        }
    }
}

impl From<&str> for Snippet {
    fn from(text: &str) -> Self {
        Snippet::Text(text.to_string())
    }
}

impl From<String> for Snippet {
    fn from(text: String) -> Self {
        Snippet::Text(text)
    }
}

impl From<Node> for Snippet {
    fn from(node: Node) -> Self {
        Snippet::Node(node)
    }
}

impl From<&Node> for Snippet {
    fn from(node: &Node) -> Self {
        Snippet::Node(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_snippets_parse() {
        let node = Snippet::from("a.b($$X)").resolve(Dialect::JavaScript).unwrap();
        assert_eq!(node.kind, "call_expression");
    }

    #[test]
    fn node_snippets_pass_through() {
        let node = Node::identifier("x");
        let resolved = Snippet::from(&node).resolve(Dialect::JavaScript).unwrap();
        assert_eq!(resolved, node);
    }

    #[test]
    fn unparsable_text_is_an_error() {
        let err = Snippet::from("f(").resolve(Dialect::JavaScript).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }
}
