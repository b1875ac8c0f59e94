//! Placeholder name recognition.

use crate::tree::Node;

/// Prefix marking placeholder names when none is configured.
pub const DEFAULT_PREFIX: &str = "$$";

/// Suffix of the reserved counter placeholder (`$$COUNT` by default).
pub const COUNTER_SUFFIX: &str = "COUNT";

/// Recognizes placeholder names under a configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    prefix: String,
    counter: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Placeholders {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let counter = format!("{prefix}{COUNTER_SUFFIX}");
        Self { prefix, counter }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The reserved counter placeholder name.
    pub fn counter_name(&self) -> &str {
        &self.counter
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        !self.prefix.is_empty() && name.starts_with(&self.prefix)
    }

    pub fn is_counter(&self, name: &str) -> bool {
        name == self.counter
    }

    /// The placeholder named by a node's `name` field.
    pub fn identifier<'n>(&self, node: &'n Node) -> Option<&'n str> {
        node.name().filter(|name| self.is_placeholder(name))
    }

    /// The placeholder held as the string value of a literal (`"$$X"`).
    pub fn literal<'n>(&self, node: &'n Node) -> Option<&'n str> {
        if !node.is_literal() {
            return None;
        }
        node.value()
            .and_then(|value| value.as_str())
            .filter(|name| self.is_placeholder(name))
    }

    /// The placeholder of an expression statement that is nothing but a
    /// placeholder identifier (`$$BODY;`).
    pub fn statement<'n>(&self, statement: &'n Node) -> Option<&'n str> {
        statement.expression().and_then(|expr| self.identifier(expr))
    }

    /// The placeholder of a block whose body is exactly one placeholder
    /// statement (`{ $$BODY }`).
    pub fn block_body<'n>(&self, block: &'n Node) -> Option<&'n str> {
        if !block.is_block() {
            return None;
        }
        match block.body()? {
            [only] => self.statement(only),
            _ => None,
        }
    }
}
