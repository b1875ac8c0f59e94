//! Structural comparison of a candidate subtree against a pattern.

use crate::engine::placeholder::Placeholders;
use crate::tree::{Node, Value, TYPE_ANNOTATION_KIND};
use std::collections::BTreeMap;

/// Placeholder name to captured subtree.
pub type Bindings = BTreeMap<String, Node>;

/// Pattern fields never compared: type arguments, optional-chaining markers
/// and return types. Fields holding a type annotation are skipped as well,
/// and optional parameters compare equal to required ones.
pub const IGNORED_FIELDS: &[&str] = &["type_arguments", "optional_chain", "return_type"];

fn is_ignored(field: &str, value: &Value) -> bool {
    IGNORED_FIELDS.contains(&field)
        || value
            .as_node()
            .is_some_and(|node| node.kind == TYPE_ANNOTATION_KIND)
}

/// Compares candidates against a pattern, capturing placeholders.
///
/// Only the fields present on the pattern are inspected, so a pattern matches
/// any candidate that has at least its structure. Lists match by prefix.
///
/// # Placeholder forms
///
/// ```text
/// $$X              any single node, bound to $$X
/// "$$S"            any literal, bound to $$S
/// { $$BODY }       any block, bound whole to $$BODY
/// ```
///
/// A placeholder that repeats in one pattern is not checked for consistency;
/// the last occurrence wins.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'p> {
    placeholders: &'p Placeholders,
    verbose: bool,
}

impl<'p> Matcher<'p> {
    pub fn new(placeholders: &'p Placeholders) -> Self {
        Self {
            placeholders,
            verbose: false,
        }
    }

    /// Warn about fields whose shape differs between candidate and pattern.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns the bindings when `candidate` matches `pattern`.
    pub fn matches(&self, candidate: &Node, pattern: &Node) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        self.match_into(candidate, pattern, &mut bindings)
            .then_some(bindings)
    }

    /// Matches into an existing map. On failure `bindings` may hold partial
    /// captures and must be discarded.
    pub fn match_into(&self, candidate: &Node, pattern: &Node, bindings: &mut Bindings) -> bool {
        if let Some(name) = self.placeholders.identifier(pattern) {
            bindings.insert(name.to_string(), candidate.clone());
            return true;
        }

        if candidate.is_block() {
            if let Some(name) = self.placeholders.block_body(pattern) {
                bindings.insert(name.to_string(), candidate.clone());
                return true;
            }
        }

        if candidate.is_literal() {
            if let Some(name) = self.placeholders.literal(pattern) {
                bindings.insert(name.to_string(), candidate.clone());
                return true;
            }
        }

        if !same_kind(&candidate.kind, &pattern.kind) {
            return false;
        }

        pattern
            .fields
            .iter()
            .filter(|(field, value)| !is_ignored(field, value))
            .all(|(field, expected)| self.match_value(field, candidate.get(field), expected, bindings))
    }

    fn match_value(
        &self,
        field: &str,
        actual: Option<&Value>,
        expected: &Value,
        bindings: &mut Bindings,
    ) -> bool {
        match (actual, expected) {
            (Some(Value::Node(actual)), Value::Node(expected)) => {
                self.match_into(actual, expected, bindings)
            }
            (Some(Value::List(actual)), Value::List(expected)) => {
                actual.len() >= expected.len()
                    && actual
                        .iter()
                        .zip(expected)
                        .all(|(actual, expected)| self.match_into(actual, expected, bindings))
            }
            // A field that repeats may hold one node in one tree and a list
            // in another; compare them as a one-element list.
            (Some(Value::List(actual)), Value::Node(expected)) => actual
                .first()
                .is_some_and(|first| self.match_into(first, expected, bindings)),
            (Some(Value::Node(actual)), Value::List(expected)) if expected.len() <= 1 => expected
                .first()
                .map_or(true, |expected| self.match_into(actual, expected, bindings)),
            (Some(actual), expected) if expected.is_scalar() => actual == expected,
            (None, Value::Null) => true,
            (actual, _) => {
                if self.verbose {
                    tracing::warn!(
                        field,
                        found = actual.map_or("nothing", shape),
                        expected = shape(expected),
                        "field shape differs"
                    );
                }
                false
            }
        }
    }
}

/// Kinds that differ only by an optional marker (`a?: T` against `a: T`)
/// compare as equal.
fn same_kind(candidate: &str, pattern: &str) -> bool {
    candidate == pattern
        || matches!(
            (candidate, pattern),
            ("optional_parameter", "required_parameter")
                | ("required_parameter", "optional_parameter")
        )
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Node(_) => "node",
        Value::List(_) => "list",
        _ => "scalar",
    }
}
