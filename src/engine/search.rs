//! Finds every subtree matching a pattern.

use crate::diagnostics::{DiagnosticsSink, Table};
use crate::engine::matcher::{Bindings, Matcher};
use crate::sanitize;
use crate::tree::{print, Node, NodePath, Tree, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// One successful match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    /// Where the matched node sits in the tree.
    #[serde(serialize_with = "serialize_display")]
    pub path: NodePath,
    /// Snapshot of the matched node.
    #[serde(skip)]
    pub node: Node,
    #[serde(skip)]
    pub bindings: Bindings,
    /// One-based start line; `None` for nodes without a position.
    pub line: Option<usize>,
    /// Scalar preview of each binding.
    pub values: BTreeMap<String, Value>,
}

fn serialize_display<S: serde::Serializer>(path: &NodePath, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(path)
}

impl MatchRecord {
    pub fn new(path: NodePath, node: &Node, bindings: Bindings) -> Self {
        let values = bindings
            .iter()
            .map(|(name, bound)| (name.clone(), preview(bound)))
            .collect();
        Self {
            path,
            line: node.line(),
            node: node.clone(),
            bindings,
            values,
        }
    }

    /// Line number, or -1 when unknown.
    pub fn line_or_unknown(&self) -> i64 {
        self.line.map_or(-1, |line| line as i64)
    }

    /// The matched node printed back to source.
    pub fn source_text(&self) -> String {
        print(&self.node)
    }

    /// The matched node without positions, comments or type annotations.
    pub fn cleaned(&self) -> Node {
        sanitize::clean(&self.node)
    }

    pub fn binding(&self, name: &str) -> Option<&Node> {
        self.bindings.get(name)
    }
}

/// First of: raw text, resolved value, name, kind.
pub fn preview(node: &Node) -> Value {
    if let Some(raw) = node.raw() {
        return Value::String(raw.to_string());
    }
    if let Some(value) = node.value().filter(|value| value.is_scalar()) {
        return value.clone();
    }
    if let Some(name) = node.name() {
        return Value::String(name.to_string());
    }
    if node.kind.is_empty() {
        Value::Null
    } else {
        Value::String(node.kind.clone())
    }
}

/// Matches `pattern` against every node of its kind, in tree order.
///
/// The result is a snapshot: replacing nodes afterwards does not change it.
pub fn search(
    tree: &Tree,
    pattern: &Node,
    matcher: &Matcher<'_>,
    sink: &mut dyn DiagnosticsSink,
) -> Vec<MatchRecord> {
    let candidates = tree.find_kind(&pattern.kind);
    tracing::debug!(kind = %pattern.kind, candidates = candidates.len(), "searching");

    let mut records = Vec::new();
    for (path, candidate) in candidates {
        if sink.enabled() {
            sink.table(
                &Table::new(["POTENTIAL MATCH", "MATCH PATTERN"])
                    .row([print(candidate), print(pattern)])
                    .row([
                        sanitize::clean(candidate).to_json(),
                        sanitize::clean(pattern).to_json(),
                    ]),
            );
        }

        match matcher.matches(candidate, pattern) {
            Some(bindings) => records.push(MatchRecord::new(path, candidate, bindings)),
            None => tracing::trace!(%path, "no match"),
        }
    }

    tracing::debug!(matches = records.len(), "search finished");
    records
}
