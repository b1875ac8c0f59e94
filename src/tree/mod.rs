//! Owned syntax tree model shared by the parser, the matcher and the printer.
//!
//! A [`Node`] is a tagged value: a `kind` plus an ordered list of named fields.
//! Source positions, attached comments and the printing layout ride along as
//! metadata and never take part in structural comparison.

pub mod path;
pub mod printer;

pub use path::{NodePath, Step};
pub use printer::print;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Kind of a `{ ... }` statement block.
pub const BLOCK_KIND: &str = "statement_block";

/// Kind of a statement wrapping a single expression.
pub const EXPRESSION_STATEMENT_KIND: &str = "expression_statement";

/// Kind of a `: Type` annotation (TypeScript).
pub const TYPE_ANNOTATION_KIND: &str = "type_annotation";

/// Kinds whose nodes carry a resolved `value` and a source `raw` field.
pub const LITERAL_KINDS: &[&str] = &["string", "number", "regex", "true", "false", "null"];

/// A field value: scalar, nested node, or ordered node sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Node(Box<Node>),
    List(Vec<Node>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for values that compare by equality rather than by recursion.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Node(_) | Value::List(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Node(node) => f.write_str(&print(node)),
            Value::List(items) => {
                let printed: Vec<String> = items.iter().map(print).collect();
                f.write_str(&printed.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(Box::new(node))
    }
}

impl From<Vec<Node>> for Value {
    fn from(items: Vec<Node>) -> Self {
        Value::List(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Node(node) => node.serialize(serializer),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

/// Renders integral numbers without a fractional part (`3`, not `3.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Source range of a parsed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// A comment attached in front of a node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Comment {
    /// `/* */` rather than `//`.
    pub block: bool,
    /// Comment text without its delimiters.
    pub value: String,
    /// Whitespace between the end of the comment and whatever follows it.
    #[serde(skip)]
    pub trailing: String,
}

impl Comment {
    pub fn line(value: impl Into<String>) -> Self {
        Self {
            block: false,
            value: value.into(),
            trailing: "\n".to_string(),
        }
    }

    pub fn block(value: impl Into<String>) -> Self {
        Self {
            block: true,
            value: value.into(),
            trailing: " ".to_string(),
        }
    }

    /// Splits raw comment source (`// x` or `/* x */`) into a comment.
    pub fn from_source(text: &str, trailing: impl Into<String>) -> Self {
        let (block, value) = if let Some(inner) = text.strip_prefix("/*") {
            (true, inner.strip_suffix("*/").unwrap_or(inner))
        } else {
            (false, text.strip_prefix("//").unwrap_or(text))
        };
        Self {
            block,
            value: value.to_string(),
            trailing: trailing.into(),
        }
    }

    /// The comment as it appears in source, delimiters included.
    pub fn source_text(&self) -> String {
        if self.block {
            format!("/*{}*/", self.value)
        } else {
            format!("//{}", self.value)
        }
    }
}

/// One step of a node's printing recipe.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Verbatim source text: punctuation, keywords, whitespace.
    Text(String),
    /// A single-valued field (scalar or node).
    Field(String),
    /// A run of list elements starting at `from`. The run extends to the next
    /// run of the same field, or to the end of the list. `separators[i]` is
    /// the source text between the run's `i`th and `i + 1`th elements.
    List {
        field: String,
        from: usize,
        separators: Vec<String>,
    },
}

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: String,
    pub fields: Vec<(String, Value)>,
    pub span: Option<Span>,
    pub comments: Vec<Comment>,
    pub layout: Vec<Piece>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
            span: None,
            comments: Vec::new(),
            layout: Vec::new(),
        }
    }

    /// An `identifier` leaf.
    pub fn identifier(name: impl Into<String>) -> Self {
        let mut node = Node::new("identifier").with_field("name", Value::String(name.into()));
        node.layout = vec![Piece::Field("name".to_string())];
        node
    }

    /// A numeric literal.
    pub fn number(n: f64) -> Self {
        let mut node = Node::new("number");
        node.make_number_literal(n);
        node
    }

    /// A double-quoted string literal.
    pub fn string(value: impl Into<String>) -> Self {
        let mut node = Node::new("string");
        node.make_string_literal(Value::String(value.into()));
        node
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Sets a field, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(field, _)| field == name)?;
        Some(self.fields.remove(index).1)
    }

    /// The `name` field of identifier-like nodes.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// The resolved `value` of a literal.
    pub fn value(&self) -> Option<&Value> {
        self.get("value")
    }

    /// The source text of a literal.
    pub fn raw(&self) -> Option<&str> {
        self.get("raw").and_then(Value::as_str)
    }

    pub fn is_block(&self) -> bool {
        self.kind == BLOCK_KIND
    }

    pub fn is_literal(&self) -> bool {
        LITERAL_KINDS.contains(&self.kind.as_str())
    }

    /// Statement list of a block or program.
    pub fn body(&self) -> Option<&[Node]> {
        self.get("body").and_then(Value::as_list)
    }

    pub fn body_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self.get_mut("body") {
            Some(Value::List(items)) => Some(items),
            _ => None,
        }
    }

    /// The wrapped expression of an expression statement.
    pub fn expression(&self) -> Option<&Node> {
        self.get("expression").and_then(Value::as_node)
    }

    /// One-based start line, when the node came from parsed source.
    pub fn line(&self) -> Option<usize> {
        self.span.map(|span| span.start.line)
    }

    /// The child reached by a single path step.
    pub fn child(&self, step: &Step) -> Option<&Node> {
        match (self.get(&step.field)?, step.index) {
            (Value::Node(node), None) => Some(node),
            (Value::List(items), Some(index)) => items.get(index),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, step: &Step) -> Option<&mut Node> {
        match (self.get_mut(&step.field)?, step.index) {
            (Value::Node(node), None) => Some(node),
            (Value::List(items), Some(index)) => items.get_mut(index),
            _ => None,
        }
    }

    /// Turns this node into a numeric literal in place, dropping any `name`.
    pub fn make_number_literal(&mut self, n: f64) {
        self.kind = "number".to_string();
        self.remove("name");
        self.set("value", Value::Number(n));
        self.set("raw", Value::String(format_number(n)));
        self.layout = vec![Piece::Field("raw".to_string())];
    }

    /// Turns this node into a double-quoted string literal holding `value`.
    pub fn make_string_literal(&mut self, value: Value) {
        let raw = quote(&value.to_string());
        self.set("value", value);
        self.set("raw", Value::String(raw));
        self.layout = vec![Piece::Field("raw".to_string())];
    }

    /// Pre-order visit of this node and every descendant, with paths relative
    /// to `path`.
    pub fn walk<'a>(&'a self, path: &NodePath, visit: &mut dyn FnMut(&NodePath, &'a Node)) {
        visit(path, self);
        for (field, value) in &self.fields {
            match value {
                Value::Node(node) => node.walk(&path.child(field, None), visit),
                Value::List(items) => {
                    for (index, node) in items.iter().enumerate() {
                        node.walk(&path.child(field, Some(index)), visit);
                    }
                }
                _ => {}
            }
        }
    }

    /// Serializes the node as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        if let Some(span) = &self.span {
            map.serialize_entry("loc", span)?;
        }
        if !self.comments.is_empty() {
            map.serialize_entry("comments", &self.comments)?;
        }
        map.end()
    }
}

/// Double-quotes a string as a JavaScript literal. Line terminators and
/// other control characters are escaped so the literal stays on one line.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A parsed source file: its text and the owned tree built from it.
#[derive(Debug, Clone)]
pub struct Tree {
    source: String,
    root: Node,
}

impl Tree {
    pub fn new(source: impl Into<String>, root: Node) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    /// The text the tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        path.steps()
            .iter()
            .try_fold(&self.root, |node, step| node.child(step))
    }

    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        path.steps()
            .iter()
            .try_fold(&mut self.root, |node, step| node.child_mut(step))
    }

    /// Replaces the node at `path`, returning the previous node.
    pub fn replace(&mut self, path: &NodePath, node: Node) -> Option<Node> {
        let slot = self.get_mut(path)?;
        Some(std::mem::replace(slot, node))
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Every node of `kind`, in pre-order (source order), root included.
    pub fn find_kind(&self, kind: &str) -> Vec<(NodePath, &Node)> {
        let mut found = Vec::new();
        self.root.walk(&NodePath::root(), &mut |path, node| {
            if node.kind == kind {
                found.push((path.clone(), node));
            }
        });
        found
    }

    /// Prints the current tree back to source text.
    pub fn print(&self) -> String {
        print(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(callee: &str, args: Vec<Node>) -> Node {
        Node::new("call_expression")
            .with_field("function", Node::identifier(callee))
            .with_field("arguments", Node::new("arguments").with_field("children", args))
    }

    #[test]
    fn set_keeps_field_order() {
        let mut node = Node::new("pair")
            .with_field("key", Node::identifier("a"))
            .with_field("value", Node::number(1.0));
        node.set("key", Node::identifier("b"));

        let names: Vec<_> = node.fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["key", "value"]);
        assert_eq!(node.get("key").and_then(Value::as_node).and_then(Node::name), Some("b"));
    }

    #[test]
    fn find_kind_is_preorder() {
        let root = Node::new("program").with_field(
            "body",
            vec![
                call("outer", vec![call("inner", vec![])]),
                call("last", vec![]),
            ],
        );
        let tree = Tree::new("", root);

        let names: Vec<_> = tree
            .find_kind("call_expression")
            .into_iter()
            .filter_map(|(_, node)| {
                node.get("function")
                    .and_then(Value::as_node)
                    .and_then(Node::name)
            })
            .collect();
        assert_eq!(names, ["outer", "inner", "last"]);
    }

    #[test]
    fn replace_by_path() {
        let root = Node::new("program").with_field("body", vec![call("f", vec![])]);
        let mut tree = Tree::new("", root);
        let (path, _) = tree.find_kind("call_expression").remove(0);

        let old = tree.replace(&path, Node::identifier("x")).unwrap();
        assert_eq!(old.kind, "call_expression");
        assert_eq!(tree.get(&path).and_then(Node::name), Some("x"));
    }

    #[test]
    fn make_number_literal_drops_name() {
        let mut node = Node::identifier("$$COUNT");
        node.make_number_literal(3.0);

        assert!(node.is_literal());
        assert_eq!(node.name(), None);
        assert_eq!(node.raw(), Some("3"));
    }

    #[test]
    fn comment_round_trips_delimiters() {
        let line = Comment::from_source("// hello", "\n");
        assert!(!line.block);
        assert_eq!(line.value, " hello");
        assert_eq!(line.source_text(), "// hello");

        let block = Comment::from_source("/* x */", " ");
        assert!(block.block);
        assert_eq!(block.source_text(), "/* x */");
    }

    #[test]
    fn json_dump_uses_type_key() {
        let json = Node::identifier("foo").to_json();
        assert!(json.contains("\"type\": \"identifier\""));
        assert!(json.contains("\"name\": \"foo\""));
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn quote_keeps_literals_on_one_line() {
        assert_eq!(quote("a +\n b"), "\"a +\\n b\"");
        assert_eq!(quote("x\r\ty"), "\"x\\r\\ty\"");
        assert_eq!(quote("\u{2028}\u{0}"), "\"\\u2028\\u0000\"");
    }
}
