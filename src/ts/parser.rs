use crate::tree::{
    Comment, Node, Piece, Position, Span, Tree, Value, EXPRESSION_STATEMENT_KIND, LITERAL_KINDS,
};
use crate::ts::errors::ParseError;
use crate::ts::lang::Dialect;
use ast_grep_language::LanguageExt;
use std::collections::HashMap;
use tree_sitter::Parser;

/// Tree-sitter parser that produces owned [`Tree`]s.
pub struct CodeParser {
    parser: Parser,
    dialect: Dialect,
}

impl CodeParser {
    pub fn new(dialect: Dialect) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let ts_lang = dialect.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| ParseError::LanguageSet)?;

        Ok(Self { parser, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse a whole source file.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        let ts_tree = self.parse_raw(source)?;
        let root = Converter { source }.convert_root(ts_tree.root_node());
        Ok(Tree::new(source, root))
    }

    /// Parse a snippet into a single node: the first statement, or the
    /// expression it wraps when it is an expression statement.
    pub fn parse_snippet(&mut self, text: &str) -> Result<Node, ParseError> {
        let mut root = self.parse(text)?.into_root();
        let statement = match root.body_mut() {
            Some(body) if !body.is_empty() => body.swap_remove(0),
            _ => return Err(ParseError::EmptySnippet),
        };
        Ok(unwrap_expression_statement(statement))
    }

    /// Parse into a raw tree-sitter tree, rejecting syntax errors.
    pub fn parse_raw(&mut self, source: &str) -> Result<tree_sitter::Tree, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)?;
        if let Some(error) = first_error_node(tree.root_node()) {
            let (line, column) = point_to_one_based(error.start_position());
            return Err(ParseError::Syntax { line, column });
        }
        Ok(tree)
    }
}

fn unwrap_expression_statement(mut statement: Node) -> Node {
    if statement.kind != EXPRESSION_STATEMENT_KIND {
        return statement;
    }
    match statement.remove("expression") {
        Some(Value::Node(expression)) => {
            let mut expression = *expression;
            // Comments in front of the statement belong to the snippet.
            let mut comments = std::mem::take(&mut statement.comments);
            comments.append(&mut expression.comments);
            expression.comments = comments;
            expression
        }
        Some(other) => {
            statement.set("expression", other);
            statement
        }
        None => statement,
    }
}

/// Returns the first ERROR or MISSING node in pre-order.
pub(crate) fn first_error_node(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_node)
}

/// Converts a tree-sitter position (0-based) to one-based display coordinates.
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (usize, usize) {
    (pos.row.saturating_add(1), pos.column.saturating_add(1))
}

fn span_of(node: tree_sitter::Node<'_>) -> Span {
    let (start_line, start_column) = point_to_one_based(node.start_position());
    let (end_line, end_column) = point_to_one_based(node.end_position());
    Span {
        start: Position {
            line: start_line,
            column: start_column,
        },
        end: Position {
            line: end_line,
            column: end_column,
        },
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// Field that collects a kind's unnamed named children, and whether it is
/// always a list.
fn unnamed_field(kind: &str) -> (&'static str, bool) {
    match kind {
        "program" | "statement_block" | "class_body" | "switch_body" => ("body", true),
        "expression_statement" | "parenthesized_expression" => ("expression", false),
        _ => ("children", true),
    }
}

/// Kinds that are delimited sequences. Empty ones hold an empty list, so
/// `f()` prefix-matches any call of `f` and ignores inner whitespace.
const SEQUENCE_KINDS: &[&str] = &[
    "program",
    "statement_block",
    "class_body",
    "switch_body",
    "arguments",
    "array",
    "object",
    "formal_parameters",
    "array_pattern",
    "object_pattern",
    "named_imports",
    "export_clause",
    "type_arguments",
    "type_parameters",
    "object_type",
    "tuple_type",
];

/// Grammar fields that may repeat, stored as lists even with one element.
fn is_repeated_field(kind: &str, field: &str) -> bool {
    matches!(
        (kind, field),
        ("class_body", "member")
            | ("switch_case" | "switch_default", "body")
            | ("jsx_opening_element" | "jsx_self_closing_element", "attribute")
            | ("enum_body", "name")
            | ("extends_clause", "value" | "type_arguments")
            | ("extends_type_clause", "type")
            | (_, "decorator")
    )
}

struct Converter<'s> {
    source: &'s str,
}

enum Entry<'t> {
    Comment(tree_sitter::Node<'t>),
    Child {
        field: &'static str,
        node: tree_sitter::Node<'t>,
    },
    /// An anonymous token under a grammar field: an operator or keyword.
    Token {
        field: &'static str,
        node: tree_sitter::Node<'t>,
    },
}

impl<'s> Converter<'s> {
    fn convert_root(&self, root: tree_sitter::Node<'_>) -> Node {
        // The root covers the whole file, leading and trailing trivia included.
        self.convert(root, 0, self.source.len())
    }

    fn text(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or_default()
    }

    fn convert(&self, ts: tree_sitter::Node<'_>, start: usize, end: usize) -> Node {
        let kind = ts.kind();
        let text = self.text(ts.start_byte(), ts.end_byte());
        let mut node = Node::new(kind);
        node.span = Some(span_of(ts));

        if LITERAL_KINDS.contains(&kind) {
            node.set("value", literal_value(kind, text));
            node.set("raw", text);
            node.layout = vec![Piece::Field("raw".to_string())];
            return node;
        }

        if ts.child_count() == 0 && !SEQUENCE_KINDS.contains(&kind) {
            let key = if kind.ends_with("identifier") {
                "name"
            } else {
                "text"
            };
            node.set(key, text);
            node.layout = vec![
                Piece::Text(self.text(start, ts.start_byte()).to_string()),
                Piece::Field(key.to_string()),
                Piece::Text(self.text(ts.end_byte(), end).to_string()),
            ];
            node.layout
                .retain(|piece| !matches!(piece, Piece::Text(t) if t.is_empty()));
            return node;
        }

        let entries = self.entries(ts);
        let (default_field, default_is_list) = unnamed_field(kind);
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for entry in &entries {
            if let Entry::Child { field, .. } = entry {
                *counts.entry(*field).or_default() += 1;
            }
        }
        let is_list = |field: &str| {
            counts.get(field).copied().unwrap_or(0) > 1
                || (default_is_list && field == default_field)
                || is_repeated_field(kind, field)
        };

        let mut layout: Vec<Piece> = Vec::new();
        let mut cursor = start;
        let mut pending: Vec<tree_sitter::Node<'_>> = Vec::new();

        for entry in entries {
            let (field, child) = match entry {
                Entry::Comment(comment) => {
                    pending.push(comment);
                    continue;
                }
                Entry::Token { field, node: token } => {
                    // Comments in front of a token stay in the layout text.
                    pending.clear();
                    let gap = self.text(cursor, token.start_byte());
                    if !gap.is_empty() {
                        layout.push(Piece::Text(gap.to_string()));
                    }
                    let text = self.text(token.start_byte(), token.end_byte());
                    if counts.contains_key(field) {
                        layout.push(Piece::Text(text.to_string()));
                    } else if let Some(Value::String(previous)) = node.get(field).cloned() {
                        // Repeated tokens (`for await (const ...)`) compare as
                        // one joined field and print as plain text.
                        for piece in &mut layout {
                            if matches!(piece, Piece::Field(name) if name.as_str() == field) {
                                *piece = Piece::Text(previous.clone());
                            }
                        }
                        node.set(field, format!("{previous} {text}"));
                        layout.push(Piece::Text(text.to_string()));
                    } else {
                        node.set(field, text);
                        layout.push(Piece::Field(field.to_string()));
                    }
                    cursor = token.end_byte();
                    continue;
                }
                Entry::Child { field, node } => (field, node),
            };

            let lead_start = pending.first().map_or(child.start_byte(), |c| c.start_byte());
            let gap = self.text(cursor, lead_start).to_string();

            let mut converted = self.convert(child, child.start_byte(), child.end_byte());
            for (i, comment) in pending.iter().enumerate() {
                let next_start = pending
                    .get(i + 1)
                    .map_or(child.start_byte(), |next| next.start_byte());
                converted.comments.push(Comment::from_source(
                    self.text(comment.start_byte(), comment.end_byte()),
                    self.text(comment.end_byte(), next_start),
                ));
            }
            pending.clear();

            if is_list(field) {
                let index = match node.get(field) {
                    Some(Value::List(items)) => items.len(),
                    _ => 0,
                };
                match layout.last_mut() {
                    Some(Piece::List {
                        field: run, separators, ..
                    }) if *run == field => separators.push(gap),
                    _ => {
                        if !gap.is_empty() {
                            layout.push(Piece::Text(gap));
                        }
                        layout.push(Piece::List {
                            field: field.to_string(),
                            from: index,
                            separators: Vec::new(),
                        });
                    }
                }
                match node.get_mut(field) {
                    Some(Value::List(items)) => items.push(converted),
                    _ => node.set(field, vec![converted]),
                }
            } else {
                if !gap.is_empty() {
                    layout.push(Piece::Text(gap));
                }
                layout.push(Piece::Field(field.to_string()));
                node.set(field, converted);
            }
            cursor = child.end_byte();
        }

        let tail = self.text(cursor, end);
        if !tail.is_empty() {
            layout.push(Piece::Text(tail.to_string()));
        }
        node.layout = layout;

        if SEQUENCE_KINDS.contains(&kind) {
            if node.get(default_field).is_none() {
                node.set(default_field, Vec::<Node>::new());
            }
        } else if node.fields.is_empty() {
            // Token-only nodes (`return;`, `break;`) compare by their tokens,
            // never by the whitespace between them.
            node.set("text", token_text(ts));
        }
        node
    }

    fn entries<'t>(&self, ts: tree_sitter::Node<'t>) -> Vec<Entry<'t>> {
        let (default_field, _) = unnamed_field(ts.kind());
        let mut entries = Vec::new();
        let mut walker = ts.walk();
        if !walker.goto_first_child() {
            return entries;
        }
        loop {
            let child = walker.node();
            if child.kind() == "comment" {
                entries.push(Entry::Comment(child));
            } else if child.is_named() {
                entries.push(Entry::Child {
                    field: walker.field_name().unwrap_or(default_field),
                    node: child,
                });
            } else if let Some(field) = walker.field_name() {
                entries.push(Entry::Token { field, node: child });
            }
            if !walker.goto_next_sibling() {
                break;
            }
        }
        entries
    }
}

fn token_text(ts: tree_sitter::Node<'_>) -> String {
    let mut cursor = ts.walk();
    let tokens: Vec<&str> = ts
        .children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .map(|child| child.kind())
        .collect();
    tokens.join(" ")
}

fn literal_value(kind: &str, text: &str) -> Value {
    match kind {
        "string" => Value::String(unescape(strip_quotes(text))),
        "number" => parse_number(text).map_or_else(|| Value::String(text.to_string()), Value::Number),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

fn strip_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => chars.as_str(),
        _ => text,
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => match unicode_escape(&mut chars) {
                Some(decoded) => out.push(decoded),
                None => out.push('u'),
            },
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Decodes the rest of a `\uXXXX` or `\u{X..}` escape. On malformed input
/// nothing is consumed.
fn unicode_escape(chars: &mut std::str::Chars<'_>) -> Option<char> {
    let rest = chars.as_str();
    let (digits, used) = match rest.strip_prefix('{') {
        Some(braced) => {
            let close = braced.find('}')?;
            (&braced[..close], close + 2)
        }
        None => (rest.get(..4)?, 4),
    };
    let decoded = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)?;
    *chars = rest[used..].chars();
    Some(decoded)
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let radix = |digits: &str, radix: u32| i64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    if let Some(digits) = lower.strip_prefix("0x") {
        radix(digits, 16)
    } else if let Some(digits) = lower.strip_prefix("0o") {
        radix(digits, 8)
    } else if let Some(digits) = lower.strip_prefix("0b") {
        radix(digits, 2)
    } else {
        lower.parse().ok()
    }
}
