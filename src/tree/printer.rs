//! Prints trees back to source text.
//!
//! Parsed nodes carry a layout that interleaves their original source text
//! with references to their fields, so an untouched tree prints byte-for-byte
//! as it was read. Lists that grew print their extra elements with the last
//! separator seen in the source.

use crate::tree::{Node, Piece, Value};

/// Prints a node, including its leading comments.
pub fn print(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    for comment in &node.comments {
        out.push_str(&comment.source_text());
        out.push_str(&comment.trailing);
    }

    if node.layout.is_empty() {
        write_without_layout(node, out);
        return;
    }

    for (position, piece) in node.layout.iter().enumerate() {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Field(field) => {
                if let Some(value) = node.get(field) {
                    write_value(value, out);
                }
            }
            Piece::List {
                field,
                from,
                separators,
            } => {
                let Some(value) = node.get(field) else {
                    continue;
                };
                let Value::List(items) = value else {
                    write_value(value, out);
                    continue;
                };
                let end = next_run_start(&node.layout[position + 1..], field)
                    .unwrap_or(items.len())
                    .min(items.len());
                for (index, item) in items.iter().enumerate().take(end).skip(*from) {
                    if index > *from {
                        let separator = separators
                            .get(index - *from - 1)
                            .or_else(|| separators.last())
                            .map_or_else(|| default_separator(&node.kind, field), String::as_str);
                        out.push_str(separator);
                    }
                    write_node(item, out);
                }
            }
        }
    }
}

fn next_run_start(rest: &[Piece], field: &str) -> Option<usize> {
    rest.iter().find_map(|piece| match piece {
        Piece::List {
            field: other, from, ..
        } if other == field => Some(*from),
        _ => None,
    })
}

fn default_separator(kind: &str, field: &str) -> &'static str {
    match (kind, field) {
        ("program", _) => "\n",
        (_, "body") => " ",
        _ => ", ",
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Node(node) => write_node(node, out),
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_node(item, out);
            }
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Nodes built in code have no layout: print their scalar, or their fields
/// (operators and keywords included) separated by spaces.
fn write_without_layout(node: &Node, out: &mut String) {
    for key in ["raw", "name", "text", "value"] {
        if let Some(value) = node.get(key).filter(|value| value.is_scalar()) {
            out.push_str(&value.to_string());
            return;
        }
    }

    let mut first = true;
    for (_, value) in &node.fields {
        if matches!(value, Value::List(items) if items.is_empty()) {
            continue;
        }
        if !first {
            out.push(' ');
        }
        first = false;
        write_value(value, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Comment;

    fn statement(name: &str) -> Node {
        let mut stmt = Node::new("expression_statement")
            .with_field("expression", Node::identifier(name));
        stmt.layout = vec![
            Piece::Field("expression".to_string()),
            Piece::Text(";".to_string()),
        ];
        stmt
    }

    fn block(statements: Vec<Node>, separators: &[&str]) -> Node {
        let mut node = Node::new("statement_block").with_field("body", statements);
        node.layout = vec![
            Piece::Text("{ ".to_string()),
            Piece::List {
                field: "body".to_string(),
                from: 0,
                separators: separators.iter().map(|s| s.to_string()).collect(),
            },
            Piece::Text(" }".to_string()),
        ];
        node
    }

    #[test]
    fn prints_grown_list_with_observed_separator() {
        let node = block(
            vec![statement("a"), statement("b"), statement("c")],
            &["\n  "],
        );
        assert_eq!(print(&node), "{ a;\n  b;\n  c; }");
    }

    #[test]
    fn falls_back_to_default_separator() {
        let node = block(vec![statement("a"), statement("b")], &[]);
        assert_eq!(print(&node), "{ a; b; }");
    }

    #[test]
    fn prints_leading_comments() {
        let mut stmt = statement("x");
        stmt.comments.push(Comment::line(" note"));
        assert_eq!(print(&stmt), "// note\nx;");
    }

    #[test]
    fn layoutless_nodes_print_scalars() {
        assert_eq!(print(&Node::new("this").with_field("text", "this")), "this");
        let pair = Node::new("binary")
            .with_field("left", Node::number(1.0))
            .with_field("right", Node::string("two"));
        assert_eq!(print(&pair), "1 \"two\"");
    }

    #[test]
    fn layoutless_nodes_keep_operators() {
        let sum = Node::new("binary_expression")
            .with_field("left", Node::identifier("a"))
            .with_field("operator", "+")
            .with_field("right", Node::number(2.0));
        assert_eq!(print(&sum), "a + 2");
    }
}
