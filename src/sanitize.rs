//! Strips non-structural metadata from cloned trees.
//!
//! Source positions, attached comments and type annotations are incidental to
//! a node's shape. Dumps of matched nodes drop all of them; template clones
//! drop positions only, so comment placeholders can still be filled in and
//! annotated templates still print their types.

use crate::tree::{Node, Value, TYPE_ANNOTATION_KIND};

/// Which metadata a sanitizing clone removes. Positions are always removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    pub strip_comments: bool,
    pub strip_type_annotations: bool,
}

impl Sanitizer {
    /// Removes everything: positions, comments and type annotations.
    pub const fn full() -> Self {
        Self {
            strip_comments: true,
            strip_type_annotations: true,
        }
    }

    /// Removes positions only. Used before instantiating a template.
    pub const fn positions_only() -> Self {
        Self {
            strip_comments: false,
            strip_type_annotations: false,
        }
    }

    /// Deep-clones `node` without the configured metadata.
    pub fn clean(&self, node: &Node) -> Node {
        let mut copy = node.clone();
        self.strip(&mut copy);
        copy
    }

    pub fn clean_all(&self, nodes: &[Node]) -> Vec<Node> {
        nodes.iter().map(|node| self.clean(node)).collect()
    }

    fn strip(&self, node: &mut Node) {
        node.span = None;
        if self.strip_comments {
            node.comments.clear();
        }
        if self.strip_type_annotations {
            node.fields.retain(|(_, value)| !is_type_annotation(value));
        }
        for (_, value) in &mut node.fields {
            match value {
                Value::Node(child) => self.strip(child),
                Value::List(items) => items.iter_mut().for_each(|child| self.strip(child)),
                _ => {}
            }
        }
    }
}

fn is_type_annotation(value: &Value) -> bool {
    value
        .as_node()
        .is_some_and(|node| node.kind == TYPE_ANNOTATION_KIND)
}

/// Fully sanitized clone, for dumps and diagnostics.
pub fn clean(node: &Node) -> Node {
    Sanitizer::full().clean(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Comment, Position, Span};

    fn span() -> Span {
        let at = Position { line: 1, column: 1 };
        Span {
            start: at,
            end: at,
            start_byte: 0,
            end_byte: 0,
        }
    }

    fn annotated() -> Node {
        let mut name = Node::identifier("x");
        name.span = Some(span());
        let mut declarator = Node::new("variable_declarator")
            .with_field("name", name)
            .with_field(
                "type",
                Node::new(TYPE_ANNOTATION_KIND).with_field("children", vec![Node::identifier("T")]),
            );
        declarator.comments.push(Comment::line(" note"));
        declarator.span = Some(span());
        declarator
    }

    #[test]
    fn full_strips_everything_at_every_depth() {
        let original = annotated();
        let cleaned = clean(&original);

        assert!(cleaned.span.is_none());
        assert!(cleaned.comments.is_empty());
        assert!(cleaned.get("type").is_none());
        let name = cleaned.get("name").and_then(Value::as_node).unwrap();
        assert!(name.span.is_none());

        // The input is untouched.
        assert!(original.span.is_some());
        assert_eq!(original.comments.len(), 1);
    }

    #[test]
    fn positions_only_keeps_comments_and_types() {
        let cleaned = Sanitizer::positions_only().clean(&annotated());

        assert!(cleaned.span.is_none());
        assert_eq!(cleaned.comments.len(), 1);
        assert!(cleaned.get("type").is_some());
    }

    #[test]
    fn cleans_sequences() {
        let cleaned = Sanitizer::full().clean_all(&[annotated(), annotated()]);
        assert_eq!(cleaned.len(), 2);
        assert!(cleaned.iter().all(|node| node.span.is_none()));
    }
}
