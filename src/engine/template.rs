//! Template instantiation: clones a template and fills in its placeholders.

use crate::engine::matcher::Bindings;
use crate::engine::placeholder::Placeholders;
use crate::sanitize::Sanitizer;
use crate::tree::{print, Node, Value};
use std::cmp::Reverse;

/// Session-wide counter behind the `$$COUNT` placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    next: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value the next occurrence will receive.
    pub fn value(&self) -> u64 {
        self.next
    }

    /// Returns the current value and advances.
    pub fn take(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Builds replacement nodes from a template and a match's bindings.
///
/// Placeholders without a binding are left in place. Every counter
/// occurrence consumes one counter value.
pub struct Instantiator<'a> {
    placeholders: &'a Placeholders,
    counter: &'a mut Counter,
}

impl<'a> Instantiator<'a> {
    pub fn new(placeholders: &'a Placeholders, counter: &'a mut Counter) -> Self {
        Self {
            placeholders,
            counter,
        }
    }

    /// Instantiates a position-free clone of `template`. The template itself
    /// is never modified.
    pub fn instantiate(&mut self, template: &Node, bindings: &Bindings) -> Node {
        let copy = Sanitizer::positions_only().clean(template);
        self.rewrite(copy, bindings)
    }

    fn rewrite(&mut self, mut node: Node, bindings: &Bindings) -> Node {
        let placeholder = self.placeholders.identifier(&node).map(str::to_string);
        match placeholder {
            Some(name) if self.placeholders.is_counter(&name) => {
                let value = self.counter.take();
                node.make_number_literal(value as f64);
            }
            Some(name) if bindings.contains_key(&name) => {
                node = bindings[&name].clone();
            }
            _ if node.is_block() => self.splice_block(&mut node, bindings),
            _ => {
                if !self.fill_literal(&mut node, bindings) {
                    self.rewrite_fields(&mut node, bindings);
                }
            }
        }

        self.substitute_comments(&mut node, bindings);
        node
    }

    fn rewrite_fields(&mut self, node: &mut Node, bindings: &Bindings) {
        let fields = std::mem::take(&mut node.fields);
        node.fields = fields
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Node(child) => Value::from(self.rewrite(*child, bindings)),
                    Value::List(items) => Value::List(
                        items
                            .into_iter()
                            .map(|item| self.rewrite(item, bindings))
                            .collect(),
                    ),
                    scalar => scalar,
                };
                (name, value)
            })
            .collect();
    }

    /// Replaces `$$BODY;` statements bound to a block with that block's
    /// statements, then instantiates the resulting body.
    fn splice_block(&mut self, block: &mut Node, bindings: &Bindings) {
        self.rewrite_non_body_fields(block, bindings);
        let Some(body) = block.body_mut() else {
            return;
        };

        // Tail to head, so splicing never shifts an unvisited index.
        for index in (0..body.len()).rev() {
            let Some(name) = self.placeholders.statement(&body[index]) else {
                continue;
            };
            if self.placeholders.is_counter(name) {
                continue;
            }
            let Some(bound) = bindings.get(name).filter(|bound| bound.is_block()) else {
                continue;
            };
            let statements = bound.body().map(<[Node]>::to_vec).unwrap_or_default();
            body.splice(index..=index, statements);
        }

        let statements = std::mem::take(body);
        *body = statements
            .into_iter()
            .map(|statement| self.rewrite(statement, bindings))
            .collect();
    }

    fn rewrite_non_body_fields(&mut self, block: &mut Node, bindings: &Bindings) {
        for (name, value) in &mut block.fields {
            if name == "body" {
                continue;
            }
            if let Value::Node(child) = value {
                let taken = std::mem::replace(child.as_mut(), Node::new(""));
                **child = self.rewrite(taken, bindings);
            }
        }
    }

    /// Fills a `"$$NAME"` literal. Returns false when the literal is not a
    /// placeholder or is unbound.
    fn fill_literal(&mut self, node: &mut Node, bindings: &Bindings) -> bool {
        let Some(name) = self.placeholders.literal(node).map(str::to_string) else {
            return false;
        };

        if self.placeholders.is_counter(&name) {
            let value = self.counter.take();
            node.make_string_literal(Value::Number(value as f64));
            return true;
        }

        match bindings.get(&name) {
            Some(bound) => {
                node.make_string_literal(resolved_value(bound));
                true
            }
            None => false,
        }
    }

    /// Replaces placeholder names inside attached comments. Longer names go
    /// first so `$$X` never clobbers part of `$$XY`.
    fn substitute_comments(&self, node: &mut Node, bindings: &Bindings) {
        if node.comments.is_empty() {
            return;
        }

        let counter_name = self.placeholders.counter_name();
        let counter_text = self.counter.value().to_string();
        let mut renderings: Vec<(&str, String)> = bindings
            .iter()
            .map(|(name, bound)| (name.as_str(), render(bound)))
            .collect();
        if !bindings.contains_key(counter_name) {
            renderings.push((counter_name, counter_text));
        }
        renderings.sort_by_key(|(name, _)| Reverse(name.len()));

        for comment in &mut node.comments {
            for (name, text) in &renderings {
                if comment.value.contains(name) {
                    comment.value = comment.value.replace(name, text);
                }
            }
        }
    }
}

/// The value a bound node contributes to a string literal: its resolved
/// value, else its name, else its printed source.
fn resolved_value(bound: &Node) -> Value {
    if let Some(value) = bound.value().filter(|value| value.is_scalar()) {
        return value.clone();
    }
    if let Some(name) = bound.name() {
        return Value::String(name.to_string());
    }
    Value::String(print(bound))
}

/// Text a bound node contributes to a comment: raw source, else value or
/// name, else the printed node.
fn render(bound: &Node) -> String {
    if let Some(raw) = bound.raw() {
        return raw.to_string();
    }
    match bound.value() {
        Some(value) if value.is_scalar() => value.to_string(),
        _ => bound
            .name()
            .map_or_else(|| print(bound), str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::get_or_parse_snippet;
    use crate::engine::Matcher;
    use crate::tree::Comment;
    use crate::ts::Dialect;

    fn snippet(text: &str) -> Node {
        get_or_parse_snippet(text, Dialect::JavaScript).unwrap()
    }

    fn bind(candidate: &str, pattern: &str) -> Bindings {
        let placeholders = Placeholders::default();
        Matcher::new(&placeholders)
            .matches(&snippet(candidate), &snippet(pattern))
            .unwrap()
    }

    fn instantiate(template: &str, bindings: &Bindings, counter: &mut Counter) -> String {
        let placeholders = Placeholders::default();
        let node = Instantiator::new(&placeholders, counter).instantiate(&snippet(template), bindings);
        print(&node)
    }

    #[test]
    fn substitutes_identifier_bindings() {
        let bindings = bind("console.log(a + b)", "console.log($$X)");
        let out = instantiate("logger.info($$X)", &bindings, &mut Counter::new());
        assert_eq!(out, "logger.info(a + b)");
    }

    #[test]
    fn unbound_placeholders_stay() {
        let out = instantiate("f($$MISSING)", &Bindings::new(), &mut Counter::new());
        assert_eq!(out, "f($$MISSING)");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let template = snippet("a.b(1, 'two')");
        let placeholders = Placeholders::default();
        let mut counter = Counter::new();
        let out = Instantiator::new(&placeholders, &mut counter)
            .instantiate(&template, &bind("x", "$$X"));

        assert_eq!(out, Sanitizer::positions_only().clean(&template));
        assert!(template.span.is_some());
    }

    #[test]
    fn counter_advances_per_occurrence() {
        let mut counter = Counter::new();
        assert_eq!(instantiate("f($$COUNT)", &Bindings::new(), &mut counter), "f(0)");
        assert_eq!(instantiate("f($$COUNT, $$COUNT)", &Bindings::new(), &mut counter), "f(1, 2)");
        assert_eq!(counter.value(), 3);
    }

    #[test]
    fn splices_block_bodies_in_order() {
        let bindings = bind("if (x) { a(); b(); }", "if ($$C) { $$BODY }");
        let out = instantiate(
            "if ($$C) { before(); $$BODY; after(); }",
            &bindings,
            &mut Counter::new(),
        );
        assert_eq!(out, "if (x) { before(); a(); b(); after(); }");
    }

    #[test]
    fn non_block_binding_replaces_the_identifier() {
        let bindings = bind("run(job)", "run($$X)");
        let out = instantiate("{ $$X }", &bindings, &mut Counter::new());
        assert_eq!(out, "{ job }");
    }

    #[test]
    fn fills_literal_placeholders() {
        let bindings = bind("load(config)", "load($$NAME)");
        let out = instantiate("f(\"$$NAME\")", &bindings, &mut Counter::new());
        assert_eq!(out, "f(\"config\")");

        let out = instantiate("f(\"$$COUNT\")", &Bindings::new(), &mut Counter::new());
        assert_eq!(out, "f(\"0\")");
    }

    #[test]
    fn literal_placeholder_takes_literal_value() {
        let bindings = bind("load('a.json')", "load($$FILE)");
        let out = instantiate("open(\"$$FILE\")", &bindings, &mut Counter::new());
        assert_eq!(out, "open(\"a.json\")");
    }

    #[test]
    fn rewrites_comments() {
        let bindings = bind("track(user, 42)", "track($$WHO, $$N)");
        let mut template = snippet("audit($$WHO)");
        template.comments.push(Comment::line(" $$WHO scored $$N, #$$COUNT"));

        let placeholders = Placeholders::default();
        let mut counter = Counter::new();
        counter.take();
        let node = Instantiator::new(&placeholders, &mut counter).instantiate(&template, &bindings);
        assert_eq!(node.comments[0].value, " user scored 42, #1");
    }

    #[test]
    fn longer_names_substitute_first() {
        let mut bindings = Bindings::new();
        bindings.insert("$$X".to_string(), Node::identifier("short"));
        bindings.insert("$$XY".to_string(), Node::identifier("long"));
        let mut template = Node::identifier("keep");
        template.comments.push(Comment::block(" $$XY $$X "));

        let placeholders = Placeholders::default();
        let mut counter = Counter::new();
        let node = Instantiator::new(&placeholders, &mut counter).instantiate(&template, &bindings);
        assert_eq!(node.comments[0].value, " long short ");
    }
}
