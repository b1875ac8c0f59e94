//! Replaces every match of a pattern with an instantiated template.

use crate::cache::get_or_parse_snippet;
use crate::diagnostics::DiagnosticsSink;
use crate::engine::errors::EngineError;
use crate::engine::matcher::{Bindings, Matcher};
use crate::engine::placeholder::Placeholders;
use crate::engine::search::{search, MatchRecord};
use crate::engine::template::{Counter, Instantiator};
use crate::tree::{Comment, Node, NodePath, Tree};
use crate::ts::Dialect;

/// What to put in place of one match, as decided by a rewrite callback.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchAction {
    /// Instantiate the rewrite's template with the (possibly edited) bindings.
    UseTemplate,
    /// Parse this text as a one-off template and instantiate it instead.
    UseTemplateText(String),
    /// Use this node as the replacement, as is.
    UseNode(Node),
}

/// Callback consulted once per match with the matched node and its bindings.
pub type OnMatch<'f> = dyn FnMut(&Node, &mut Bindings) -> MatchAction + 'f;

/// Drives search and instantiation over one tree.
pub struct Rewriter<'a> {
    placeholders: &'a Placeholders,
    counter: &'a mut Counter,
    dialect: Dialect,
    verbose: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(placeholders: &'a Placeholders, counter: &'a mut Counter, dialect: Dialect) -> Self {
        Self {
            placeholders,
            counter,
            dialect,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replaces every match of `pattern` in `tree`, returning how many nodes
    /// were replaced.
    ///
    /// Matches are collected once, up front, and applied in tree order. A
    /// match lying inside an already replaced node is skipped, since that
    /// node is gone. A template-built replacement without comments of its own
    /// keeps the comments of the node it replaces; a callback's node is used
    /// as is.
    pub fn rewrite(
        &mut self,
        tree: &mut Tree,
        pattern: &Node,
        template: &Node,
        mut on_match: Option<&mut OnMatch<'_>>,
        sink: &mut dyn DiagnosticsSink,
    ) -> Result<usize, EngineError> {
        let matcher = Matcher::new(self.placeholders).verbose(self.verbose);
        let records = search(tree, pattern, &matcher, sink);

        let mut replaced: Vec<NodePath> = Vec::new();
        for record in records {
            if replaced.iter().any(|done| record.path.is_within(done)) {
                tracing::debug!(path = %record.path, "skipping match inside a replaced node");
                continue;
            }

            let MatchRecord {
                path,
                node,
                mut bindings,
                ..
            } = record;

            let action = match on_match.as_deref_mut() {
                Some(callback) => callback(&node, &mut bindings),
                None => MatchAction::UseTemplate,
            };

            let replacement = match action {
                MatchAction::UseNode(replacement) => replacement,
                MatchAction::UseTemplateText(text) => {
                    let one_off = get_or_parse_snippet(&text, self.dialect)?;
                    let built = self.instantiator().instantiate(&one_off, &bindings);
                    inherit_comments(built, node.comments)
                }
                MatchAction::UseTemplate => {
                    let built = self.instantiator().instantiate(template, &bindings);
                    inherit_comments(built, node.comments)
                }
            };

            tracing::debug!(%path, "replacing match");
            tree.replace(&path, replacement);
            replaced.push(path);
        }

        Ok(replaced.len())
    }

    fn instantiator(&mut self) -> Instantiator<'_> {
        Instantiator::new(self.placeholders, self.counter)
    }
}

/// Template-built replacements keep the matched node's comments unless the
/// template brought its own.
fn inherit_comments(mut replacement: Node, comments: Vec<Comment>) -> Node {
    if replacement.comments.is_empty() {
        replacement.comments = comments;
    }
    replacement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::pool::with_parser;

    fn parse(source: &str) -> Tree {
        with_parser(Dialect::JavaScript, |parser| parser.parse(source))
            .unwrap()
            .unwrap()
    }

    fn snippet(text: &str) -> Node {
        get_or_parse_snippet(text, Dialect::JavaScript).unwrap()
    }

    fn rewrite(
        source: &str,
        pattern: &str,
        template: &str,
        on_match: Option<&mut OnMatch<'_>>,
    ) -> (String, usize) {
        let mut tree = parse(source);
        let placeholders = Placeholders::default();
        let mut counter = Counter::new();
        let count = Rewriter::new(&placeholders, &mut counter, Dialect::JavaScript)
            .rewrite(&mut tree, &snippet(pattern), &snippet(template), on_match, &mut NullSink)
            .unwrap();
        (tree.print(), count)
    }

    #[test]
    fn replaces_every_match() {
        let (out, count) = rewrite(
            "console.log(a);\nother();\nconsole.log(b);\n",
            "console.log($$X)",
            "logger.debug($$X)",
            None,
        );
        assert_eq!(out, "logger.debug(a);\nother();\nlogger.debug(b);\n");
        assert_eq!(count, 2);
    }

    #[test]
    fn nested_matches_inside_replaced_nodes_are_skipped() {
        let (out, count) = rewrite("f(f(1));", "f($$X)", "g($$X)", None);
        assert_eq!(out, "g(f(1));");
        assert_eq!(count, 1);
    }

    #[test]
    fn callback_can_supply_template_text() {
        let mut callback = |_: &Node, _: &mut Bindings| MatchAction::UseTemplateText("h($$X)".into());
        let (out, _) = rewrite("f(1);", "f($$X)", "g($$X)", Some(&mut callback));
        assert_eq!(out, "h(1);");
    }

    #[test]
    fn callback_can_supply_a_node() {
        let mut callback = |_: &Node, _: &mut Bindings| MatchAction::UseNode(Node::identifier("done"));
        let (out, _) = rewrite("f(1);", "f($$X)", "g($$X)", Some(&mut callback));
        assert_eq!(out, "done;");
    }

    #[test]
    fn callback_can_edit_bindings() {
        let mut callback = |_: &Node, bindings: &mut Bindings| {
            bindings.insert("$$X".to_string(), Node::identifier("patched"));
            MatchAction::UseTemplate
        };
        let (out, _) = rewrite("f(1); f(2);", "f($$X)", "g($$X)", Some(&mut callback));
        assert_eq!(out, "g(patched); g(patched);");
    }

    #[test]
    fn replacement_inherits_comments() {
        let (out, _) = rewrite("x = /* keep */ old(1);", "old($$A)", "fresh($$A)", None);
        assert_eq!(out, "x = /* keep */ fresh(1);");
    }

    #[test]
    fn callback_node_does_not_inherit_comments() {
        let mut callback = |_: &Node, _: &mut Bindings| MatchAction::UseNode(Node::identifier("done"));
        let (out, _) = rewrite("x = /* keep */ old(1);", "old($$A)", "fresh($$A)", Some(&mut callback));
        assert_eq!(out, "x = done;");
    }

    #[test]
    fn template_text_inherits_comments() {
        let mut callback = |_: &Node, _: &mut Bindings| MatchAction::UseTemplateText("h($$A)".into());
        let (out, _) = rewrite("x = /* keep */ old(1);", "old($$A)", "fresh($$A)", Some(&mut callback));
        assert_eq!(out, "x = /* keep */ h(1);");
    }

    #[test]
    fn bad_template_text_is_an_error() {
        let mut tree = parse("f(1);");
        let placeholders = Placeholders::default();
        let mut counter = Counter::new();
        let mut callback =
            |_: &Node, _: &mut Bindings| MatchAction::UseTemplateText("g(".to_string());
        let err = Rewriter::new(&placeholders, &mut counter, Dialect::JavaScript)
            .rewrite(
                &mut tree,
                &snippet("f($$X)"),
                &snippet("g($$X)"),
                Some(&mut callback),
                &mut NullSink,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }
}
