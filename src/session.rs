//! A matching session over one parsed source.
//!
//! A session parses its source once, then serves any number of find and
//! replace calls against the live tree before printing it back. The `$$COUNT`
//! counter belongs to the session and carries across replace calls.

use crate::config::{Options, ValidationError};
use crate::diagnostics::{DiagnosticsSink, NullSink, StderrSink, Table};
use crate::engine::{
    search, Bindings, Counter, EngineError, MatchAction, MatchRecord, Matcher, OnMatch,
    Placeholders, Rewriter, Snippet,
};
use crate::pool::with_parser;
use crate::sanitize;
use crate::tree::{print, Node, Tree};
use crate::ts::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid options: {0}")]
    Options(#[from] ValidationError),

    #[error("failed to parse source: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Parsed source plus the state shared by every call against it.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use code_match::{Options, Session};
///
/// let mut session = Session::new("if (ok) { run(); }", Options::default())?;
/// session.replace("if ($$C) { $$BODY }", "if ($$C) { trace($$COUNT); $$BODY }")?;
/// assert_eq!(session.to_source(), "if (ok) { trace(0); run(); }");
/// # Ok(())
/// # }
/// ```
pub struct Session<S: DiagnosticsSink = StderrSink> {
    options: Options,
    placeholders: Placeholders,
    tree: Tree,
    counter: Counter,
    sink: S,
}

impl Session {
    /// Parses `source`; debug tables go to stderr.
    pub fn new(source: &str, options: Options) -> Result<Self, SessionError> {
        Session::with_sink(source, options, StderrSink)
    }
}

impl<S: DiagnosticsSink> Session<S> {
    pub fn with_sink(source: &str, options: Options, sink: S) -> Result<Self, SessionError> {
        options.validate()?;
        let tree = with_parser(options.dialect, |parser| parser.parse(source))??;
        tracing::debug!(dialect = %options.dialect, bytes = source.len(), "session started");

        Ok(Self {
            placeholders: options.placeholders(),
            options,
            tree,
            counter: Counter::new(),
            sink,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The current tree printed back to source.
    pub fn to_source(&self) -> String {
        self.tree.print()
    }

    /// The value the next `$$COUNT` will take.
    pub fn counter(&self) -> u64 {
        self.counter.value()
    }

    pub fn reset_counter(&mut self) {
        self.counter.reset();
    }

    /// Fully sanitized clone of `node`.
    pub fn clean(&self, node: &Node) -> Node {
        sanitize::clean(node)
    }

    /// Every subtree matching `pattern`, in tree order.
    pub fn find(&mut self, pattern: impl Into<Snippet>) -> Result<Vec<MatchRecord>, SessionError> {
        let pattern = pattern.into().resolve(self.options.dialect)?;

        if self.options.debug {
            self.sink.table(
                &Table::new(["FIND SOURCE", "FIND AST"])
                    .row([print(&pattern), sanitize::clean(&pattern).to_json()]),
            );
            self.log_source_tree();
        }

        let matcher = Matcher::new(&self.placeholders).verbose(self.options.debug);
        let mut null = NullSink;
        let sink: &mut dyn DiagnosticsSink = if self.options.debug {
            &mut self.sink
        } else {
            &mut null
        };
        let records = search(&self.tree, &pattern, &matcher, sink);
        tracing::debug!(matches = records.len(), "find finished");
        Ok(records)
    }

    /// Replaces every match of `pattern` with `template`, returning the number
    /// of replaced nodes.
    pub fn replace(
        &mut self,
        pattern: impl Into<Snippet>,
        template: impl Into<Snippet>,
    ) -> Result<usize, SessionError> {
        self.rewrite(pattern.into(), template.into(), None)
    }

    /// Like [`replace`](Self::replace), consulting `callback` for every match.
    pub fn replace_with<F>(
        &mut self,
        pattern: impl Into<Snippet>,
        template: impl Into<Snippet>,
        mut callback: F,
    ) -> Result<usize, SessionError>
    where
        F: FnMut(&Node, &mut Bindings) -> MatchAction,
    {
        self.rewrite(pattern.into(), template.into(), Some(&mut callback))
    }

    fn rewrite(
        &mut self,
        pattern: Snippet,
        template: Snippet,
        on_match: Option<&mut OnMatch<'_>>,
    ) -> Result<usize, SessionError> {
        let dialect = self.options.dialect;
        let pattern = pattern.resolve(dialect)?;
        let template = template.resolve(dialect)?;

        if self.options.debug {
            self.sink.table(
                &Table::new(["MATCH SRC", "REPLACE SRC"])
                    .row([print(&pattern), print(&template)])
                    .row([
                        sanitize::clean(&pattern).to_json(),
                        sanitize::clean(&template).to_json(),
                    ]),
            );
            self.log_source_tree();
        }

        let mut null = NullSink;
        let sink: &mut dyn DiagnosticsSink = if self.options.debug {
            &mut self.sink
        } else {
            &mut null
        };
        let replaced = Rewriter::new(&self.placeholders, &mut self.counter, dialect)
            .verbose(self.options.debug)
            .rewrite(&mut self.tree, &pattern, &template, on_match, sink)?;

        tracing::debug!(replaced, counter = self.counter.value(), "replace finished");
        if self.options.debug {
            let result = self.to_source();
            self.sink.table(&Table::new(["RESULT"]).row([result]));
        }
        Ok(replaced)
    }

    /// Tabulates find results: line, source, binding previews and the
    /// cleaned node.
    pub fn log_find_results(&mut self, results: &[MatchRecord]) {
        let mut table = Table::new(["LINE", "SOURCE", "MATCHES", "AST"]);
        for record in results {
            let previews = serde_json::to_string_pretty(&record.values)
                .unwrap_or_else(|e| format!("<unserializable: {e}>"));
            table.push_row([
                record.line_or_unknown().to_string(),
                record.source_text(),
                previews,
                record.cleaned().to_json(),
            ]);
        }
        self.sink.table(&table);
    }

    fn log_source_tree(&mut self) {
        if self.options.log_full_source {
            let dump = sanitize::clean(self.tree.root()).to_json();
            self.sink.table(&Table::new(["SOURCE TREE"]).row([dump]));
        }
    }
}
