//! Tabular diagnostics for inspecting patterns, candidates and results.
//!
//! Debug mode renders intermediate state (pattern trees, candidate nodes,
//! before/after source) as ASCII grids. Output is purely observational.

use std::fmt;

/// A grid of cells with a header row. Cells may span several lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    fn columns(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.columns()];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (column, cell) in row.iter().enumerate() {
                let widest = cell.lines().map(|line| line.chars().count()).max().unwrap_or(0);
                widths[column] = widths[column].max(widest);
            }
        }
        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let rule: String = widths
            .iter()
            .map(|width| format!("+{}", "-".repeat(width + 2)))
            .collect::<String>()
            + "+";

        writeln!(f, "{rule}")?;
        write_row(f, &self.header, &widths)?;
        writeln!(f, "{rule}")?;
        for row in &self.rows {
            write_row(f, row, &widths)?;
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let lines: Vec<Vec<&str>> = widths
        .iter()
        .enumerate()
        .map(|(column, _)| {
            cells
                .get(column)
                .map(|cell| cell.lines().collect())
                .unwrap_or_default()
        })
        .collect();
    let height = lines.iter().map(Vec::len).max().unwrap_or(0).max(1);

    for line in 0..height {
        for (column, width) in widths.iter().enumerate() {
            let text = lines[column].get(line).copied().unwrap_or("");
            let pad = width - text.chars().count();
            write!(f, "| {text}{} ", " ".repeat(pad))?;
        }
        writeln!(f, "|")?;
    }
    Ok(())
}

/// Receiver for diagnostic tables.
pub trait DiagnosticsSink {
    /// Whether tables are wanted at all. Callers skip building expensive
    /// dumps when this is false.
    fn enabled(&self) -> bool {
        true
    }

    fn table(&mut self, table: &Table);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    fn table(&mut self, _table: &Table) {}
}

/// Writes rendered tables to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiagnosticsSink for StderrSink {
    fn table(&mut self, table: &Table) {
        eprint!("{table}");
    }
}

/// Keeps every table, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub tables: Vec<Table>,
}

impl DiagnosticsSink for MemorySink {
    fn table(&mut self, table: &Table) {
        self.tables.push(table.clone());
    }
}
