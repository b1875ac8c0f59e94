//! Thread-local parser pooling.
//!
//! Keeps one reusable parser per dialect per thread. A parser is created on
//! first use and reused for every later parse on that thread.

use crate::ts::{CodeParser, Dialect, ParseError};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Dialect, CodeParser>> = RefCell::new(HashMap::new());
}

/// Execute function with pooled parser instance for `dialect`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use code_match::pool::with_parser;
/// use code_match::ts::Dialect;
///
/// let tree = with_parser(Dialect::JavaScript, |parser| parser.parse("f();"))??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(dialect: Dialect, f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut CodeParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(dialect) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(CodeParser::new(dialect)?)
            }
        };
        Ok(f(parser))
    })
}
