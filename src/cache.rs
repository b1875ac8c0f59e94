//! Thread-local snippet cache for parsed patterns and templates.
//!
//! Rewrite callbacks and rule files parse the same snippet text over and
//! over. Parsed snippets are cached per thread, capped at 256 entries; when
//! the cap is reached the cache is cleared and rebuilt on demand.

use crate::pool::with_parser;
use crate::tree::Node;
use crate::ts::{Dialect, ParseError};
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Key is "<dialect>:<snippet>" so the same text parsed under different
    // grammars never collides.
    static SNIPPET_CACHE: RefCell<HashMap<String, Node>> =
        RefCell::new(HashMap::new());
}

/// Get a parsed snippet from cache, or parse and cache it.
///
/// Parse failures are returned and not cached.
pub fn get_or_parse_snippet(text: &str, dialect: Dialect) -> Result<Node, ParseError> {
    let cache_key = format!("{dialect}:{text}");

    if let Some(node) = SNIPPET_CACHE.with(|cache| cache.borrow().get(&cache_key).cloned()) {
        return Ok(node);
    }

    let node = with_parser(dialect, |parser| parser.parse_snippet(text))??;

    SNIPPET_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        cache.insert(cache_key, node.clone());
    });

    Ok(node)
}

/// Clear the snippet cache (mainly for testing).
pub fn clear_cache() {
    SNIPPET_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Get cache statistics for monitoring.
pub fn cache_size() -> usize {
    SNIPPET_CACHE.with(|cache| cache.borrow().len())
}
