//! Memoized placeholder renderings.
//!
//! Keys are the exact placeholder source text, whitespace included. Entries
//! are only ever added: an edited expression is simply a new key. The cache
//! belongs to one open document and is dropped with it.

use dashmap::DashMap;
use std::sync::Arc;

/// One rendered placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    /// Markup that replaces the placeholder.
    pub markup: String,
    /// True when `markup` is an error marker.
    pub failed: bool,
}

impl Rendered {
    pub fn ok(markup: impl Into<String>) -> Self {
        Rendered {
            markup: markup.into(),
            failed: false,
        }
    }

    pub fn error(markup: impl Into<String>) -> Self {
        Rendered {
            markup: markup.into(),
            failed: true,
        }
    }
}

/// Cheaply clonable handle to a document's evaluation cache.
#[derive(Clone, Debug, Default)]
pub struct EvalCache {
    entries: Arc<DashMap<String, Rendered>>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> Option<Rendered> {
        self.entries.get(source).map(|entry| entry.value().clone())
    }

    pub fn put(&self, source: impl Into<String>, rendered: Rendered) {
        self.entries.insert(source.into(), rendered);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_whitespace_sensitive() {
        let cache = EvalCache::new();
        cache.put("1+1", Rendered::ok("2"));
        assert_eq!(cache.get("1+1"), Some(Rendered::ok("2")));
        assert_eq!(cache.get("1 + 1"), None);
        assert_eq!(cache.get(" 1+1"), None);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = EvalCache::new();
        let handle = cache.clone();
        handle.put("x", Rendered::error("bad"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("x").unwrap().failed);
    }
}
