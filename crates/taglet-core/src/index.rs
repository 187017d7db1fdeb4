//! The public index facade.
//!
//! [`TagIndex`] ties the text registry, tree builder and query engine
//! together behind the narrow interface the surrounding application calls:
//! `insert`, `find`, `contains`, `count_occurrences`, `statistics`, plus
//! snapshot export/restore (see [`crate::snapshot`]).
//!
//! The index is single-threaded: `insert` takes `&mut self`, queries take
//! `&self`, and the borrow checker serializes writers against readers. For
//! callers that need to share one index across threads, [`SharedTagIndex`]
//! wraps the whole structure in a reader-writer lock.

use crate::buffer::TextRegistry;
use crate::config::Config;
use crate::error::{Result, TagletError};
use crate::search;
use crate::tree::SuffixTree;
use crate::types::{symbol_of, FindResult, IndexStats, TagId, TagRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Incremental multi-string suffix index over short tag strings.
///
/// Substring queries cost O(pattern length + matches) regardless of how many
/// strings are indexed; insertion is amortized linear in the string length.
///
/// ## Example
///
/// ```rust
/// use taglet_core::TagIndex;
///
/// let mut index = TagIndex::new();
/// index.insert("sunset", None).unwrap();
/// index.insert("sunflower", None).unwrap();
///
/// assert!(index.contains("sun"));
/// assert_eq!(index.count_occurrences("un"), 2);
/// ```
pub struct TagIndex {
    pub(crate) registry: TextRegistry,
    pub(crate) tree: SuffixTree,

    /// True after a snapshot restore: suffix links are approximate and the
    /// next insertion must rebuild from the retained strings first.
    pub(crate) degraded: bool,

    /// Counter backing auto-generated external ids.
    pub(crate) next_auto_id: u64,

    /// Result cap used by [`TagIndex::find`].
    pub(crate) default_limit: usize,

    pub(crate) last_updated: Option<DateTime<Utc>>,
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TagIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        TagIndex {
            registry: TextRegistry::new(),
            tree: SuffixTree::new(),
            degraded: false,
            next_auto_id: 1,
            default_limit: search::DEFAULT_RESULT_LIMIT,
            last_updated: None,
        }
    }

    /// Create an index with settings taken from a configuration.
    pub fn with_config(config: &Config) -> Self {
        TagIndex {
            default_limit: config.search.default_limit,
            ..Self::new()
        }
    }

    /// Number of indexed strings.
    pub fn len(&self) -> usize {
        self.registry.string_count()
    }

    /// True if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.registry.string_count() == 0
    }

    /// True if this index was restored from a snapshot and has not yet been
    /// rebuilt. Queries are unaffected; the first insertion triggers a full
    /// rebuild from the retained strings.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// All indexed strings, in insertion order.
    pub fn records(&self) -> &[TagRecord] {
        self.registry.records()
    }

    /// Insert a string, returning the external id used.
    ///
    /// Fails with [`TagletError::InvalidInput`] for an empty string, before
    /// any shared state is touched. When `id` is `None`, a fresh id is
    /// generated from a monotonic counter.
    pub fn insert(&mut self, text: &str, id: Option<&str>) -> Result<TagId> {
        if text.is_empty() {
            return Err(TagletError::invalid_input("cannot insert an empty string"));
        }

        if self.degraded {
            self.rebuild();
        }

        let id = match id {
            Some(id) => TagId::new(id),
            None => {
                let id = TagId::new(self.next_auto_id.to_string());
                self.next_auto_id += 1;
                id
            }
        };
        self.feed(text, id.clone());
        self.last_updated = Some(Utc::now());

        debug!(id = %id, chars = text.chars().count(), "inserted string");
        Ok(id)
    }

    /// Run one full extension loop: separator (if needed), content,
    /// terminator, then record the string.
    fn feed(&mut self, text: &str, id: TagId) {
        let (separator, terminator) = self.registry.alloc_delimiters();
        self.tree.begin_extension_loop();

        if !self.registry.is_empty() {
            self.registry.push(separator);
            self.tree.extend(self.registry.symbols());
        }
        let start = self.registry.len();
        for ch in text.chars() {
            self.registry.push(symbol_of(ch));
            self.tree.extend(self.registry.symbols());
        }
        let end = self.registry.push(terminator);
        self.tree.extend(self.registry.symbols());
        debug_assert!(self.tree.is_quiescent());

        self.registry.finish_record(id, text, start, end);
    }

    /// Rebuild the automaton from scratch out of the retained strings,
    /// clearing the degraded flag. One-time O(total text length).
    pub(crate) fn rebuild(&mut self) {
        let records = self.registry.records().to_vec();
        info!(strings = records.len(), "rebuilding index from retained strings");

        self.registry = TextRegistry::new();
        self.tree = SuffixTree::new();
        self.degraded = false;
        for record in records {
            self.feed(&record.text, record.id);
        }
    }

    /// Find every occurrence of `pattern`, capped at the configured default
    /// limit. An empty pattern yields an empty, non-truncated result.
    pub fn find(&self, pattern: &str) -> FindResult {
        self.find_limited(pattern, self.default_limit)
    }

    /// Find with an explicit result cap.
    pub fn find_limited(&self, pattern: &str, limit: usize) -> FindResult {
        search::find(&self.tree, &self.registry, pattern, limit)
    }

    /// True if `pattern` occurs anywhere. O(pattern length).
    pub fn contains(&self, pattern: &str) -> bool {
        search::contains(&self.tree, &self.registry, pattern)
    }

    /// Number of occurrences of `pattern`, without match payloads.
    pub fn count_occurrences(&self, pattern: &str) -> usize {
        search::count_occurrences(&self.tree, &self.registry, pattern)
    }

    /// Diagnostic statistics. Walks the automaton; no side effects.
    pub fn statistics(&self) -> IndexStats {
        IndexStats {
            total_text_length: self.registry.len(),
            string_count: self.registry.string_count(),
            node_count: self.tree.node_count(),
            leaf_count: self.tree.leaf_count(),
            max_depth: self.tree.max_depth(),
            per_string_lengths: self
                .registry
                .records()
                .iter()
                .map(|r| (r.id.clone(), r.len_symbols()))
                .collect(),
            last_updated: self.last_updated,
        }
    }
}

impl std::fmt::Debug for TagIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagIndex")
            .field("strings", &self.len())
            .field("nodes", &self.tree.node_count())
            .field("degraded", &self.degraded)
            .finish()
    }
}

/// A [`TagIndex`] behind an `Arc<RwLock>`, for callers that cannot serialize
/// insert/query calls themselves. Queries share the read lock; insertions
/// take the write lock, so a writer never mutates the automaton while a
/// query traversal is in progress.
#[derive(Clone)]
pub struct SharedTagIndex {
    inner: Arc<RwLock<TagIndex>>,
}

impl Default for SharedTagIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedTagIndex {
    /// Create a shared handle around a new empty index.
    pub fn new() -> Self {
        Self::from_index(TagIndex::new())
    }

    /// Wrap an existing index.
    pub fn from_index(index: TagIndex) -> Self {
        SharedTagIndex {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn insert(&self, text: &str, id: Option<&str>) -> Result<TagId> {
        self.inner.write().insert(text, id)
    }

    pub fn find(&self, pattern: &str) -> FindResult {
        self.inner.read().find(pattern)
    }

    pub fn find_limited(&self, pattern: &str, limit: usize) -> FindResult {
        self.inner.read().find_limited(pattern, limit)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.inner.read().contains(pattern)
    }

    pub fn count_occurrences(&self, pattern: &str) -> usize {
        self.inner.read().count_occurrences(pattern)
    }

    pub fn statistics(&self) -> IndexStats {
        self.inner.read().statistics()
    }

    /// Run a closure with shared read access to the underlying index.
    pub fn with_read<T>(&self, f: impl FnOnce(&TagIndex) -> T) -> T {
        f(&self.inner.read())
    }
}
