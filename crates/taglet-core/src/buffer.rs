//! The shared text buffer and string registry.
//!
//! All inserted strings live in one append-only symbol buffer: each string's
//! characters, preceded by a unique separator (for every string after the
//! first) and followed by a unique terminator. The registry maps buffer
//! offsets back to the owning string so the query engine can reject
//! occurrences that would cross a string boundary.

use crate::types::{is_reserved, Symbol, TagId, TagRecord, SEPARATOR_BASE, TERMINATOR_BASE};

/// Owns the concatenated symbol buffer and the per-string records.
///
/// The registry is purely bookkeeping: the tree builder is driven one symbol
/// at a time by [`crate::index::TagIndex`], which pushes into this buffer and
/// extends the automaton in lockstep.
#[derive(Debug, Clone)]
pub struct TextRegistry {
    /// The shared append-only buffer
    symbols: Vec<Symbol>,

    /// One record per inserted string, in insertion order.
    /// `start` offsets are strictly increasing.
    records: Vec<TagRecord>,

    /// Offsets of separator symbols (between consecutive strings)
    separator_offsets: Vec<usize>,

    /// Counter for allocating fresh separator/terminator symbols
    next_reserved: u64,
}

impl Default for TextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TextRegistry {
            symbols: Vec::new(),
            records: Vec::new(),
            separator_offsets: Vec::new(),
            next_reserved: 0,
        }
    }

    /// Rebuild a registry from snapshot parts.
    pub(crate) fn from_parts(
        symbols: Vec<Symbol>,
        records: Vec<TagRecord>,
        separator_offsets: Vec<usize>,
        next_reserved: u64,
    ) -> Self {
        TextRegistry {
            symbols,
            records,
            separator_offsets,
            next_reserved,
        }
    }

    /// Number of symbols in the buffer (delimiters included).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if nothing has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The whole buffer.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// All string records in insertion order.
    pub fn records(&self) -> &[TagRecord] {
        &self.records
    }

    /// Number of inserted strings.
    pub fn string_count(&self) -> usize {
        self.records.len()
    }

    /// Offsets of all separator symbols.
    pub fn separator_offsets(&self) -> &[usize] {
        &self.separator_offsets
    }

    pub(crate) fn next_reserved(&self) -> u64 {
        self.next_reserved
    }

    /// Allocate the delimiter pair for the next insertion. Every call returns
    /// symbols never handed out before, so each string boundary is unique.
    pub(crate) fn alloc_delimiters(&mut self) -> (Symbol, Symbol) {
        let seq = self.next_reserved;
        self.next_reserved += 1;
        (SEPARATOR_BASE + seq, TERMINATOR_BASE + seq)
    }

    /// Append one symbol, returning its offset.
    pub(crate) fn push(&mut self, sym: Symbol) -> usize {
        let offset = self.symbols.len();
        self.symbols.push(sym);
        if is_reserved(sym) && sym < TERMINATOR_BASE {
            self.separator_offsets.push(offset);
        }
        offset
    }

    /// Record a completed string spanning `start..end` (terminator at `end`).
    pub(crate) fn finish_record(&mut self, id: TagId, text: &str, start: usize, end: usize) {
        debug_assert_eq!(end - start, text.chars().count());
        debug_assert!(is_reserved(self.symbols[end]));
        self.records.push(TagRecord {
            id,
            text: text.to_string(),
            start,
            end,
        });
    }

    /// Resolve the record owning a content offset, if any. Separator and
    /// terminator offsets belong to no record.
    pub fn owner_of(&self, offset: usize) -> Option<&TagRecord> {
        // Records are sorted by start; find the last one starting at or
        // before `offset`.
        let idx = self.records.partition_point(|r| r.start <= offset);
        if idx == 0 {
            return None;
        }
        let record = &self.records[idx - 1];
        record.owns_offset(offset).then_some(record)
    }

    /// True if a match of `len` symbols starting at `offset` lies entirely
    /// within one string's content.
    pub fn occurrence_within_tag(&self, offset: usize, len: usize) -> bool {
        self.owner_of(offset)
            .map_or(false, |r| offset + len <= r.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::symbol_of;

    /// Append `text` plus delimiters the way the index does.
    fn insert(registry: &mut TextRegistry, id: &str, text: &str) {
        let (sep, term) = registry.alloc_delimiters();
        if registry.string_count() > 0 {
            registry.push(sep);
        }
        let start = registry.len();
        for ch in text.chars() {
            registry.push(symbol_of(ch));
        }
        let end = registry.push(term);
        registry.finish_record(TagId::new(id), text, start, end);
    }

    #[test]
    fn test_layout_and_ownership() {
        let mut registry = TextRegistry::new();
        insert(&mut registry, "a", "cat");
        insert(&mut registry, "b", "dog");

        // cat T0 S1 dog T1
        assert_eq!(registry.len(), 9);
        assert_eq!(registry.separator_offsets(), &[4]);

        assert_eq!(registry.owner_of(0).unwrap().id.as_str(), "a");
        assert_eq!(registry.owner_of(2).unwrap().id.as_str(), "a");
        assert!(registry.owner_of(3).is_none()); // terminator of "cat"
        assert!(registry.owner_of(4).is_none()); // separator
        assert_eq!(registry.owner_of(5).unwrap().id.as_str(), "b");
        assert!(registry.owner_of(8).is_none()); // terminator of "dog"
        assert!(registry.owner_of(100).is_none());
    }

    #[test]
    fn test_occurrence_within_tag() {
        let mut registry = TextRegistry::new();
        insert(&mut registry, "a", "cat");
        insert(&mut registry, "b", "dog");

        assert!(registry.occurrence_within_tag(0, 3)); // "cat"
        assert!(registry.occurrence_within_tag(2, 1)); // "t"
        assert!(!registry.occurrence_within_tag(2, 2)); // would cover terminator
        assert!(registry.occurrence_within_tag(5, 3)); // "dog"
    }

    #[test]
    fn test_delimiters_are_unique_and_reserved() {
        let mut registry = TextRegistry::new();
        let (s1, t1) = registry.alloc_delimiters();
        let (s2, t2) = registry.alloc_delimiters();
        assert_ne!(s1, s2);
        assert_ne!(t1, t2);
        assert!(is_reserved(s1) && is_reserved(t1));
        assert!(s1 < TERMINATOR_BASE && t1 >= TERMINATOR_BASE);
    }
}
