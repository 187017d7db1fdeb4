//! Core data types for Taglet.
//!
//! This module defines the fundamental data structures shared by the text
//! registry, tree builder, query engine and persistence adapter. These types
//! are designed to be:
//!
//! - **Serializable**: For snapshot export/restore
//! - **Alphabet-agnostic**: Any Unicode scalar can be indexed; delimiters
//!   live in a reserved range disjoint from all scalar values
//! - **Cheap to compare**: Symbols are plain `u64`s

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single symbol in the shared text buffer.
///
/// User characters map to their Unicode scalar value (always `< 0x11_0000`).
/// Separator and terminator delimiters are allocated above [`SEPARATOR_BASE`]
/// so they can never collide with indexed text, which guarantees that no
/// query pattern can match across a string boundary.
pub type Symbol = u64;

/// Lower bound of the reserved separator range.
pub const SEPARATOR_BASE: Symbol = 1 << 32;

/// Lower bound of the reserved terminator range.
pub const TERMINATOR_BASE: Symbol = 1 << 33;

/// Returns true for separator/terminator symbols.
pub fn is_reserved(sym: Symbol) -> bool {
    sym >= SEPARATOR_BASE
}

/// Map a character to its buffer symbol.
pub fn symbol_of(ch: char) -> Symbol {
    ch as Symbol
}

/// External identifier of an indexed tag string.
///
/// Supplied by the caller (e.g., a tag's database key) or generated from a
/// monotonic counter when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagId(pub String);

impl TagId {
    /// Create a new tag ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        TagId(id.into())
    }

    /// Get the tag ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        TagId(s)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        TagId(s.to_string())
    }
}

/// One inserted string and the buffer range it owns.
///
/// `start..end` is the half-open range of the string's content symbols in
/// the shared buffer; `end` is the offset of its terminator. The record
/// retains the original text so a degraded tree can be rebuilt from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    /// External identifier of the string
    pub id: TagId,

    /// The original inserted text
    pub text: String,

    /// Offset of the first content symbol in the shared buffer
    pub start: usize,

    /// Offset of the terminator symbol (one past the last content symbol)
    pub end: usize,
}

impl TagRecord {
    /// Length of the string's content in symbols (== characters)
    pub fn len_symbols(&self) -> usize {
        self.end - self.start
    }

    /// True if `offset` falls inside this record's content range
    pub fn owns_offset(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// A single occurrence of a query pattern inside one indexed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Identifier of the string the match occurs in
    pub tag_id: TagId,

    /// Character offset of the match within that string
    pub local_offset: usize,

    /// Offset of the match in the shared text buffer
    pub global_offset: usize,

    /// The matched text (equals the query pattern; no normalization is done)
    pub matched_text: String,

    /// Full text of the owning string
    pub tag_text: String,
}

/// Outcome of a `find` query.
#[derive(Debug, Clone, Default)]
pub struct FindResult {
    /// Matches, ordered by string insertion order then local offset,
    /// capped at the requested limit
    pub matches: Vec<Match>,

    /// True if more matches existed than the limit allowed
    pub truncated: bool,

    /// The true number of matches before truncation
    pub total_found: usize,
}

/// Diagnostic statistics about the index. Computing them walks the whole
/// automaton; they have no side effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total length of the shared buffer in symbols, delimiters included
    pub total_text_length: usize,

    /// Number of inserted strings
    pub string_count: usize,

    /// Number of nodes in the automaton, root included
    pub node_count: usize,

    /// Number of leaves (one per distinct suffix)
    pub leaf_count: usize,

    /// Height of the automaton in edges
    pub max_depth: usize,

    /// Per-string content lengths in characters, in insertion order
    pub per_string_lengths: Vec<(TagId, usize)>,

    /// When the index last accepted an insertion
    pub last_updated: Option<DateTime<Utc>>,
}
