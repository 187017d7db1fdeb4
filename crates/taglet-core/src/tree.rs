//! The suffix-tree automaton and its online builder.
//!
//! Construction follows Ukkonen's algorithm: the owning index appends one
//! symbol to the shared buffer and calls [`SuffixTree::extend`], which folds
//! that symbol into the automaton in amortized O(1). The active point
//! (node, edge offset, length) plus the count of pending suffixes carry the
//! construction state between calls.
//!
//! Nodes live in an arena (`Vec<Node>`) addressed by index, children are
//! symbol-keyed maps and suffix links optional indices, so the structure has
//! no cyclic ownership and serializes as a flat dump.

use crate::types::Symbol;
use std::collections::HashMap;

/// Index of a node in the arena.
pub type NodeId = usize;

/// The root is always the first arena entry.
pub const ROOT: NodeId = 0;

/// A vertex of the automaton. `start..end` labels the incoming edge from the
/// parent; `end == None` marks an open edge that extends to the current end
/// of the shared buffer.
#[derive(Debug, Clone)]
pub struct Node {
    pub start: usize,
    pub end: Option<usize>,

    /// Outgoing edges, keyed by their first symbol. At most one child per
    /// distinct first symbol.
    pub children: HashMap<Symbol, NodeId>,

    /// Construction-only shortcut between internal nodes. Queries never
    /// follow it.
    pub suffix_link: Option<NodeId>,

    /// For a leaf, the buffer offset of the suffix it represents.
    pub suffix_index: Option<usize>,
}

impl Node {
    fn internal(start: usize, end: usize) -> Self {
        Node {
            start,
            end: Some(end),
            children: HashMap::new(),
            suffix_link: None,
            suffix_index: None,
        }
    }

    fn leaf(start: usize, suffix_index: usize) -> Self {
        Node {
            start,
            end: None,
            children: HashMap::new(),
            suffix_link: None,
            suffix_index: Some(suffix_index),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.suffix_index.is_some()
    }
}

/// The mutable construction state. One tree owns exactly one of these; it is
/// never serialized and must be quiescent (`remaining == 0`) before the tree
/// is exportable.
#[derive(Debug, Clone)]
struct ActivePoint {
    node: NodeId,
    edge: usize,
    length: usize,

    /// Suffixes implicitly present but not yet rooted at an explicit leaf.
    remaining: usize,

    /// Internal node created earlier in the current extension round, still
    /// waiting for its suffix link.
    pending_link: Option<NodeId>,
}

impl Default for ActivePoint {
    fn default() -> Self {
        ActivePoint {
            node: ROOT,
            edge: 0,
            length: 0,
            remaining: 0,
            pending_link: None,
        }
    }
}

/// The suffix-tree automaton over the shared symbol buffer.
#[derive(Debug, Clone)]
pub struct SuffixTree {
    nodes: Vec<Node>,
    active: ActivePoint,
}

impl Default for SuffixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SuffixTree {
    /// Create a tree containing only the root.
    pub fn new() -> Self {
        SuffixTree {
            nodes: vec![Node::internal(0, 0)],
            active: ActivePoint::default(),
        }
    }

    /// Rebuild a tree from a restored arena. Suffix links are approximated
    /// (all internal nodes point at the root) and the active point is reset,
    /// which is sound for queries but not for further incremental
    /// construction; callers must mark the tree degraded.
    pub(crate) fn from_restored_nodes(mut nodes: Vec<Node>) -> Self {
        for node in nodes.iter_mut() {
            node.suffix_link = if node.is_leaf() { None } else { Some(ROOT) };
        }
        SuffixTree {
            nodes,
            active: ActivePoint::default(),
        }
    }

    /// The node arena, root first.
    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves (distinct suffixes).
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// True when no suffix is left pending, i.e. the tree is exportable.
    pub fn is_quiescent(&self) -> bool {
        self.active.remaining == 0
    }

    /// Reset the construction state ahead of an independent extension loop.
    ///
    /// Between insertions the state is already quiescent at the root; this
    /// re-establishes the invariant explicitly.
    pub(crate) fn begin_extension_loop(&mut self) {
        debug_assert!(self.is_quiescent(), "previous insertion left pending suffixes");
        self.active = ActivePoint::default();
    }

    fn edge_length(&self, id: NodeId, open_end: usize) -> usize {
        let node = &self.nodes[id];
        node.end.unwrap_or(open_end) - node.start
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Fold the newest buffer symbol into the automaton.
    ///
    /// `text` is the full shared buffer with the new symbol already appended
    /// at its tail. Amortized O(1) per call across a whole string.
    pub fn extend(&mut self, text: &[Symbol]) {
        let pos = text.len() - 1;
        let sym = text[pos];

        self.active.remaining += 1;
        self.active.pending_link = None;

        while self.active.remaining > 0 {
            if self.active.length == 0 {
                self.active.edge = pos;
            }
            let edge_sym = text[self.active.edge];

            match self.nodes[self.active.node].children.get(&edge_sym).copied() {
                None => {
                    // No edge starts with this symbol: grow a fresh leaf.
                    let suffix_start = pos + 1 - self.active.remaining;
                    let leaf = self.push_node(Node::leaf(pos, suffix_start));
                    self.nodes[self.active.node].children.insert(edge_sym, leaf);
                    if let Some(pending) = self.active.pending_link.take() {
                        self.nodes[pending].suffix_link = Some(self.active.node);
                    }
                }
                Some(child) => {
                    let edge_len = self.edge_length(child, text.len());
                    if self.active.length >= edge_len {
                        // Skip/count: hop over the whole edge and retry the
                        // same extension from the child.
                        self.active.edge += edge_len;
                        self.active.length -= edge_len;
                        self.active.node = child;
                        continue;
                    }

                    if text[self.nodes[child].start + self.active.length] == sym {
                        // The symbol is already on the edge: every shorter
                        // pending suffix is implicitly present too, so the
                        // whole round stops here.
                        if self.active.node != ROOT {
                            if let Some(pending) = self.active.pending_link.take() {
                                self.nodes[pending].suffix_link = Some(self.active.node);
                            }
                        }
                        self.active.length += 1;
                        break;
                    }

                    // Mismatch mid-edge: split. The existing child keeps the
                    // tail of its old label and moves under the new internal
                    // node, alongside a fresh leaf for the current suffix.
                    let split_at = self.nodes[child].start + self.active.length;
                    let split =
                        self.push_node(Node::internal(self.nodes[child].start, split_at));
                    self.nodes[child].start = split_at;
                    let child_sym = text[split_at];
                    self.nodes[split].children.insert(child_sym, child);

                    let suffix_start = pos + 1 - self.active.remaining;
                    let leaf = self.push_node(Node::leaf(pos, suffix_start));
                    self.nodes[split].children.insert(sym, leaf);
                    self.nodes[self.active.node].children.insert(edge_sym, split);

                    if let Some(pending) = self.active.pending_link.take() {
                        self.nodes[pending].suffix_link = Some(split);
                    }
                    self.active.pending_link = Some(split);
                }
            }

            self.active.remaining -= 1;
            if self.active.node == ROOT && self.active.length > 0 {
                self.active.length -= 1;
                self.active.edge = pos + 1 - self.active.remaining;
            } else if self.active.node != ROOT {
                self.active.node = self.nodes[self.active.node].suffix_link.unwrap_or(ROOT);
            }
        }
    }

    /// Walk the pattern from the root and return the node whose subtree
    /// holds every occurrence, or `None` if the pattern does not occur.
    /// If the pattern ends mid-edge, the edge's lower node is the locus.
    /// O(pattern length).
    pub fn locus(&self, pattern: &[Symbol], text: &[Symbol]) -> Option<NodeId> {
        if pattern.is_empty() {
            return None;
        }
        let mut node = ROOT;
        let mut i = 0;
        loop {
            let child = *self.nodes[node].children.get(&pattern[i])?;
            let edge = &self.nodes[child];
            let end = edge.end.unwrap_or(text.len());
            let mut j = edge.start;
            while j < end && i < pattern.len() {
                if text[j] != pattern[i] {
                    return None;
                }
                i += 1;
                j += 1;
            }
            if i == pattern.len() {
                return Some(child);
            }
            node = child;
        }
    }

    /// Collect the suffix start offsets of every leaf below `from`.
    /// O(subtree size); an explicit stack keeps deep trees off the call
    /// stack.
    pub fn leaf_suffixes(&self, from: NodeId) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(suffix) = node.suffix_index {
                out.push(suffix);
            }
            stack.extend(node.children.values().copied());
        }
        out
    }

    /// Height of the tree in edges.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for &child in self.nodes[id].children.values() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{symbol_of, TERMINATOR_BASE};

    /// Feed a string plus a unique terminator through the builder.
    fn build(words: &[&str]) -> (SuffixTree, Vec<Symbol>) {
        let mut tree = SuffixTree::new();
        let mut text: Vec<Symbol> = Vec::new();
        for (i, word) in words.iter().enumerate() {
            tree.begin_extension_loop();
            for ch in word.chars() {
                text.push(symbol_of(ch));
                tree.extend(&text);
            }
            text.push(TERMINATOR_BASE + i as u64);
            tree.extend(&text);
        }
        (tree, text)
    }

    fn syms(s: &str) -> Vec<Symbol> {
        s.chars().map(symbol_of).collect()
    }

    #[test]
    fn test_one_leaf_per_suffix() {
        let (tree, text) = build(&["abcabxabcd"]);
        // 10 characters + terminator = 11 suffixes.
        assert_eq!(tree.leaf_count(), text.len());
        assert!(tree.is_quiescent());

        let mut suffixes = tree.leaf_suffixes(ROOT);
        suffixes.sort_unstable();
        let expected: Vec<usize> = (0..text.len()).collect();
        assert_eq!(suffixes, expected);
    }

    #[test]
    fn test_every_substring_has_a_locus() {
        let word = "mississippi";
        let (tree, text) = build(&[word]);
        for start in 0..word.len() {
            for end in start + 1..=word.len() {
                let pattern = syms(&word[start..end]);
                assert!(
                    tree.locus(&pattern, &text).is_some(),
                    "missing substring {:?}",
                    &word[start..end]
                );
            }
        }
        assert!(tree.locus(&syms("miss"), &text).is_some());
        assert!(tree.locus(&syms("ippis"), &text).is_none());
        assert!(tree.locus(&syms("x"), &text).is_none());
    }

    #[test]
    fn test_repeated_symbol_run() {
        // Show-stopper extensions dominate here; the terminator must still
        // force a leaf for every suffix.
        let (tree, text) = build(&["aaaa"]);
        assert_eq!(tree.leaf_count(), 5);
        assert!(tree.locus(&syms("aaaa"), &text).is_some());
        assert!(tree.locus(&syms("aaaaa"), &text).is_none());
    }

    #[test]
    fn test_locus_counts_occurrences() {
        let (tree, text) = build(&["banana"]);
        let locus = tree.locus(&syms("ana"), &text).unwrap();
        let mut starts = tree.leaf_suffixes(locus);
        starts.sort_unstable();
        assert_eq!(starts, vec![1, 3]);

        let locus = tree.locus(&syms("a"), &text).unwrap();
        assert_eq!(tree.leaf_suffixes(locus).len(), 3);
    }

    #[test]
    fn test_multi_string_extension_keeps_invariants() {
        let (tree, text) = build(&["banana", "ananas"]);
        // 6 + 1 + 6 + 1 buffer positions, one leaf each.
        assert_eq!(tree.leaf_count(), text.len());
        assert!(tree.locus(&syms("nanas"), &text).is_some());
        assert!(tree.locus(&syms("banana"), &text).is_some());
        let locus = tree.locus(&syms("ana"), &text).unwrap();
        assert_eq!(tree.leaf_suffixes(locus).len(), 4);
    }

    #[test]
    fn test_restored_tree_links_point_at_root() {
        let (tree, _) = build(&["banana"]);
        let restored = SuffixTree::from_restored_nodes(tree.nodes().to_vec());
        for node in restored.nodes() {
            if node.is_leaf() {
                assert_eq!(node.suffix_link, None);
            } else {
                assert_eq!(node.suffix_link, Some(ROOT));
            }
        }
        assert!(restored.is_quiescent());
    }
}
