//! Query engine over the suffix-tree automaton.
//!
//! Queries run in two phases: an O(pattern length) walk from the root to the
//! pattern's locus, then an O(match count) collection of the leaves beneath
//! it. Collected suffix starts are mapped back through the text registry to
//! (string, local offset) pairs; anything outside a single string's content
//! is dropped, so no occurrence ever spans two originally-distinct strings.
//!
//! An absent pattern is not an error: `find` returns an empty result and
//! `contains` returns false.

use crate::buffer::TextRegistry;
use crate::tree::SuffixTree;
use crate::types::{symbol_of, FindResult, Match, Symbol};

/// Default cap on the number of matches `find` materializes.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

fn pattern_symbols(pattern: &str) -> Vec<Symbol> {
    pattern.chars().map(symbol_of).collect()
}

/// Sorted, deduplicated buffer offsets of every in-bounds occurrence.
///
/// Ascending global offsets double as (insertion order, local offset) order
/// because each record owns a contiguous ascending slice of the buffer.
fn occurrence_starts(tree: &SuffixTree, registry: &TextRegistry, pattern: &[Symbol]) -> Vec<usize> {
    let Some(locus) = tree.locus(pattern, registry.symbols()) else {
        return Vec::new();
    };
    let mut starts: Vec<usize> = tree
        .leaf_suffixes(locus)
        .into_iter()
        .filter(|&start| registry.occurrence_within_tag(start, pattern.len()))
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Find every occurrence of `pattern`, materializing at most `limit`
/// matches. `total_found` always reports the true count.
pub fn find(
    tree: &SuffixTree,
    registry: &TextRegistry,
    pattern: &str,
    limit: usize,
) -> FindResult {
    if pattern.is_empty() {
        return FindResult::default();
    }
    let symbols = pattern_symbols(pattern);
    let starts = occurrence_starts(tree, registry, &symbols);
    let total_found = starts.len();
    let truncated = total_found > limit;

    let matches = starts
        .into_iter()
        .take(limit)
        .filter_map(|global_offset| {
            // occurrence_within_tag already proved the owner exists
            let record = registry.owner_of(global_offset)?;
            Some(Match {
                tag_id: record.id.clone(),
                local_offset: global_offset - record.start,
                global_offset,
                matched_text: pattern.to_string(),
                tag_text: record.text.clone(),
            })
        })
        .collect();

    FindResult {
        matches,
        truncated,
        total_found,
    }
}

/// True if `pattern` occurs in any indexed string. O(pattern length): the
/// locus walk alone decides, because a pattern free of reserved symbols can
/// only spell a path that lies inside one string's content.
pub fn contains(tree: &SuffixTree, registry: &TextRegistry, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let symbols = pattern_symbols(pattern);
    tree.locus(&symbols, registry.symbols()).is_some()
}

/// Number of occurrences of `pattern`, without building match payloads.
pub fn count_occurrences(tree: &SuffixTree, registry: &TextRegistry, pattern: &str) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    let symbols = pattern_symbols(pattern);
    occurrence_starts(tree, registry, &symbols).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagId;

    /// Drive the registry and builder together the way TagIndex does.
    fn build(words: &[(&str, &str)]) -> (SuffixTree, TextRegistry) {
        let mut tree = SuffixTree::new();
        let mut registry = TextRegistry::new();
        for (id, text) in words {
            let (sep, term) = registry.alloc_delimiters();
            tree.begin_extension_loop();
            if registry.string_count() > 0 {
                registry.push(sep);
                tree.extend(registry.symbols());
            }
            let start = registry.len();
            for ch in text.chars() {
                registry.push(symbol_of(ch));
                tree.extend(registry.symbols());
            }
            let end = registry.push(term);
            tree.extend(registry.symbols());
            registry.finish_record(TagId::new(*id), text, start, end);
        }
        (tree, registry)
    }

    #[test]
    fn test_find_within_single_string() {
        let (tree, registry) = build(&[("a", "banana")]);
        let result = find(&tree, &registry, "ana", DEFAULT_RESULT_LIMIT);
        assert_eq!(result.total_found, 2);
        assert!(!result.truncated);
        assert_eq!(result.matches[0].local_offset, 1);
        assert_eq!(result.matches[1].local_offset, 3);
        assert_eq!(result.matches[0].matched_text, "ana");
        assert_eq!(result.matches[0].tag_text, "banana");
    }

    #[test]
    fn test_find_across_strings() {
        let (tree, registry) = build(&[("a", "banana"), ("b", "ananas")]);
        let result = find(&tree, &registry, "ana", DEFAULT_RESULT_LIMIT);
        assert_eq!(result.total_found, 4);
        let pairs: Vec<(&str, usize)> = result
            .matches
            .iter()
            .map(|m| (m.tag_id.as_str(), m.local_offset))
            .collect();
        assert_eq!(pairs, vec![("a", 1), ("a", 3), ("b", 0), ("b", 2)]);
    }

    #[test]
    fn test_no_cross_string_matches() {
        let (tree, registry) = build(&[("a", "cat"), ("b", "dog")]);
        assert!(!contains(&tree, &registry, "td"));
        assert!(!contains(&tree, &registry, "atd"));
        assert_eq!(find(&tree, &registry, "tdo", 10).total_found, 0);
        assert!(contains(&tree, &registry, "cat"));
        assert!(contains(&tree, &registry, "og"));
    }

    #[test]
    fn test_case_sensitivity_pass_through() {
        let (tree, registry) = build(&[("a", "Cat")]);
        assert!(!contains(&tree, &registry, "cat"));
        assert!(contains(&tree, &registry, "Cat"));
        assert_eq!(find(&tree, &registry, "cat", 10).total_found, 0);
        assert_eq!(find(&tree, &registry, "Cat", 10).total_found, 1);
    }

    #[test]
    fn test_count_matches_find() {
        let (tree, registry) = build(&[("a", "banana"), ("b", "ananas"), ("c", "bandana")]);
        for pattern in ["a", "an", "ana", "ban", "nan", "s", "zzz"] {
            let found = find(&tree, &registry, pattern, usize::MAX);
            assert_eq!(
                count_occurrences(&tree, &registry, pattern),
                found.matches.len(),
                "count mismatch for {:?}",
                pattern
            );
            assert!(!found.truncated);
        }
    }

    #[test]
    fn test_truncation_reports_true_total() {
        let (tree, registry) = build(&[("a", "aaaaaaaa")]);
        // 8 occurrences of "a"
        let result = find(&tree, &registry, "a", 3);
        assert_eq!(result.matches.len(), 3);
        assert!(result.truncated);
        assert_eq!(result.total_found, 8);
        // limit exactly at the total: not truncated
        let result = find(&tree, &registry, "a", 8);
        assert!(!result.truncated);
        assert_eq!(result.matches.len(), 8);
    }

    #[test]
    fn test_absent_and_empty_patterns() {
        let (tree, registry) = build(&[("x", "abc")]);
        let result = find(&tree, &registry, "xyz", 10);
        assert!(result.matches.is_empty());
        assert!(!result.truncated);
        assert_eq!(result.total_found, 0);

        let result = find(&tree, &registry, "", 10);
        assert!(result.matches.is_empty());
        assert!(!result.truncated);
        assert_eq!(result.total_found, 0);
        assert!(!contains(&tree, &registry, ""));
        assert_eq!(count_occurrences(&tree, &registry, ""), 0);
    }

    #[test]
    fn test_global_offsets_index_the_buffer() {
        let (tree, registry) = build(&[("a", "cat"), ("b", "catalog")]);
        let result = find(&tree, &registry, "cat", 10);
        assert_eq!(result.total_found, 2);
        // "cat" starts at 0; "catalog" content starts after terminator and
        // separator, at offset 5.
        assert_eq!(result.matches[0].global_offset, 0);
        assert_eq!(result.matches[1].global_offset, 5);
    }
}
