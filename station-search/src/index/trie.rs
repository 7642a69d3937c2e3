//! Prefix trie over normalized station names and their tokens.
//!
//! Nodes live in a vector arena and refer to each other by index. Every node
//! stores the ids of all stations whose name (or a token of it) passes through
//! it, so a prefix lookup is a walk of `prefix.len()` steps with no subtree
//! traversal.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::StationId;
use crate::text::{normalize, tokenize};

/// Handle of a node in the arena.
type NodeId = usize;

const ROOT: NodeId = 0;

static NO_MATCHES: BTreeSet<StationId> = BTreeSet::new();

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Ordered so that completions come out lexicographically.
    children: BTreeMap<char, NodeId>,
    is_end_of_word: bool,
    /// Union of ids of every word passing through this node.
    entity_ids: BTreeSet<StationId>,
}

/// Introspection counters for the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieStats {
    /// Number of nodes, including the root.
    pub nodes: usize,
    /// Number of distinct words (full names and tokens) stored.
    pub words: usize,
}

/// Prefix tree mapping normalized text to station ids.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    words: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            words: 0,
        }
    }

    /// Index a station name under the given id.
    ///
    /// The full normalized name is inserted, then each token that differs
    /// from it, so "arm" reaches "Plaza de Armas" through the token "armas".
    pub fn insert(&mut self, name: &str, id: &StationId) {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return;
        }

        self.insert_word(&normalized, id);

        for token in tokenize(name) {
            if token != normalized {
                self.insert_word(&token, id);
            }
        }
    }

    fn insert_word(&mut self, word: &str, id: &StationId) {
        let mut node = ROOT;
        for ch in word.chars() {
            node = match self.nodes[node].children.get(&ch) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(ch, child);
                    child
                }
            };
            self.nodes[node].entity_ids.insert(id.clone());
        }

        let end = &mut self.nodes[node];
        if !end.is_end_of_word {
            end.is_end_of_word = true;
            self.words += 1;
        }
    }

    /// Walk to the node for an already-normalized key.
    fn find_node(&self, key: &str) -> Option<NodeId> {
        key.chars()
            .try_fold(ROOT, |node, ch| self.nodes[node].children.get(&ch).copied())
    }

    /// Ids of every station with a name or token starting with `prefix`.
    ///
    /// Returns an empty set if the path breaks, and for an empty prefix.
    pub fn find_by_prefix(&self, prefix: &str) -> &BTreeSet<StationId> {
        let key = normalize(prefix);
        match self.find_node(&key) {
            Some(node) => &self.nodes[node].entity_ids,
            None => &NO_MATCHES,
        }
    }

    /// Stored words starting with `prefix`, in lexicographic order.
    ///
    /// The traversal is depth-first, visiting children in character order, and
    /// stops as soon as `max_results` words have been collected.
    pub fn get_completions(&self, prefix: &str, max_results: usize) -> Vec<String> {
        let key = normalize(prefix);
        let mut completions = Vec::new();
        if max_results == 0 {
            return completions;
        }

        let Some(start) = self.find_node(&key) else {
            return completions;
        };

        let mut stack = vec![(start, key)];
        while let Some((node, word)) = stack.pop() {
            let current = &self.nodes[node];
            if current.is_end_of_word {
                completions.push(word.clone());
                if completions.len() >= max_results {
                    break;
                }
            }

            // Reverse so the smallest character is popped first
            for (&ch, &child) in current.children.iter().rev() {
                let mut next = word.clone();
                next.push(ch);
                stack.push((child, next));
            }
        }

        completions
    }

    /// Whether `word` was stored as a complete name or token.
    pub fn contains(&self, word: &str) -> bool {
        let key = normalize(word);
        self.find_node(&key)
            .is_some_and(|node| self.nodes[node].is_end_of_word)
    }

    /// Node and word counts.
    pub fn stats(&self) -> TrieStats {
        TrieStats {
            nodes: self.nodes.len(),
            words: self.words,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every prefix of a normalized name finds the station that owns it
        #[test]
        fn every_prefix_finds_station(names in proptest::collection::vec("[A-Za-zÁÉÍÓÚñ ]{1,20}", 1..8)) {
            let mut trie = Trie::new();
            let ids: Vec<StationId> = (0..names.len())
                .map(|i| StationId::parse(&format!("s{i}")).unwrap())
                .collect();
            for (name, id) in names.iter().zip(&ids) {
                trie.insert(name, id);
            }

            for (name, id) in names.iter().zip(&ids) {
                let normalized = normalize(name);
                let chars: Vec<char> = normalized.chars().collect();
                for k in 1..=chars.len() {
                    let prefix: String = chars[..k].iter().collect();
                    prop_assert!(trie.find_by_prefix(&prefix).contains(id));
                }
            }
        }

        /// Completions are sorted, bounded, and share the prefix
        #[test]
        fn completions_sorted_and_bounded(
            names in proptest::collection::vec("[a-c]{1,6}", 1..12),
            limit in 0usize..6,
        ) {
            let mut trie = Trie::new();
            for (i, name) in names.iter().enumerate() {
                trie.insert(name, &StationId::parse(&format!("s{i}")).unwrap());
            }

            let completions = trie.get_completions("a", limit);
            prop_assert!(completions.len() <= limit);
            prop_assert!(completions.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(completions.iter().all(|c| c.starts_with('a')));
        }
    }
}
