use crate::dataset::Item;
use bit_set::BitSet;
use parking_lot::Mutex;
use std::collections::HashMap;

struct Evidence {
    sequence: Vec<Item>,
    extension: Item,
    follow: Vec<Item>,
}

/// Records sequences pruned by backscan: `extension + sequence` is always
/// followed, within the gap, by one of the `follow` items.
///
/// Any sequence ending in `extension + sequence + x` for such an `x` has the
/// same occurrences without its trailing `x`, which is what [`PrefixTrie::strip`]
/// removes from the results.
#[derive(Default)]
pub struct PrefixFilter {
    evidence: Mutex<Vec<Evidence>>,
}

impl PrefixFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&self, sequence: &[Item], extension: Item, follow: &BitSet) {
        let evidence = Evidence {
            sequence: sequence.to_vec(),
            extension,
            follow: follow.iter().map(|item| item as Item).collect(),
        };
        self.evidence.lock().push(evidence);
    }

    pub fn len(&self) -> usize {
        self.evidence.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn build(&self) -> PrefixTrie {
        let mut trie = PrefixTrie::default();
        for evidence in self.evidence.lock().iter() {
            for &follower in &evidence.follow {
                let path = std::iter::once(follower)
                    .chain(evidence.sequence.iter().rev().copied())
                    .chain(std::iter::once(evidence.extension));
                trie.insert(path);
            }
        }
        trie
    }
}

#[derive(Default)]
struct PrefixNode {
    children: HashMap<Item, PrefixNode>,
    end: bool,
}

/// Paths read right to left: a trailing item, then the items before it.
#[derive(Default)]
pub struct PrefixTrie {
    root: PrefixNode,
}

impl PrefixTrie {
    fn insert(&mut self, path: impl Iterator<Item = Item>) {
        let mut node = &mut self.root;
        for item in path {
            node = node.children.entry(item).or_default();
        }
        node.end = true;
    }

    fn forced_last(&self, sequence: &[Item]) -> bool {
        let (&last, before) = match sequence.split_last() {
            Some(split) => split,
            None => return false,
        };
        let mut node = match self.root.children.get(&last) {
            Some(node) => node,
            None => return false,
        };
        for item in before.iter().rev() {
            node = match node.children.get(item) {
                Some(next) => next,
                None => return false,
            };
            if node.end {
                return true;
            }
        }
        false
    }

    /// Length of `sequence` once forced trailing items are removed, at least 1.
    pub fn strip(&self, sequence: &[Item]) -> usize {
        let mut kept = sequence.len();
        while kept > 1 && self.forced_last(&sequence[..kept]) {
            kept -= 1;
        }
        kept
    }
}
