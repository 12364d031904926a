use super::EmergingStatus;
use crate::dataset::Item;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::mem;

#[derive(Default)]
struct TreeNode {
    children: HashMap<Item, TreeNode>,
    // unbranched items following the edge into this node
    fragment: Option<Box<[Item]>>,
}

impl TreeNode {
    fn chain(rest: &[Item]) -> Self {
        Self {
            children: HashMap::new(),
            fragment: if rest.is_empty() { None } else { Some(rest.into()) },
        }
    }

    /// A leaf ends a stored sequence.
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Trie of minimal emerging sequences answering "does this sequence contain one of them".
///
/// Containment is subsequence containment: items in order, not necessarily
/// contiguous. Unbranched paths are stored as fragments on a single node.
#[derive(Default)]
pub struct FilteringTree {
    root: TreeNode,
    len: usize,
}

impl FilteringTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inserted sequences.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Callers insert by non-decreasing length, so `sequence` never extends a stored one.
    pub fn insert(&mut self, sequence: &[Item]) {
        if sequence.is_empty() {
            return;
        }
        self.len += 1;
        let mut node = &mut self.root;
        let mut i = 0;
        while i < sequence.len() {
            let child = match node.children.entry(sequence[i]) {
                Entry::Vacant(slot) => {
                    slot.insert(TreeNode::chain(&sequence[i + 1..]));
                    return;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };
            i += 1;
            if let Some(fragment) = child.fragment.take() {
                let rest = &sequence[i..];
                let common = fragment.iter().zip(rest).take_while(|(a, b)| a == b).count();
                if common == fragment.len() {
                    child.fragment = Some(fragment);
                    i += common;
                } else if common == rest.len() {
                    // the new sequence stops inside the fragment and covers everything below
                    child.fragment = if common == 0 { None } else { Some(rest.into()) };
                    child.children.clear();
                    return;
                } else {
                    let split = TreeNode {
                        children: mem::take(&mut child.children),
                        fragment: if common + 1 == fragment.len() {
                            None
                        } else {
                            Some(fragment[common + 1..].into())
                        },
                    };
                    child.fragment = if common == 0 { None } else { Some(fragment[..common].into()) };
                    child.children.insert(fragment[common], split);
                    i += common;
                }
            }
            if child.is_leaf() {
                // a stored sequence is a prefix of this one
                return;
            }
            node = child;
        }
        // this sequence is a prefix of stored ones, it is the stronger witness
        node.children.clear();
    }

    /// Whether a stored sequence is a subsequence of `sequence`.
    pub fn contains_subsequence_of(&self, sequence: &[Item]) -> bool {
        matches_from(&self.root, sequence, 0)
    }

    /// Containment test for `expansion + sequence` that tells whether `sequence` alone
    /// already contains a stored sequence, or only does with the expansion.
    pub fn check(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        if matches_from(&self.root, sequence, 0) {
            return EmergingStatus::EmergingWithoutExpansion;
        }
        match self.root.children.get(&expansion) {
            Some(next) if matches_below(next, sequence, 0) => EmergingStatus::EmergingWithExpansion,
            _ => EmergingStatus::NoEmergingSubset,
        }
    }
}

// any stored path starting at or after `from`
fn matches_from(node: &TreeNode, sequence: &[Item], from: usize) -> bool {
    for i in from..sequence.len() {
        if let Some(next) = node.children.get(&sequence[i]) {
            if matches_below(next, sequence, i + 1) {
                return true;
            }
        }
    }
    false
}

// `next` was reached by an item matched just before `after`
fn matches_below(next: &TreeNode, sequence: &[Item], after: usize) -> bool {
    let resume = match &next.fragment {
        None => after,
        Some(fragment) => {
            let mut matched = 0;
            let mut resume = None;
            for (j, &item) in sequence.iter().enumerate().skip(after) {
                if item == fragment[matched] {
                    matched += 1;
                    if matched == fragment.len() {
                        resume = Some(j + 1);
                        break;
                    }
                }
            }
            match resume {
                Some(resume) => resume,
                None => return false,
            }
        }
    };
    next.is_leaf() || matches_from(next, sequence, resume)
}

/// Keeps the sequences containing no shorter kept sequence, shortest first.
pub fn minimal_sequences(mut sequences: Vec<Vec<Item>>) -> (FilteringTree, Vec<Vec<Item>>) {
    sequences.par_sort_by_key(|sequence| sequence.len());
    let mut tree = FilteringTree::new();
    let mut minimal = Vec::new();
    for sequence in sequences {
        if !tree.contains_subsequence_of(&sequence) {
            tree.insert(&sequence);
            minimal.push(sequence);
        }
    }
    (tree, minimal)
}

impl fmt::Debug for FilteringTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter, node: &TreeNode, depth: usize) -> fmt::Result {
            let mut items: Vec<&Item> = node.children.keys().collect();
            items.sort_unstable();
            for item in items {
                let child = &node.children[item];
                write!(f, "{:indent$}{}", "", item, indent = depth * 2)?;
                if let Some(fragment) = &child.fragment {
                    write!(f, " {:?}", fragment)?;
                }
                writeln!(f)?;
                write_node(f, child, depth + 1)?;
            }
            Ok(())
        }
        writeln!(f, "FilteringTree ({} sequences)", self.len)?;
        write_node(f, &self.root, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::{minimal_sequences, EmergingStatus, FilteringTree};

    #[test]
    fn test_subsequence_containment() {
        let mut tree = FilteringTree::new();
        tree.insert(&[1, 2, 3, 4]);
        assert!(tree.contains_subsequence_of(&[1, 2, 3, 4]));
        assert!(tree.contains_subsequence_of(&[0, 1, 5, 2, 3, 6, 4]));
        assert!(!tree.contains_subsequence_of(&[1, 2, 4, 3]));
        assert!(!tree.contains_subsequence_of(&[1, 2, 3]));
    }

    #[test]
    fn test_fragment_split() {
        let mut tree = FilteringTree::new();
        tree.insert(&[1, 2, 3, 4]);
        tree.insert(&[1, 2, 6, 7]);
        tree.insert(&[1, 5]);
        tree.insert(&[8, 9]);
        assert_eq!(tree.len(), 4);
        assert!(tree.contains_subsequence_of(&[1, 2, 6, 7]));
        assert!(tree.contains_subsequence_of(&[1, 2, 3, 4]));
        assert!(tree.contains_subsequence_of(&[1, 0, 5]));
        assert!(tree.contains_subsequence_of(&[8, 1, 9]));
        assert!(!tree.contains_subsequence_of(&[1, 2, 6]));
        assert!(!tree.contains_subsequence_of(&[2, 6, 7]));
        assert!(!tree.contains_subsequence_of(&[9, 8]));
    }

    #[test]
    fn test_prefix_becomes_witness() {
        let mut tree = FilteringTree::new();
        tree.insert(&[1, 2, 3, 4]);
        tree.insert(&[1, 2]);
        assert!(tree.contains_subsequence_of(&[1, 7, 2]));
    }

    #[test]
    fn test_check_with_expansion() {
        let mut tree = FilteringTree::new();
        tree.insert(&[4, 5]);
        tree.insert(&[7, 1, 2]);
        // [3, 4, 5] already holds [4, 5]
        assert_eq!(tree.check(&[3, 4, 5], 9), EmergingStatus::EmergingWithoutExpansion);
        // 7 + [0, 1, 2] holds [7, 1, 2] through the expansion
        assert_eq!(tree.check(&[0, 1, 2], 7), EmergingStatus::EmergingWithExpansion);
        assert_eq!(tree.check(&[0, 1, 2], 8), EmergingStatus::NoEmergingSubset);
        tree.insert(&[6, 2]);
        assert_eq!(tree.check(&[2], 6), EmergingStatus::EmergingWithExpansion);
    }

    #[test]
    fn test_minimal_sequences_form_an_antichain() {
        let collected = vec![vec![1, 2, 3], vec![2, 3], vec![4, 1, 2, 3], vec![3, 2], vec![2, 3]];
        let (tree, minimal) = minimal_sequences(collected);
        assert_eq!(minimal, vec![vec![2, 3], vec![3, 2]]);
        assert_eq!(tree.len(), 2);
    }
}
