//! Gathering emerging sequences and keeping only the minimal ones.
//!
//! Collectors receive a parent sequence and the item prepended to it. The
//! status they answer tells the search whether the parent itself already holds
//! a known emerging sequence, in which case every sibling is redundant too.

mod batch_filtering;
mod filtering_tree;
mod ordered;
mod post_filtering;
mod prefix;

pub use self::batch_filtering::BatchFilteringCollector;
pub use self::filtering_tree::{minimal_sequences, FilteringTree};
pub use self::ordered::OrderedCollector;
pub use self::post_filtering::PostFilteringCollector;
pub use self::prefix::{PrefixFilter, PrefixTrie};

use crate::dataset::Item;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EmergingStatus {
    /// Recorded, no known emerging sequence is contained in it.
    NewEmerging,
    /// The parent sequence alone holds a known emerging sequence.
    EmergingWithoutExpansion,
    /// A known emerging sequence is held once the expansion item is prepended.
    EmergingWithExpansion,
    NoEmergingSubset,
}

pub trait ResultsCollector: Send + Sync {
    /// Records `expansion + sequence`, found emerging.
    fn collect(&self, sequence: &[Item], expansion: Item) -> EmergingStatus;

    /// Whether `expansion + sequence`, not emerging itself, is worth growing.
    fn has_potential(&self, sequence: &[Item], expansion: Item) -> EmergingStatus;

    /// Number of sequences handed to [`ResultsCollector::collect`].
    fn collected(&self) -> usize;

    /// Drains the collector into its minimal emerging sequences.
    fn finish(&self) -> Vec<Vec<Item>>;
}

/// Final result of a run, with labels instead of dense item ids.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MiningOutput {
    /// Minimal emerging sequences of two items or more.
    pub patterns: Vec<Vec<String>>,
    /// Labels emerging by themselves.
    pub emerging_items: Vec<String>,
    pub total_collected: usize,
    /// Patterns and emerging items together.
    pub total_minimal: usize,
}

pub(crate) fn prepend(expansion: Item, sequence: &[Item]) -> Vec<Item> {
    let mut full = Vec::with_capacity(sequence.len() + 1);
    full.push(expansion);
    full.extend_from_slice(sequence);
    full
}
