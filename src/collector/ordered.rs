use super::{prepend, EmergingStatus, FilteringTree, ResultsCollector};
use crate::dataset::Item;
use parking_lot::Mutex;
use std::mem;

struct Minimal {
    tree: FilteringTree,
    sequences: Vec<Vec<Item>>,
    collected: usize,
}

/// Filters on the fly. Only sound when sequences arrive by non-decreasing
/// length, as they do in a breadth-first search.
pub struct OrderedCollector {
    minimal: Mutex<Minimal>,
}

impl OrderedCollector {
    pub fn new() -> Self {
        Self {
            minimal: Mutex::new(Minimal {
                tree: FilteringTree::new(),
                sequences: Vec::new(),
                collected: 0,
            }),
        }
    }
}

impl Default for OrderedCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsCollector for OrderedCollector {
    fn collect(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        let mut minimal = self.minimal.lock();
        minimal.collected += 1;
        match minimal.tree.check(sequence, expansion) {
            EmergingStatus::NoEmergingSubset => {
                let full = prepend(expansion, sequence);
                minimal.tree.insert(&full);
                minimal.sequences.push(full);
                EmergingStatus::NewEmerging
            }
            status => status,
        }
    }

    fn has_potential(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        self.minimal.lock().tree.check(sequence, expansion)
    }

    fn collected(&self) -> usize {
        self.minimal.lock().collected
    }

    fn finish(&self) -> Vec<Vec<Item>> {
        mem::take(&mut self.minimal.lock().sequences)
    }
}
