use super::{minimal_sequences, prepend, EmergingStatus, PrefixFilter, ResultsCollector};
use crate::dataset::Item;
use parking_lot::Mutex;
use std::mem;
use std::sync::Arc;
use tracing::debug;

/// Keeps every emerging sequence and filters them once the search is over.
pub struct PostFilteringCollector {
    collected: Mutex<Vec<Vec<Item>>>,
    prefix: Option<Arc<PrefixFilter>>,
}

impl PostFilteringCollector {
    pub fn new(prefix: Option<Arc<PrefixFilter>>) -> Self {
        Self {
            collected: Mutex::new(Vec::new()),
            prefix,
        }
    }
}

impl ResultsCollector for PostFilteringCollector {
    fn collect(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        let full = prepend(expansion, sequence);
        self.collected.lock().push(full);
        EmergingStatus::NewEmerging
    }

    fn has_potential(&self, _sequence: &[Item], _expansion: Item) -> EmergingStatus {
        EmergingStatus::NoEmergingSubset
    }

    fn collected(&self) -> usize {
        self.collected.lock().len()
    }

    fn finish(&self) -> Vec<Vec<Item>> {
        let mut collected = mem::take(&mut *self.collected.lock());
        if let Some(prefix) = self.prefix.as_ref().filter(|prefix| !prefix.is_empty()) {
            let trie = prefix.build();
            let mut stripped = 0;
            for sequence in &mut collected {
                let kept = trie.strip(sequence);
                if kept < sequence.len() {
                    sequence.truncate(kept);
                    stripped += 1;
                }
            }
            debug!("{} backscan records stripped {} sequences", prefix.len(), stripped);
        }
        minimal_sequences(collected).1
    }
}
