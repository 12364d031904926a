use super::{minimal_sequences, prepend, EmergingStatus, FilteringTree, ResultsCollector};
use crate::dataset::Item;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Pending {
    sequences: Vec<Vec<Item>>,
    since_batch: usize,
    rebuilding: bool,
}

/// Filters every `inter_batch_delay` collected sequences and prunes the search
/// with the latest filtered set meanwhile.
///
/// The rebuild runs on the thread that completed the batch, outside the lock;
/// sequences collected during it are kept and merged into the next batch.
pub struct BatchFilteringCollector {
    tree: ArcSwapOption<FilteringTree>,
    pending: Mutex<Pending>,
    inter_batch_delay: usize,
    collected: AtomicUsize,
}

impl BatchFilteringCollector {
    pub fn new(inter_batch_delay: usize) -> Self {
        Self {
            tree: ArcSwapOption::empty(),
            pending: Mutex::new(Pending::default()),
            inter_batch_delay: inter_batch_delay.max(1),
            collected: AtomicUsize::new(0),
        }
    }

    fn check(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        match &*self.tree.load() {
            Some(tree) => tree.check(sequence, expansion),
            None => EmergingStatus::NoEmergingSubset,
        }
    }

    fn rebuild(&self, batch: Vec<Vec<Item>>) {
        let (tree, minimal) = minimal_sequences(batch);
        debug!("filtering tree rebuilt with {} minimal sequences", minimal.len());
        self.tree.store(Some(Arc::new(tree)));
        let mut pending = self.pending.lock();
        let buffered = mem::replace(&mut pending.sequences, minimal);
        pending.sequences.extend(buffered);
        pending.rebuilding = false;
    }
}

impl ResultsCollector for BatchFilteringCollector {
    fn collect(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        self.collected.fetch_add(1, Ordering::Relaxed);
        match self.check(sequence, expansion) {
            EmergingStatus::NoEmergingSubset => {}
            status => return status,
        }
        let full = prepend(expansion, sequence);
        let batch = {
            let mut pending = self.pending.lock();
            pending.sequences.push(full);
            pending.since_batch += 1;
            if pending.since_batch >= self.inter_batch_delay && !pending.rebuilding {
                pending.since_batch = 0;
                pending.rebuilding = true;
                Some(mem::take(&mut pending.sequences))
            } else {
                None
            }
        };
        if let Some(batch) = batch {
            self.rebuild(batch);
        }
        EmergingStatus::NewEmerging
    }

    fn has_potential(&self, sequence: &[Item], expansion: Item) -> EmergingStatus {
        self.check(sequence, expansion)
    }

    fn collected(&self) -> usize {
        self.collected.load(Ordering::Relaxed)
    }

    fn finish(&self) -> Vec<Vec<Item>> {
        let pending = mem::take(&mut self.pending.lock().sequences);
        minimal_sequences(pending).1
    }
}
