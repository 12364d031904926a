//! Driving expansions over worker threads.
//!
//! Work is a tree of [`MiningStep`] frames. A frame wraps one sequence state
//! and an atomic cursor over its extensions, so any number of workers can pull
//! extensions from the same frame.

mod breadth_first;
mod depth_first;

pub use self::breadth_first::BreadthFirstExecutor;
pub use self::depth_first::DepthFirstExecutor;

use crate::dataset::Item;
use crate::expansion::{ExpandStatus, SequenceState};
use crate::occurrences::Occurrences;
use bit_set::BitSet;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct MiningStep<O> {
    state: SequenceState<O>,
    cursor: AtomicUsize,
    // items emerging as siblings of this sequence, may grow while we run
    parent_denied: Option<Arc<Mutex<BitSet>>>,
    // items emerging once prepended to this sequence
    denied: Arc<Mutex<BitSet>>,
    inherit_denied: bool,
}

impl<O: Occurrences> MiningStep<O> {
    /// With `inherit_denied`, children start from a copy of their parent's denied items.
    pub fn root(state: SequenceState<O>, inherit_denied: bool) -> Self {
        Self {
            state,
            cursor: AtomicUsize::new(0),
            parent_denied: None,
            denied: Arc::new(Mutex::new(BitSet::new())),
            inherit_denied,
        }
    }

    fn child(&self, state: SequenceState<O>) -> Self {
        let prune_siblings = self.state.context().prune_siblings;
        let denied = if prune_siblings && self.inherit_denied {
            self.denied.lock().clone()
        } else {
            BitSet::new()
        };
        Self {
            state,
            cursor: AtomicUsize::new(0),
            parent_denied: if prune_siblings {
                Some(Arc::clone(&self.denied))
            } else {
                None
            },
            denied: Arc::new(Mutex::new(denied)),
            inherit_denied: self.inherit_denied,
        }
    }

    pub fn sequence(&self) -> &[Item] {
        self.state.sequence()
    }

    /// Expands the next unclaimed extensions until one gives a child frame.
    /// `None` once the frame is exhausted.
    pub fn next(&self) -> Option<Arc<MiningStep<O>>> {
        let ctx = self.state.context();
        let extensions = self.state.extensions();
        loop {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let item = *extensions.get(index)?;
            if let Some(parent_denied) = &self.parent_denied {
                if parent_denied.lock().contains(item as usize) {
                    ctx.stats.inc_emerging_sibling_pruning();
                    continue;
                }
            }
            ctx.stats.inc_expand();
            if self.state.is_root() {
                ctx.stats.inc_seed_item_started();
            }
            let denied = if ctx.prune_siblings {
                self.denied.lock().clone()
            } else {
                BitSet::new()
            };
            match self.state.expand(item, &denied) {
                ExpandStatus::Continue(state) => return Some(Arc::new(self.child(state))),
                ExpandStatus::Emerging => {
                    if ctx.prune_siblings {
                        self.denied.lock().insert(item as usize);
                    }
                }
                ExpandStatus::EmergingParent => {
                    // every remaining sibling holds the same known sequence
                    self.cursor.store(extensions.len(), Ordering::SeqCst);
                    return None;
                }
                ExpandStatus::Infrequent | ExpandStatus::DeadEnd | ExpandStatus::BackScan => {}
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn denied_items(&self) -> Vec<usize> {
        self.denied.lock().iter().collect()
    }
}
