use super::Occurrences;
use crate::dataset::{Item, FILTERED};
use bit_set::BitSet;
use std::sync::Arc;

/// Tracked positions as a bitset, plus the union of their gap windows.
///
/// Cheaper to intersect than position lists, but keeps no provenance.
#[derive(Debug)]
pub struct BitOccurrences {
    hits: BitSet,
    // positions a prepended item may occupy
    zone: BitSet,
}

impl BitOccurrences {
    fn from_hits(hits: BitSet, gap: usize) -> Self {
        let mut zone = BitSet::new();
        for anchor in hits.iter() {
            for pos in anchor.saturating_sub(gap + 1)..anchor {
                zone.insert(pos);
            }
        }
        Self { hits, zone }
    }
}

impl Occurrences for BitOccurrences {
    const TRACKS_PROVENANCE: bool = false;

    fn seed(positions: &[u32], gap: usize) -> Self {
        Self::from_hits(positions.iter().map(|&pos| pos as usize).collect(), gap)
    }

    fn extend(parent: &Arc<Self>, positions: &[u32], gap: usize) -> Option<Self> {
        let hits: BitSet = positions
            .iter()
            .map(|&pos| pos as usize)
            .filter(|&pos| parent.zone.contains(pos))
            .collect();
        if hits.is_empty() {
            None
        } else {
            Some(Self::from_hits(hits, gap))
        }
    }

    fn accepts(&self, positions: &[u32], _gap: usize) -> bool {
        positions.iter().any(|&pos| self.zone.contains(pos as usize))
    }

    fn window_items(&self, transaction: &[Item], _gap: usize, items: &mut BitSet) {
        for pos in self.zone.iter() {
            match transaction.get(pos) {
                Some(&item) if item != FILTERED => {
                    items.insert(item as usize);
                }
                _ => {}
            }
        }
    }

    fn positions(&self) -> Vec<u32> {
        let mut positions: Vec<u32> = self.hits.iter().map(|pos| pos as u32).collect();
        positions.reverse();
        positions
    }

    fn narrow_back_space(&self, _transaction: &[Item], _gap: usize, common: &mut Option<BitSet>) -> bool {
        // origins are not kept, nothing can be proven
        *common = Some(BitSet::new());
        false
    }
}
