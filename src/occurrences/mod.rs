//! Where the current sequence occurs in one transaction.
//!
//! Sequences grow to the left: the tracked position of an occurrence is the
//! position of its first item, and the next item to prepend must sit in the
//! gap window `[a - 1 - gap, a - 1]` of some tracked position `a`.

mod bit_occurrences;
mod position_list;

pub use self::bit_occurrences::BitOccurrences;
pub use self::position_list::{Position, PositionList, Provenance};

use crate::dataset::{Item, FILTERED};
use bit_set::BitSet;
use std::sync::Arc;

/// Occurrence bookkeeping for one transaction, chosen once per run.
pub trait Occurrences: Sized + Send + Sync + 'static {
    /// Whether [`Occurrences::narrow_back_space`] can follow occurrences back to their origin.
    const TRACKS_PROVENANCE: bool;

    /// Occurrences of a one-item sequence, from the item's positions (descending).
    fn seed(positions: &[u32], gap: usize) -> Self;

    /// Occurrences of `item + sequence`, given the item's positions (descending).
    ///
    /// `None` when no position of the item falls in a gap window.
    fn extend(parent: &Arc<Self>, positions: &[u32], gap: usize) -> Option<Self>;

    /// Whether at least one of `positions` falls in a gap window.
    fn accepts(&self, positions: &[u32], gap: usize) -> bool;

    /// Tracked positions, descending.
    fn positions(&self) -> Vec<u32>;

    /// Adds to `items` every item lying in a gap window.
    fn window_items(&self, transaction: &[Item], gap: usize, items: &mut BitSet) {
        // windows of descending anchors only overlap with the previous one
        let mut covered = usize::MAX;
        for anchor in self.positions() {
            let anchor = anchor as usize;
            let start = anchor.saturating_sub(gap + 1);
            let end = anchor.min(covered);
            for &item in transaction.get(start..end).unwrap_or(&[]) {
                if item != FILTERED {
                    items.insert(item as usize);
                }
            }
            covered = start;
        }
    }

    /// Intersects `common` with the items following, within the gap, the last
    /// item of every occurrence. `None` stands for "not narrowed yet".
    ///
    /// Returns `false` as soon as `common` is empty.
    fn narrow_back_space(&self, transaction: &[Item], gap: usize, common: &mut Option<BitSet>) -> bool;
}

/// Items at most `gap` positions after `position`, the slot the next
/// right-hand item of a match would have to occupy.
pub(crate) fn back_space(transaction: &[Item], position: u32, gap: usize) -> BitSet {
    let start = position as usize + 1;
    let end = (start + gap + 1).min(transaction.len());
    let mut follow = BitSet::new();
    for &item in transaction.get(start..end).unwrap_or(&[]) {
        if item != FILTERED {
            follow.insert(item as usize);
        }
    }
    follow
}

/// Merges `follow` into `common`, returns whether anything is left.
pub(crate) fn narrow(common: &mut Option<BitSet>, follow: BitSet) -> bool {
    match common {
        Some(common) => {
            common.intersect_with(&follow);
            !common.is_empty()
        }
        None => {
            let empty = follow.is_empty();
            *common = Some(follow);
            !empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{back_space, BitOccurrences, Occurrences, PositionList};
    use crate::dataset::FILTERED;
    use bit_set::BitSet;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn positions_of(transaction: &[u32], item: u32) -> Vec<u32> {
        let mut positions: Vec<u32> = transaction
            .iter()
            .enumerate()
            .filter(|&(_, &x)| x == item)
            .map(|(pos, _)| pos as u32)
            .collect();
        positions.reverse();
        positions
    }

    /// Leftmost positions of every gap-constrained match of `sequence`.
    fn brute_force(transaction: &[u32], sequence: &[u32], gap: usize) -> BTreeSet<u32> {
        fn matches_from(transaction: &[u32], sequence: &[u32], gap: usize, pos: usize) -> bool {
            if transaction[pos] != sequence[0] {
                return false;
            }
            if sequence.len() == 1 {
                return true;
            }
            (pos + 1..(pos + gap + 2).min(transaction.len()))
                .any(|next| matches_from(transaction, &sequence[1..], gap, next))
        }
        (0..transaction.len())
            .filter(|&pos| matches_from(transaction, sequence, gap, pos))
            .map(|pos| pos as u32)
            .collect()
    }

    fn propagate<O: Occurrences>(transaction: &[u32], sequence: &[u32], gap: usize) -> Option<O> {
        let (&last, rest) = sequence.split_last()?;
        let seed = positions_of(transaction, last);
        if seed.is_empty() {
            return None;
        }
        let mut current = Arc::new(O::seed(&seed, gap));
        for &item in rest.iter().rev() {
            current = Arc::new(O::extend(&current, &positions_of(transaction, item), gap)?);
        }
        Arc::try_unwrap(current).ok()
    }

    fn check_against_brute_force<O: Occurrences>(transaction: &[u32], sequence: &[u32], gap: usize) {
        let expected = brute_force(transaction, sequence, gap);
        let found: BTreeSet<u32> = propagate::<O>(transaction, sequence, gap)
            .map(|occ| occ.positions().into_iter().collect())
            .unwrap_or_default();
        assert_eq!(found, expected, "{:?} in {:?} gap {}", sequence, transaction, gap);
    }

    #[test]
    fn test_gap_window() {
        // 0 1 2 3 4 5
        // a x b a x b
        let transaction = [0, 9, 1, 0, 9, 1];
        check_against_brute_force::<PositionList>(&transaction, &[0, 1], 0);
        check_against_brute_force::<PositionList>(&transaction, &[0, 1], 1);
        check_against_brute_force::<BitOccurrences>(&transaction, &[0, 1], 1);
        let occ = propagate::<PositionList>(&transaction, &[0, 1], 1).unwrap();
        assert_eq!(occ.positions(), vec![3, 0]);
        assert!(propagate::<PositionList>(&transaction, &[0, 1], 0).is_none());
    }

    #[test]
    fn test_window_items() {
        // 0 1 2 3 4 5 6
        // a b c d b e b, windows of "b" with gap 1
        let transaction = [0, 1, 2, 3, 1, 4, 1];
        let b = positions_of(&transaction, 1);
        let mut items = BitSet::new();
        PositionList::seed(&b, 1).window_items(&transaction, 1, &mut items);
        assert_eq!(items.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

        let mut items = BitSet::new();
        BitOccurrences::seed(&b, 0).window_items(&transaction, 0, &mut items);
        assert_eq!(items.iter().collect::<Vec<_>>(), vec![0, 3, 4]);
    }

    #[test]
    fn test_back_space() {
        let transaction = [0, 1, FILTERED, 2, 3];
        let follow = back_space(&transaction, 0, 1);
        assert_eq!(follow.iter().collect::<Vec<_>>(), vec![1]);
        let follow = back_space(&transaction, 1, 2);
        assert_eq!(follow.iter().collect::<Vec<_>>(), vec![2, 3]);
        assert!(back_space(&transaction, 4, 3).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn position_list_matches_brute_force(
            transaction in prop::collection::vec(0u32..4, 1..14),
            sequence in prop::collection::vec(0u32..4, 1..4),
            gap in 0usize..3,
        ) {
            check_against_brute_force::<PositionList>(&transaction, &sequence, gap);
        }

        #[test]
        fn bitset_matches_brute_force(
            transaction in prop::collection::vec(0u32..4, 1..14),
            sequence in prop::collection::vec(0u32..4, 1..4),
            gap in 0usize..3,
        ) {
            check_against_brute_force::<BitOccurrences>(&transaction, &sequence, gap);
        }

        #[test]
        fn accepts_agrees_with_extend(
            transaction in prop::collection::vec(0u32..3, 1..12),
            sequence in prop::collection::vec(0u32..3, 1..3),
            item in 0u32..3,
            gap in 0usize..3,
        ) {
            if let Some(occ) = propagate::<PositionList>(&transaction, &sequence, gap) {
                let occ = Arc::new(occ);
                let positions = positions_of(&transaction, item);
                prop_assert_eq!(
                    occ.accepts(&positions, gap),
                    PositionList::extend(&occ, &positions, gap).is_some()
                );
            }
        }

        #[test]
        fn window_items_are_the_accepted_items(
            transaction in prop::collection::vec(0u32..4, 1..12),
            sequence in prop::collection::vec(0u32..4, 1..3),
            gap in 0usize..3,
        ) {
            if let Some(occ) = propagate::<PositionList>(&transaction, &sequence, gap) {
                let accepted: Vec<usize> = (0u32..4)
                    .filter(|&item| occ.accepts(&positions_of(&transaction, item), gap))
                    .map(|item| item as usize)
                    .collect();
                let mut items = BitSet::new();
                occ.window_items(&transaction, gap, &mut items);
                prop_assert_eq!(items.iter().collect::<Vec<_>>(), accepted.clone());

                let bits = propagate::<BitOccurrences>(&transaction, &sequence, gap).unwrap();
                let mut items = BitSet::new();
                bits.window_items(&transaction, gap, &mut items);
                prop_assert_eq!(items.iter().collect::<Vec<_>>(), accepted);
            }
        }
    }
}
