use super::{back_space, narrow, Occurrences};
use crate::dataset::Item;
use bit_set::BitSet;
use std::sync::Arc;

/// Range `[first, last)` of the parent's entries an occurrence descends from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Provenance {
    pub first: u32,
    pub last: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Position {
    pub pos: u32,
    /// `None` for the occurrences of a one-item sequence.
    pub provenance: Option<Provenance>,
}

/// Descending positions, each one pointing back into the parent list it was matched against.
#[derive(Debug)]
pub struct PositionList {
    entries: Box<[Position]>,
    parent: Option<Arc<PositionList>>,
}

impl PositionList {
    pub fn entries(&self) -> &[Position] {
        &self.entries
    }

    pub fn parent(&self) -> Option<&Arc<PositionList>> {
        self.parent.as_ref()
    }

    // Follows `entry` back to the one-item occurrences it comes from and
    // narrows `common` with what follows each of them.
    fn trace_back(
        &self,
        entry: &Position,
        transaction: &[Item],
        gap: usize,
        visited: &mut Vec<u32>,
        depth: usize,
        common: &mut Option<BitSet>,
    ) -> bool {
        let (provenance, parent) = match (entry.provenance, &self.parent) {
            (Some(provenance), Some(parent)) => (provenance, parent),
            _ => return narrow(common, back_space(transaction, entry.pos, gap)),
        };
        if visited.len() <= depth {
            visited.resize(depth + 1, 0);
        }
        // ranges only move forward, entries before visited[depth] were already traced
        for i in visited[depth].max(provenance.first)..provenance.last {
            let origin = &parent.entries[i as usize];
            if !parent.trace_back(origin, transaction, gap, visited, depth + 1, common) {
                return false;
            }
        }
        visited[depth] = provenance.last;
        true
    }
}

/// Calls `hit(position, anchor)` for every position in the gap window of an
/// anchor, `anchor` being the index of the rightmost such anchor.
/// Both slices are descending. Stops when `hit` returns `false`.
fn for_each_in_window<F>(anchors: &[Position], positions: &[u32], gap: usize, mut hit: F)
where
    F: FnMut(u32, usize) -> bool,
{
    let mut anchor = 0;
    let mut end = match anchors.first() {
        Some(first) => i64::from(first.pos), // exclusive
        None => return,
    };
    let mut start = end - 1 - gap as i64; // inclusive
    for &pos in positions {
        let p = i64::from(pos);
        while p < start {
            anchor += 1;
            match anchors.get(anchor) {
                Some(next) => {
                    end = i64::from(next.pos);
                    start = end - 1 - gap as i64;
                }
                None => return,
            }
        }
        if p < end && !hit(pos, anchor) {
            return;
        }
    }
}

impl Occurrences for PositionList {
    const TRACKS_PROVENANCE: bool = true;

    fn seed(positions: &[u32], _gap: usize) -> Self {
        Self {
            entries: positions
                .iter()
                .map(|&pos| Position { pos, provenance: None })
                .collect(),
            parent: None,
        }
    }

    fn extend(parent: &Arc<Self>, positions: &[u32], gap: usize) -> Option<Self> {
        let anchors = &parent.entries;
        let mut entries = Vec::new();
        for_each_in_window(anchors, positions, gap, |pos, first| {
            // every later anchor still right of `pos` also has it in its window
            let mut last = first + 1;
            while last < anchors.len() && anchors[last].pos > pos {
                last += 1;
            }
            entries.push(Position {
                pos,
                provenance: Some(Provenance {
                    first: first as u32,
                    last: last as u32,
                }),
            });
            true
        });
        if entries.is_empty() {
            None
        } else {
            Some(Self {
                entries: entries.into_boxed_slice(),
                parent: Some(Arc::clone(parent)),
            })
        }
    }

    fn accepts(&self, positions: &[u32], gap: usize) -> bool {
        let mut found = false;
        for_each_in_window(&self.entries, positions, gap, |_, _| {
            found = true;
            false
        });
        found
    }

    fn positions(&self) -> Vec<u32> {
        self.entries.iter().map(|entry| entry.pos).collect()
    }

    fn narrow_back_space(&self, transaction: &[Item], gap: usize, common: &mut Option<BitSet>) -> bool {
        let mut visited = Vec::new();
        self.entries
            .iter()
            .all(|entry| self.trace_back(entry, transaction, gap, &mut visited, 0, common))
    }
}
