//! Growing a sequence by one item and deciding what to do with the result.
//!
//! A [`SequenceState`] is immutable. [`SequenceState::expand`] prepends an
//! item, propagates the occurrences of both collections and answers a single
//! [`ExpandStatus`]: either the child state to explore, or why the branch stops.

use crate::collector::{prepend, EmergingStatus, PrefixFilter, ResultsCollector};
use crate::config::MiningConfig;
use crate::dataset::{Collection, Item, TransactionStore};
use crate::occurrences::Occurrences;
use crate::stats::MiningStats;
use bit_set::BitSet;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything shared by the states of one run.
pub struct MiningContext {
    pub store: Arc<TransactionStore>,
    pub pos_freq_lower_bound: usize,
    pub neg_freq_upper_bound: usize,
    pub gap: usize,
    pub collector: Arc<dyn ResultsCollector>,
    /// Set when backscan pruning is enabled.
    pub prefix: Option<Arc<PrefixFilter>>,
    pub stats: Arc<MiningStats>,
    pub prune_siblings: bool,
}

impl MiningContext {
    pub fn new(
        store: Arc<TransactionStore>,
        config: &MiningConfig,
        collector: Arc<dyn ResultsCollector>,
        prefix: Option<Arc<PrefixFilter>>,
        stats: Arc<MiningStats>,
    ) -> Self {
        Self {
            store,
            pos_freq_lower_bound: config.pos_freq_lower_bound,
            neg_freq_upper_bound: config.neg_freq_upper_bound,
            gap: config.gap_constraint,
            collector,
            prefix,
            stats,
            prune_siblings: config.prune_siblings,
        }
    }
}

/// Transactions where the sequence occurs, with its occurrences in each.
struct Tracked<O> {
    tids: Vec<u32>,
    occurrences: Vec<Arc<O>>,
}

impl<O> Tracked<O> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            tids: Vec::with_capacity(capacity),
            occurrences: Vec::with_capacity(capacity),
        }
    }

    fn support(&self) -> usize {
        self.tids.len()
    }
}

pub enum ExpandStatus<O> {
    /// Not emerging but may lead to emerging sequences.
    Continue(SequenceState<O>),
    /// Positive support fell below the bound.
    Infrequent,
    /// No extension can lead to a new minimal emerging sequence.
    DeadEnd,
    /// Emerging and handed to the collector, siblings go on.
    Emerging,
    /// The parent already holds a known emerging sequence, stop every sibling.
    EmergingParent,
    /// Always followed by the same item in every occurrence, pruned silently.
    BackScan,
}

impl<O> fmt::Debug for ExpandStatus<O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExpandStatus::Continue(state) => write!(f, "Continue({:?})", state.sequence),
            ExpandStatus::Infrequent => f.write_str("Infrequent"),
            ExpandStatus::DeadEnd => f.write_str("DeadEnd"),
            ExpandStatus::Emerging => f.write_str("Emerging"),
            ExpandStatus::EmergingParent => f.write_str("EmergingParent"),
            ExpandStatus::BackScan => f.write_str("BackScan"),
        }
    }
}

/// A sequence under exploration with its occurrences and candidate extensions.
pub struct SequenceState<O> {
    ctx: Arc<MiningContext>,
    /// `sequence[0]` is the most recently prepended item.
    sequence: Vec<Item>,
    // None for the empty root sequence, which occurs everywhere
    positive: Option<Tracked<O>>,
    negative: Option<Tracked<O>>,
    /// Sorted items found in the gap windows of enough positive transactions.
    extensions: Vec<Item>,
    // extensions that make the sequence emerging once prepended
    neg_absent: BitSet,
}

impl<O: Occurrences> SequenceState<O> {
    /// The empty sequence, every kept item is a candidate.
    pub fn root(ctx: Arc<MiningContext>) -> Self {
        let extensions = (0..ctx.store.item_count() as Item).collect();
        Self {
            ctx,
            sequence: Vec::new(),
            positive: None,
            negative: None,
            extensions,
            neg_absent: BitSet::new(),
        }
    }

    pub fn sequence(&self) -> &[Item] {
        &self.sequence
    }

    pub fn extensions(&self) -> &[Item] {
        &self.extensions
    }

    pub fn context(&self) -> &Arc<MiningContext> {
        &self.ctx
    }

    pub fn is_root(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn positive_support(&self) -> usize {
        self.positive
            .as_ref()
            .map_or(self.ctx.store.positive().len(), Tracked::support)
    }

    pub fn negative_support(&self) -> usize {
        self.negative
            .as_ref()
            .map_or(self.ctx.store.negative().len(), Tracked::support)
    }

    /// Prepends `item`. Candidates in `denied` are not carried over to the child.
    pub fn expand(&self, item: Item, denied: &BitSet) -> ExpandStatus<O> {
        let ctx = &*self.ctx;
        let store = &*ctx.store;
        let pos_bound = ctx.pos_freq_lower_bound;
        let neg_bound = ctx.neg_freq_upper_bound;

        let positive = match self.propagate(store.positive(), self.positive.as_ref(), item, |found, remaining| {
            found + remaining >= pos_bound
        }) {
            Some(positive) if positive.support() >= pos_bound => positive,
            _ => {
                ctx.stats.inc_infrequent();
                return ExpandStatus::Infrequent;
            }
        };

        let negative = if self.neg_absent.contains(item as usize) || store.negative().support(item) <= neg_bound {
            None
        } else {
            self.propagate(store.negative(), self.negative.as_ref(), item, |found, remaining| {
                found + remaining > neg_bound
            })
            .filter(|negative| negative.support() > neg_bound)
        };
        let negative = match negative {
            Some(negative) => negative,
            None => return self.emerging(item),
        };

        if O::TRACKS_PROVENANCE {
            if let Some(prefix) = &ctx.prefix {
                if let Some(follow) = self.back_scan(&positive, &negative) {
                    prefix.collect(&self.sequence, item, &follow);
                    ctx.stats.inc_backscan_pruning();
                    return ExpandStatus::BackScan;
                }
            }
        }

        match ctx.collector.has_potential(&self.sequence, item) {
            EmergingStatus::EmergingWithoutExpansion => return ExpandStatus::EmergingParent,
            EmergingStatus::EmergingWithExpansion => {
                ctx.stats.inc_contains_emerging_pruning();
                return ExpandStatus::DeadEnd;
            }
            EmergingStatus::NewEmerging | EmergingStatus::NoEmergingSubset => {}
        }

        let extensions = self.frequent_window_items(&positive, denied);
        let mut neg_absent = BitSet::new();
        for &candidate in &extensions {
            if !self.reaches(store.negative(), &negative, candidate, neg_bound + 1) {
                neg_absent.insert(candidate as usize);
            }
        }
        if extensions.is_empty() {
            ctx.stats.inc_dead_end();
            return ExpandStatus::DeadEnd;
        }

        ExpandStatus::Continue(SequenceState {
            ctx: Arc::clone(&self.ctx),
            sequence: prepend(item, &self.sequence),
            positive: Some(positive),
            negative: Some(negative),
            extensions,
            neg_absent,
        })
    }

    fn emerging(&self, item: Item) -> ExpandStatus<O> {
        self.ctx.stats.inc_emerging();
        match self.ctx.collector.collect(&self.sequence, item) {
            EmergingStatus::EmergingWithoutExpansion => ExpandStatus::EmergingParent,
            _ => ExpandStatus::Emerging,
        }
    }

    /// Occurrences of `item + sequence` in `collection`. Gives up, returning
    /// `None`, when `keep_going(found, remaining)` turns false.
    fn propagate<F>(&self, collection: &Collection, tracked: Option<&Tracked<O>>, item: Item, keep_going: F) -> Option<Tracked<O>>
    where
        F: Fn(usize, usize) -> bool,
    {
        let gap = self.ctx.gap;
        let total = tracked.map_or(collection.len(), Tracked::support);
        let mut result = Tracked::with_capacity(total);
        for index in 0..total {
            let (tid, parent) = match tracked {
                Some(tracked) => (tracked.tids[index], Some(&tracked.occurrences[index])),
                None => (index as u32, None),
            };
            if let Some(positions) = collection.positions(item, tid as usize) {
                let occurrences = match parent {
                    Some(parent) => O::extend(parent, positions, gap),
                    None => Some(O::seed(positions, gap)),
                };
                if let Some(occurrences) = occurrences {
                    result.tids.push(tid);
                    result.occurrences.push(Arc::new(occurrences));
                }
            }
            if !keep_going(result.support(), total - index - 1) {
                return None;
            }
        }
        Some(result)
    }

    /// Items that can be prepended in enough positive transactions, sorted.
    fn frequent_window_items(&self, positive: &Tracked<O>, denied: &BitSet) -> Vec<Item> {
        let collection = self.ctx.store.positive();
        let mut counts: HashMap<usize, usize> = HashMap::new();
        let mut items = BitSet::new();
        for (&tid, occurrences) in positive.tids.iter().zip(&positive.occurrences) {
            items.clear();
            occurrences.window_items(collection.transaction(tid as usize), self.ctx.gap, &mut items);
            for item in items.iter() {
                *counts.entry(item).or_insert(0) += 1;
            }
        }
        let mut extensions: Vec<Item> = counts
            .into_iter()
            .filter(|&(item, count)| count >= self.ctx.pos_freq_lower_bound && !denied.contains(item))
            .map(|(item, _)| item as Item)
            .collect();
        extensions.sort_unstable();
        extensions
    }

    /// Whether `item` can be prepended in at least `threshold` tracked transactions.
    fn reaches(&self, collection: &Collection, tracked: &Tracked<O>, item: Item, threshold: usize) -> bool {
        let total = tracked.support();
        let mut found = 0;
        for (index, (&tid, occurrences)) in tracked.tids.iter().zip(&tracked.occurrences).enumerate() {
            if found >= threshold {
                return true;
            }
            if found + (total - index) < threshold {
                return false;
            }
            if let Some(positions) = collection.positions(item, tid as usize) {
                if occurrences.accepts(positions, self.ctx.gap) {
                    found += 1;
                }
            }
        }
        found >= threshold
    }

    /// Items found right after the last item, within the gap, in every
    /// occurrence of both collections.
    fn back_scan(&self, positive: &Tracked<O>, negative: &Tracked<O>) -> Option<BitSet> {
        let store = &*self.ctx.store;
        let mut common = None;
        for (collection, tracked) in [(store.positive(), positive), (store.negative(), negative)] {
            for (&tid, occurrences) in tracked.tids.iter().zip(&tracked.occurrences) {
                let transaction = collection.transaction(tid as usize);
                if !occurrences.narrow_back_space(transaction, self.ctx.gap, &mut common) {
                    return None;
                }
            }
        }
        common.filter(|common| !common.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpandStatus, MiningContext, SequenceState};
    use crate::collector::{PostFilteringCollector, PrefixFilter, ResultsCollector};
    use crate::config::MiningConfig;
    use crate::dataset::TransactionStore;
    use crate::occurrences::{BitOccurrences, Occurrences, PositionList};
    use crate::stats::MiningStats;
    use bit_set::BitSet;
    use std::sync::Arc;

    fn context(
        positive: Vec<Vec<u32>>,
        negative: Vec<Vec<u32>>,
        item_count: usize,
        config: MiningConfig,
    ) -> (Arc<MiningContext>, Arc<PostFilteringCollector>) {
        let store = Arc::new(TransactionStore::new(positive, negative, item_count));
        let prefix = if config.backscan {
            Some(Arc::new(PrefixFilter::new()))
        } else {
            None
        };
        let collector = Arc::new(PostFilteringCollector::new(prefix.clone()));
        let ctx = MiningContext::new(store, &config, collector.clone(), prefix, Arc::new(MiningStats::new()));
        (Arc::new(ctx), collector)
    }

    fn expect_continue<O: Occurrences>(status: ExpandStatus<O>) -> SequenceState<O> {
        match status {
            ExpandStatus::Continue(state) => state,
            other => panic!("expected a child state, got {:?}", other),
        }
    }

    fn small_dataset(gap: usize) -> (Arc<MiningContext>, Arc<PostFilteringCollector>) {
        // 0 1 2 / 1 0 2 against 2 1 0
        context(
            vec![vec![0, 1, 2], vec![1, 0, 2]],
            vec![vec![2, 1, 0]],
            3,
            MiningConfig::new(2, 0, gap),
        )
    }

    #[test]
    fn test_expand_to_emerging() {
        let (ctx, collector) = small_dataset(1);
        let root = SequenceState::<PositionList>::root(ctx);
        assert_eq!(root.extensions(), &[0, 1, 2]);

        let two = expect_continue(root.expand(2, &BitSet::new()));
        assert_eq!(two.sequence(), &[2]);
        assert_eq!(two.extensions(), &[0, 1]);
        assert_eq!((two.positive_support(), two.negative_support()), (2, 1));

        assert!(matches!(two.expand(0, &BitSet::new()), ExpandStatus::Emerging));
        assert!(matches!(two.expand(1, &BitSet::new()), ExpandStatus::Emerging));
        assert_eq!(collector.collected(), 2);
        let mut minimal = collector.finish();
        minimal.sort();
        assert_eq!(minimal, vec![vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn test_dead_end_without_candidates() {
        let (ctx, _) = small_dataset(0);
        let root = SequenceState::<BitOccurrences>::root(ctx);
        // 0 and 1 each precede 2 in a single positive transaction
        assert!(matches!(root.expand(2, &BitSet::new()), ExpandStatus::DeadEnd));
    }

    #[test]
    fn test_infrequent_and_denied() {
        let (ctx, _) = small_dataset(1);
        let root = SequenceState::<PositionList>::root(ctx);
        let two = expect_continue(root.expand(2, &BitSet::new()));
        // 2 never precedes 2
        assert!(matches!(two.expand(2, &BitSet::new()), ExpandStatus::Infrequent));

        let denied: BitSet = [1].iter().copied().collect();
        let two = expect_continue(root.expand(2, &denied));
        assert_eq!(two.extensions(), &[0]);
    }

    #[test]
    fn test_back_scan() {
        // a b c / a b c against a b c / b a, gap 0
        let positive = vec![vec![0, 1, 2], vec![0, 1, 2]];
        let negative = vec![vec![0, 1, 2], vec![1, 0]];
        let mut config = MiningConfig::new(2, 0, 0);
        config.backscan = true;
        let (ctx, _) = context(positive.clone(), negative.clone(), 3, config);
        let root = SequenceState::<PositionList>::root(Arc::clone(&ctx));
        // b is followed by c or a
        let b = expect_continue(root.expand(1, &BitSet::new()));
        assert_eq!(b.extensions(), &[0]);
        // every occurrence of "a b" is followed by c
        assert!(matches!(b.expand(0, &BitSet::new()), ExpandStatus::BackScan));
        assert_eq!(ctx.prefix.as_ref().map(|prefix| prefix.len()), Some(1));

        let (ctx, _) = context(positive, negative, 3, MiningConfig::new(2, 0, 0));
        let root = SequenceState::<PositionList>::root(ctx);
        let b = expect_continue(root.expand(1, &BitSet::new()));
        assert!(matches!(b.expand(0, &BitSet::new()), ExpandStatus::DeadEnd));
    }
}
