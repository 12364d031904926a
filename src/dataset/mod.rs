//! Immutable transaction collections and the per-item position index.

pub mod loader;
pub mod rebasing;

pub use self::loader::{DatasetLoader, LoadedDataset};
pub use self::rebasing::Rebasing;

/// Dense item id, see [`Rebasing`].
pub type Item = u32;

/// Placeholder for a dropped item: it matches nothing but still occupies its position.
pub const FILTERED: Item = Item::MAX;

type Positions = Box<[u32]>;

/// One collection of transactions, positive or negative.
#[derive(Debug)]
pub struct Collection {
    transactions: Vec<Box<[Item]>>,
    // index[item][transaction], positions in descending order
    index: Vec<Vec<Option<Positions>>>,
    support: Vec<usize>,
}

impl Collection {
    /// Builds the collection from rebased transactions.
    ///
    /// Ids at or above `item_count` are stored as [`FILTERED`].
    pub fn new(transactions: Vec<Vec<Item>>, item_count: usize) -> Self {
        let nb_transactions = transactions.len();
        let mut index: Vec<Vec<Option<Vec<u32>>>> = vec![Vec::new(); item_count];
        let mut kept = Vec::with_capacity(nb_transactions);

        for (tid, mut transaction) in transactions.into_iter().enumerate() {
            for (pos, item) in transaction.iter_mut().enumerate().rev() {
                if *item == FILTERED {
                    continue;
                }
                if *item as usize >= item_count {
                    *item = FILTERED;
                    continue;
                }
                let per_transaction = &mut index[*item as usize];
                if per_transaction.is_empty() {
                    per_transaction.resize(nb_transactions, None);
                }
                per_transaction[tid].get_or_insert_with(Vec::new).push(pos as u32);
            }
            kept.push(transaction.into_boxed_slice());
        }

        let index: Vec<Vec<Option<Positions>>> = index
            .into_iter()
            .map(|per_transaction| {
                per_transaction
                    .into_iter()
                    .map(|positions| positions.map(Vec::into_boxed_slice))
                    .collect()
            })
            .collect();
        let support = index
            .iter()
            .map(|per_transaction| per_transaction.iter().filter(|p| p.is_some()).count())
            .collect();

        Self {
            transactions: kept,
            index,
            support,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transaction(&self, tid: usize) -> &[Item] {
        &self.transactions[tid]
    }

    /// Positions of `item` in transaction `tid`, last occurrence first.
    pub fn positions(&self, item: Item, tid: usize) -> Option<&[u32]> {
        self.index
            .get(item as usize)
            .and_then(|per_transaction| per_transaction.get(tid))
            .and_then(|positions| positions.as_deref())
    }

    /// Number of transactions containing `item`.
    pub fn support(&self, item: Item) -> usize {
        self.support.get(item as usize).copied().unwrap_or(0)
    }
}

/// Both collections, shared read-only by every sequence state.
#[derive(Debug)]
pub struct TransactionStore {
    positive: Collection,
    negative: Collection,
    item_count: usize,
}

impl TransactionStore {
    pub fn new(positive: Vec<Vec<Item>>, negative: Vec<Vec<Item>>, item_count: usize) -> Self {
        Self {
            positive: Collection::new(positive, item_count),
            negative: Collection::new(negative, item_count),
            item_count,
        }
    }

    pub fn positive(&self) -> &Collection {
        &self.positive
    }

    pub fn negative(&self) -> &Collection {
        &self.negative
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }
}
