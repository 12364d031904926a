//! Mining minimal emerging sequential patterns under a gap constraint.
//!
//! A sequence is emerging when it occurs in at least `pos_freq_lower_bound`
//! transactions of the positive collection and in at most
//! `neg_freq_upper_bound` transactions of the negative one, consecutive items
//! of an occurrence being separated by at most `gap_constraint` other items.
//! Only the minimal ones are reported: no reported sequence holds another
//! emerging sequence as a subsequence.

pub mod collector;
pub mod config;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod expansion;
pub mod miner;
pub mod occurrences;
pub mod stats;

pub use crate::collector::{EmergingStatus, MiningOutput, ResultsCollector};
pub use crate::config::{Backend, Filtering, MiningConfig, Traversal};
pub use crate::dataset::{DatasetLoader, Item, LoadedDataset, Rebasing, TransactionStore};
pub use crate::error::{Error, Result};
pub use crate::expansion::{ExpandStatus, MiningContext, SequenceState};
pub use crate::miner::Miner;
pub use crate::stats::{MiningStats, StatsSnapshot};
