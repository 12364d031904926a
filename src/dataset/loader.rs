//! Reading the two collections and preparing them for the search.
//!
//! Loading happens in three passes over the rows: positive support of every
//! label, negative support of the positively frequent ones, then rebasing and
//! index construction. Labels that are frequent in the positive collection and
//! rare enough in the negative one are emerging by themselves: they are
//! reported as singletons and dropped from the transactions like infrequent
//! labels, keeping their positions as [`FILTERED`] so gaps are still counted.

use super::{Item, Rebasing, TransactionStore, FILTERED};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type Row<'a> = Vec<&'a str>;

/// Output of a load: everything the search and the final report need.
#[derive(Clone, Debug)]
pub struct LoadedDataset {
    pub store: Arc<TransactionStore>,
    pub rebasing: Arc<Rebasing>,
    /// Labels emerging by themselves, sorted.
    pub emerging_items: Vec<String>,
    /// Bounds the labels were filtered with, a search must use the same.
    pub pos_freq_lower_bound: usize,
    pub neg_freq_upper_bound: usize,
}

#[derive(Clone, Debug)]
pub struct DatasetLoader {
    pos_freq_lower_bound: usize,
    neg_freq_upper_bound: usize,
    separator: Option<String>,
}

impl DatasetLoader {
    pub fn new(pos_freq_lower_bound: usize, neg_freq_upper_bound: usize) -> Self {
        Self {
            pos_freq_lower_bound,
            neg_freq_upper_bound,
            separator: None,
        }
    }

    /// Splits rows on `separator` instead of whitespace.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn load_files(&self, positive: &Path, negative: &Path) -> Result<LoadedDataset> {
        let positive_text = read(positive)?;
        let negative_text = read(negative)?;
        self.load_text(&positive_text, &negative_text)
    }

    /// One transaction per non-empty line.
    pub fn load_text(&self, positive: &str, negative: &str) -> Result<LoadedDataset> {
        let positive = self.split_rows(positive);
        let negative = self.split_rows(negative);
        self.load_rows(&positive, &negative)
    }

    pub fn load_rows<S: AsRef<str> + Sync>(&self, positive: &[Vec<S>], negative: &[Vec<S>]) -> Result<LoadedDataset> {
        if positive.is_empty() {
            return Err(Error::EmptyCollection("positive"));
        }
        if negative.is_empty() {
            return Err(Error::EmptyCollection("negative"));
        }
        let positive: Vec<Row> = positive.iter().map(|row| row.iter().map(|s| s.as_ref()).collect()).collect();
        let negative: Vec<Row> = negative.iter().map(|row| row.iter().map(|s| s.as_ref()).collect()).collect();

        // eliminate labels that are infrequent in the positive collection
        let mut pos_support = count_support(&positive);
        pos_support.retain(|_, support| *support >= self.pos_freq_lower_bound);

        let neg_support = count_support(&negative);
        let mut emerging_items = Vec::new();
        let mut kept = Vec::new();
        for (&label, &support) in &pos_support {
            let neg = neg_support.get(label).copied().unwrap_or(0);
            if neg <= self.neg_freq_upper_bound {
                emerging_items.push(label.to_string());
            } else {
                kept.push((label, neg, support));
            }
        }
        emerging_items.sort();

        // prioritize labels with low negative then low positive support
        kept.par_sort_unstable_by(|a, b| match a.1.cmp(&b.1) {
            Ordering::Equal => match a.2.cmp(&b.2) {
                Ordering::Equal => a.0.cmp(b.0),
                other => other,
            },
            other => other,
        });
        let rebasing = Rebasing::new(kept.iter().map(|&(label, _, _)| label.to_string()).collect());

        let positive = rebase(&positive, &rebasing);
        let negative = rebase(&negative, &rebasing);
        let store = TransactionStore::new(positive, negative, rebasing.len());

        info!(
            "{} frequent non emerging items in dataset and {} emerging items",
            rebasing.len(),
            emerging_items.len()
        );

        Ok(LoadedDataset {
            store: Arc::new(store),
            rebasing: Arc::new(rebasing),
            emerging_items,
            pos_freq_lower_bound: self.pos_freq_lower_bound,
            neg_freq_upper_bound: self.neg_freq_upper_bound,
        })
    }

    fn split_rows<'a>(&self, text: &'a str) -> Vec<Row<'a>> {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| match &self.separator {
                Some(separator) => line.split(separator.as_str()).filter(|s| !s.is_empty()).collect(),
                None => line.split_whitespace().collect(),
            })
            .collect()
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Number of rows containing each label at least once.
fn count_support<'a>(rows: &[Row<'a>]) -> HashMap<&'a str, usize> {
    rows.par_iter()
        .fold(HashMap::new, |mut counts, row| {
            let unique: HashSet<&str> = row.iter().copied().collect();
            for label in unique {
                *counts.entry(label).or_insert(0) += 1;
            }
            counts
        })
        .reduce(HashMap::new, |mut left, right| {
            for (label, count) in right {
                *left.entry(label).or_insert(0) += count;
            }
            left
        })
}

fn rebase(rows: &[Row], rebasing: &Rebasing) -> Vec<Vec<Item>> {
    rows.par_iter()
        .map(|row| {
            row.iter()
                .map(|label| rebasing.item(label).unwrap_or(FILTERED))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::DatasetLoader;
    use crate::dataset::FILTERED;
    use crate::error::Error;

    #[test]
    fn test_rebasing_order_and_emerging_items() {
        let positive = "a b c\nb a c\n\nd a\n";
        let negative = "c b a\nc\n";
        let loaded = DatasetLoader::new(2, 0).load_text(positive, negative).unwrap();

        assert_eq!((loaded.pos_freq_lower_bound, loaded.neg_freq_upper_bound), (2, 0));
        // d is infrequent, every other label appears in the negative collection
        assert!(loaded.emerging_items.is_empty());
        // neg support: a=1, b=1, c=2; pos support: a=3, b=2, c=2
        assert_eq!(loaded.rebasing.labels_of(&[0, 1, 2]), vec!["b", "a", "c"]);

        let store = &loaded.store;
        assert_eq!(store.positive().len(), 3);
        assert_eq!(store.negative().len(), 2);
        assert_eq!(store.positive().transaction(2), &[FILTERED, 1][..]);
        assert_eq!(store.negative().transaction(0), &[2, 0, 1][..]);
    }

    #[test]
    fn test_emerging_by_themselves() {
        let loaded = DatasetLoader::new(1, 0)
            .with_separator(",")
            .load_text("x,y\ny,z", "y,q")
            .unwrap();
        assert_eq!(loaded.emerging_items, vec!["x", "z"]);
        assert_eq!(loaded.rebasing.len(), 1);
        assert_eq!(loaded.store.positive().transaction(0), &[FILTERED, 0][..]);
    }

    #[test]
    fn test_empty_collection_fails() {
        let result = DatasetLoader::new(1, 0).load_text("a b", "\n\n");
        assert!(matches!(result, Err(Error::EmptyCollection("negative"))));
    }
}
