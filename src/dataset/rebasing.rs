use super::Item;
use std::collections::HashMap;

/// Two-way mapping between dense item ids and the labels read from the input.
#[derive(Clone, Debug, Default)]
pub struct Rebasing {
    labels: Vec<String>,
    ids: HashMap<String, Item>,
}

impl Rebasing {
    /// `labels[i]` becomes item `i`.
    pub fn new(labels: Vec<String>) -> Self {
        let ids = labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.clone(), id as Item))
            .collect();
        Self { labels, ids }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, item: Item) -> Option<&str> {
        self.labels.get(item as usize).map(String::as_str)
    }

    pub fn item(&self, label: &str) -> Option<Item> {
        self.ids.get(label).copied()
    }

    /// Maps a dense sequence back to its labels.
    pub fn labels_of(&self, sequence: &[Item]) -> Vec<String> {
        sequence
            .iter()
            .filter_map(|&item| self.label(item))
            .map(str::to_string)
            .collect()
    }
}
