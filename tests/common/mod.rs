//! Brute-force reference for small datasets.

use std::collections::{BTreeSet, HashSet};

pub type Rows = Vec<Vec<String>>;

pub fn rows(text: &str) -> Rows {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn occurs_from(row: &[String], sequence: &[String], gap: usize, pos: usize) -> bool {
    if row[pos] != sequence[0] {
        return false;
    }
    if sequence.len() == 1 {
        return true;
    }
    (pos + 1..(pos + gap + 2).min(row.len())).any(|next| occurs_from(row, &sequence[1..], gap, next))
}

fn support(rows: &Rows, sequence: &[String], gap: usize) -> usize {
    rows.iter()
        .filter(|row| (0..row.len()).any(|pos| occurs_from(row, sequence, gap, pos)))
        .count()
}

/// Whether `small` is a subsequence of `large`, gaps ignored.
pub fn is_subsequence(small: &[String], large: &[String]) -> bool {
    let mut rest = large.iter();
    small.iter().all(|item| rest.any(|other| other == item))
}

/// Minimal emerging sequences of two items or more, sorted by length then items.
pub fn minimal_emerging(positive: &Rows, negative: &Rows, pos_bound: usize, neg_bound: usize, gap: usize) -> Vec<Vec<String>> {
    let labels: BTreeSet<&String> = positive.iter().flatten().collect();
    let kept: Vec<String> = labels
        .into_iter()
        .filter(|label| {
            let single = [label.to_string()];
            support(positive, &single, gap) >= pos_bound && support(negative, &single, gap) > neg_bound
        })
        .cloned()
        .collect();

    // grow to the left from non emerging, frequent suffixes
    let mut emerging = Vec::new();
    let mut todo: Vec<Vec<String>> = kept.iter().map(|label| vec![label.clone()]).collect();
    while let Some(suffix) = todo.pop() {
        for label in &kept {
            let mut sequence = vec![label.clone()];
            sequence.extend(suffix.iter().cloned());
            if support(positive, &sequence, gap) < pos_bound {
                continue;
            }
            if support(negative, &sequence, gap) <= neg_bound {
                emerging.push(sequence);
            } else {
                todo.push(sequence);
            }
        }
    }

    let unique: HashSet<Vec<String>> = emerging.iter().cloned().collect();
    let mut minimal: Vec<Vec<String>> = unique
        .iter()
        .filter(|sequence| {
            !unique
                .iter()
                .any(|other| other.len() < sequence.len() && is_subsequence(other, sequence))
        })
        .cloned()
        .collect();
    minimal.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    minimal
}

pub fn assert_antichain(patterns: &[Vec<String>]) {
    for (i, a) in patterns.iter().enumerate() {
        for (j, b) in patterns.iter().enumerate() {
            if i != j {
                assert!(!is_subsequence(a, b), "{:?} is held by {:?}", a, b);
            }
        }
    }
}
