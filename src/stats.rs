use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Run-wide counters, shared by reference between workers.
///
/// Nothing here influences the search, the numbers only feed the log.
#[derive(Debug, Default)]
pub struct MiningStats {
    expand: AtomicU64,
    seed_items_started: AtomicU64,
    emerging: AtomicU64,
    emerging_sibling_pruning: AtomicU64,
    contains_emerging_pruning: AtomicU64,
    backscan_pruning: AtomicU64,
    infrequent: AtomicU64,
    dead_end: AtomicU64,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StatsSnapshot {
    pub expand: u64,
    pub seed_items_started: u64,
    pub emerging: u64,
    pub emerging_sibling_pruning: u64,
    pub contains_emerging_pruning: u64,
    pub backscan_pruning: u64,
    pub infrequent: u64,
    pub dead_end: u64,
}

impl MiningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_expand(&self) {
        self.expand.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_seed_item_started(&self) {
        self.seed_items_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_emerging(&self) {
        self.emerging.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_emerging_sibling_pruning(&self) {
        self.emerging_sibling_pruning.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_contains_emerging_pruning(&self) {
        self.contains_emerging_pruning.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_backscan_pruning(&self) {
        self.backscan_pruning.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_infrequent(&self) {
        self.infrequent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dead_end(&self) {
        self.dead_end.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            expand: self.expand.load(Ordering::Relaxed),
            seed_items_started: self.seed_items_started.load(Ordering::Relaxed),
            emerging: self.emerging.load(Ordering::Relaxed),
            emerging_sibling_pruning: self.emerging_sibling_pruning.load(Ordering::Relaxed),
            contains_emerging_pruning: self.contains_emerging_pruning.load(Ordering::Relaxed),
            backscan_pruning: self.backscan_pruning.load(Ordering::Relaxed),
            infrequent: self.infrequent.load(Ordering::Relaxed),
            dead_end: self.dead_end.load(Ordering::Relaxed),
        }
    }

    /// Logs a snapshot every `interval` until `done` is raised.
    ///
    /// Meant to run on its own thread; unpark that thread after raising `done`
    /// to stop without waiting for the current period to elapse.
    pub fn report_every(&self, interval: Duration, done: &AtomicBool) {
        let start = Instant::now();
        let mut deadline = start + interval;
        while !done.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                info!(elapsed_secs = start.elapsed().as_secs(), "{}", self.snapshot());
                deadline = now + interval;
            } else {
                thread::park_timeout(deadline - now);
            }
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "expand: {} seedItemStarted: {} emerging: {} emergingSiblingsPruning: {} \
             containsEmergingPruning: {} backscanPruning: {} infrequent: {} deadEnd: {}",
            self.expand,
            self.seed_items_started,
            self.emerging,
            self.emerging_sibling_pruning,
            self.contains_emerging_pruning,
            self.backscan_pruning,
            self.infrequent,
            self.dead_end
        )
    }
}
