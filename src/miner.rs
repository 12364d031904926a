use crate::collector::{
    BatchFilteringCollector, MiningOutput, OrderedCollector, PostFilteringCollector, PrefixFilter, ResultsCollector,
};
use crate::config::{Backend, Filtering, MiningConfig, Traversal};
use crate::dataset::LoadedDataset;
use crate::error::{Error, Result};
use crate::executor::{BreadthFirstExecutor, DepthFirstExecutor, MiningStep};
use crate::expansion::{MiningContext, SequenceState};
use crate::occurrences::{BitOccurrences, Occurrences, PositionList};
use crate::stats::{MiningStats, StatsSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

/// Runs one search over a loaded dataset.
///
/// ```no_run
/// use emerging_sequences::{DatasetLoader, Miner, MiningConfig};
///
/// let dataset = DatasetLoader::new(2, 0).load_text("a b c\nb a c", "c b a").unwrap();
/// let output = Miner::new(MiningConfig::new(2, 0, 1)).mine(&dataset).unwrap();
/// for pattern in &output.patterns {
///     println!("{}", pattern.join(" "));
/// }
/// ```
pub struct Miner {
    config: MiningConfig,
    stats: Arc<MiningStats>,
}

impl Miner {
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config,
            stats: Arc::new(MiningStats::new()),
        }
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Counters accumulated over every run of this miner.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn mine(&self, dataset: &LoadedDataset) -> Result<MiningOutput> {
        let config = &self.config;
        config.validate()?;
        if (dataset.pos_freq_lower_bound, dataset.neg_freq_upper_bound)
            != (config.pos_freq_lower_bound, config.neg_freq_upper_bound)
        {
            return Err(Error::InvalidConfig(format!(
                "dataset loaded with bounds {}/{}, search configured with {}/{}",
                dataset.pos_freq_lower_bound,
                dataset.neg_freq_upper_bound,
                config.pos_freq_lower_bound,
                config.neg_freq_upper_bound
            )));
        }
        let start = Instant::now();

        let prefix = if config.backscan {
            Some(Arc::new(PrefixFilter::new()))
        } else {
            None
        };
        let collector: Arc<dyn ResultsCollector> = match config.filtering {
            Filtering::PostFiltering => Arc::new(PostFilteringCollector::new(prefix.clone())),
            Filtering::Batch { inter_batch_delay } => Arc::new(BatchFilteringCollector::new(inter_batch_delay)),
            Filtering::Ordered => Arc::new(OrderedCollector::new()),
        };
        let ctx = Arc::new(MiningContext::new(
            Arc::clone(&dataset.store),
            config,
            Arc::clone(&collector),
            prefix,
            Arc::clone(&self.stats),
        ));

        let done = AtomicBool::new(false);
        thread::scope(|scope| -> Result<()> {
            let (stats, done) = (&self.stats, &done);
            let reporter = match config.stats_interval {
                Some(interval) => Some(
                    thread::Builder::new()
                        .name("mining-stats".to_string())
                        .spawn_scoped(scope, move || stats.report_every(interval, done))
                        .map_err(|e| Error::Thread(e.to_string()))?,
                ),
                None => None,
            };
            let explored = match config.backend {
                Backend::PositionList => self.explore::<PositionList>(ctx),
                Backend::BitSet => self.explore::<BitOccurrences>(ctx),
            };
            done.store(true, Ordering::Release);
            if let Some(reporter) = reporter {
                reporter.thread().unpark();
            }
            explored
        })?;

        let total_collected = collector.collected();
        let minimal = collector.finish();
        info!(
            "{} emerging sequences collected, {} minimal, mined in {:?}",
            total_collected,
            minimal.len(),
            start.elapsed()
        );
        info!("{}", self.stats.snapshot());

        let mut patterns: Vec<Vec<String>> = minimal
            .iter()
            .map(|sequence| dataset.rebasing.labels_of(sequence))
            .collect();
        // collection order depends on thread scheduling
        patterns.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        Ok(MiningOutput {
            total_minimal: patterns.len() + dataset.emerging_items.len(),
            patterns,
            emerging_items: dataset.emerging_items.clone(),
            total_collected,
        })
    }

    fn explore<O: Occurrences>(&self, ctx: Arc<MiningContext>) -> Result<()> {
        let root = SequenceState::<O>::root(ctx);
        match self.config.traversal {
            Traversal::DepthFirst => DepthFirstExecutor::new(MiningStep::root(root, true), self.config.threads).run(),
            Traversal::BreadthFirst => {
                BreadthFirstExecutor::new(MiningStep::root(root, false), self.config.threads)?.run()
            }
        }
    }
}
