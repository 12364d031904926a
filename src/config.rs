use crate::error::{Error, Result};
use std::time::Duration;

/// Order in which the expansion tree is visited.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Traversal {
    /// Per-worker stacks, idle workers steal from the shallowest frames of others.
    DepthFirst,
    /// One tree level at a time, levels separated by a barrier.
    BreadthFirst,
}

/// How emerging sequences are reduced to the minimal ones.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Filtering {
    /// Keep everything, filter once at the end.
    PostFiltering,
    /// Rebuild the filtering tree every `inter_batch_delay` collected sequences.
    Batch { inter_batch_delay: usize },
    /// Sequences arrive by non-decreasing length, filter as they come.
    Ordered,
}

/// Representation of the per-transaction occurrence positions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Backend {
    /// Sorted position lists carrying provenance, required for backscan.
    PositionList,
    /// One bit per transaction position.
    BitSet,
}

#[derive(Clone, Debug)]
pub struct MiningConfig {
    /// Minimum positive support, inclusive.
    pub pos_freq_lower_bound: usize,
    /// Maximum negative support of an emerging sequence, inclusive.
    pub neg_freq_upper_bound: usize,
    /// Maximum number of items between two consecutive pattern items.
    pub gap_constraint: usize,
    pub threads: usize,
    pub traversal: Traversal,
    pub filtering: Filtering,
    pub backend: Backend,
    pub backscan: bool,
    pub prune_siblings: bool,
    /// Period of the statistics log line, disabled when `None`.
    pub stats_interval: Option<Duration>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            pos_freq_lower_bound: 1,
            neg_freq_upper_bound: 0,
            gap_constraint: 0,
            threads: num_cpus::get().max(1),
            traversal: Traversal::DepthFirst,
            filtering: Filtering::PostFiltering,
            backend: Backend::PositionList,
            backscan: false,
            prune_siblings: true,
            stats_interval: None,
        }
    }
}

impl MiningConfig {
    pub fn new(pos_freq_lower_bound: usize, neg_freq_upper_bound: usize, gap_constraint: usize) -> Self {
        Self {
            pos_freq_lower_bound,
            neg_freq_upper_bound,
            gap_constraint,
            ..Self::default()
        }
    }

    /// Switches to the level-by-level traversal together with the ordered filtering it needs.
    pub fn breadth_first(mut self) -> Self {
        self.traversal = Traversal::BreadthFirst;
        self.filtering = Filtering::Ordered;
        self
    }

    /// Enables backscan pruning, turning off the sibling pruning it cannot be combined with.
    pub fn backscan(mut self) -> Self {
        self.backscan = true;
        self.prune_siblings = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.pos_freq_lower_bound == 0 {
            return Err(invalid("positive support lower bound must be at least 1"));
        }
        if self.threads == 0 {
            return Err(invalid("at least one worker thread is required"));
        }
        if let Filtering::Batch { inter_batch_delay: 0 } = self.filtering {
            return Err(invalid("batch filtering needs a delay of at least 1"));
        }
        match (self.traversal, self.filtering) {
            (Traversal::BreadthFirst, Filtering::Ordered) => {}
            (Traversal::BreadthFirst, _) => {
                return Err(invalid("breadth first traversal requires ordered filtering"));
            }
            (Traversal::DepthFirst, Filtering::Ordered) => {
                return Err(invalid("ordered filtering requires breadth first traversal"));
            }
            (Traversal::DepthFirst, _) => {}
        }
        if self.backscan {
            if self.traversal != Traversal::DepthFirst || self.filtering != Filtering::PostFiltering {
                return Err(invalid("backscan only works depth first with post filtering"));
            }
            if self.backend != Backend::PositionList {
                return Err(invalid("backscan needs the position list backend"));
            }
            // a sibling may deny the extension that rebuilds a backscanned prefix
            if self.prune_siblings {
                return Err(invalid("backscan cannot be combined with sibling pruning"));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Backend, Filtering, MiningConfig, Traversal};

    #[test]
    fn test_default_is_valid() {
        assert!(MiningConfig::new(2, 0, 1).validate().is_ok());
        assert!(MiningConfig::new(2, 0, 1).breadth_first().validate().is_ok());
    }

    #[test]
    fn test_rejects_incoherent_combinations() {
        let mut config = MiningConfig::new(0, 0, 0);
        assert!(config.validate().is_err());

        config.pos_freq_lower_bound = 1;
        config.traversal = Traversal::BreadthFirst;
        assert!(config.validate().is_err());

        let mut config = MiningConfig::new(1, 0, 0);
        config.filtering = Filtering::Ordered;
        assert!(config.validate().is_err());

        let mut config = MiningConfig::new(1, 0, 0);
        config.backscan = true;
        config.backend = Backend::BitSet;
        assert!(config.validate().is_err());

        config.backend = Backend::PositionList;
        config.filtering = Filtering::Batch { inter_batch_delay: 10 };
        assert!(config.validate().is_err());

        config.filtering = Filtering::PostFiltering;
        assert!(config.validate().is_err());

        config.prune_siblings = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backscan_turns_off_sibling_pruning() {
        let config = MiningConfig::new(1, 0, 1).backscan();
        assert!(config.backscan);
        assert!(!config.prune_siblings);
        assert!(config.validate().is_ok());
    }
}
