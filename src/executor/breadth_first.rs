use super::MiningStep;
use crate::error::{Error, Result};
use crate::occurrences::Occurrences;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use tracing::debug;

struct Worker<O> {
    sender: Sender<Arc<MiningStep<O>>>,
    todo: Receiver<Arc<MiningStep<O>>>,
    running: Mutex<Option<Arc<MiningStep<O>>>>,
}

struct Ballot {
    generation: u64,
    arrived: usize,
    any: bool,
    result: bool,
}

/// Barrier that also ORs a boolean cast by every party.
struct Vote {
    ballot: Mutex<Ballot>,
    turn: Condvar,
    parties: usize,
}

impl Vote {
    fn new(parties: usize) -> Self {
        Self {
            ballot: Mutex::new(Ballot {
                generation: 0,
                arrived: 0,
                any: false,
                result: false,
            }),
            turn: Condvar::new(),
            parties,
        }
    }

    fn cast(&self, vote: bool) -> bool {
        let mut ballot = self.ballot.lock();
        ballot.any |= vote;
        ballot.arrived += 1;
        if ballot.arrived == self.parties {
            ballot.result = ballot.any;
            ballot.any = false;
            ballot.arrived = 0;
            ballot.generation += 1;
            self.turn.notify_all();
            return ballot.result;
        }
        let generation = ballot.generation;
        while ballot.generation == generation {
            self.turn.wait(&mut ballot);
        }
        ballot.result
    }
}

/// Explores the tree one level at a time, so emerging sequences are found by
/// non-decreasing length. Workers drain their own queue, then help the others,
/// and keep the frames they produce until every worker is done with the level.
pub struct BreadthFirstExecutor<O> {
    workers: Vec<Worker<O>>,
    vote: Vote,
}

impl<O: Occurrences> BreadthFirstExecutor<O> {
    pub fn new(root: MiningStep<O>, threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let workers: Vec<Worker<O>> = (0..threads)
            .map(|_| {
                let (sender, todo) = unbounded();
                Worker {
                    sender,
                    todo,
                    running: Mutex::new(None),
                }
            })
            .collect();
        workers[0]
            .sender
            .send(Arc::new(root))
            .map_err(|_| Error::Thread("work queue closed".to_string()))?;
        Ok(Self {
            workers,
            vote: Vote::new(threads),
        })
    }

    pub fn run(&self) -> Result<()> {
        thread::scope(|scope| -> Result<()> {
            let mut workers = Vec::with_capacity(self.workers.len());
            for id in 0..self.workers.len() {
                let worker = thread::Builder::new()
                    .name(format!("mining-{}", id))
                    .spawn_scoped(scope, move || self.work(id))
                    .map_err(|e| Error::Thread(e.to_string()))?;
                workers.push(worker);
            }
            for worker in workers {
                worker
                    .join()
                    .map_err(|_| Error::Thread("mining worker panicked".to_string()))?;
            }
            Ok(())
        })
    }

    fn work(&self, id: usize) {
        let threads = self.workers.len();
        let mut level = 0;
        loop {
            let mut produced = Vec::new();
            for offset in 0..threads {
                let victim = &self.workers[(id + offset) % threads];
                while let Ok(step) = victim.todo.try_recv() {
                    self.run_step(id, step, &mut produced);
                }
                if offset > 0 {
                    let running = victim.running.lock().clone();
                    if let Some(step) = running {
                        drain(&step, &mut produced);
                    }
                }
            }
            if !self.vote.cast(!produced.is_empty()) {
                break;
            }
            level += 1;
            if id == 0 {
                debug!("breadth first search moving to level {}", level);
            }
            for step in produced {
                // the receiving end lives in `self`
                let sent = self.workers[id].sender.send(step);
                debug_assert!(sent.is_ok(), "work queue of mining worker {} closed", id);
            }
            // nobody drains a queue before every worker filled its own
            self.vote.cast(false);
        }
        debug!("mining worker {} done after {} levels", id, level);
    }

    fn run_step(&self, id: usize, step: Arc<MiningStep<O>>, produced: &mut Vec<Arc<MiningStep<O>>>) {
        *self.workers[id].running.lock() = Some(Arc::clone(&step));
        drain(&step, produced);
        *self.workers[id].running.lock() = None;
    }
}

fn drain<O: Occurrences>(step: &MiningStep<O>, produced: &mut Vec<Arc<MiningStep<O>>>) {
    while let Some(child) = step.next() {
        produced.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::{BreadthFirstExecutor, Vote};
    use crate::collector::{OrderedCollector, ResultsCollector};
    use crate::config::MiningConfig;
    use crate::dataset::TransactionStore;
    use crate::executor::MiningStep;
    use crate::expansion::{MiningContext, SequenceState};
    use crate::occurrences::PositionList;
    use crate::stats::MiningStats;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_levels_are_requeued_until_exhausted() {
        // 0 1 2 / 1 0 2 against 2 1 0
        let store = Arc::new(TransactionStore::new(
            vec![vec![0, 1, 2], vec![1, 0, 2]],
            vec![vec![2, 1, 0]],
            3,
        ));
        let config = MiningConfig::new(2, 0, 1).breadth_first();
        let collector = Arc::new(OrderedCollector::new());
        let ctx = Arc::new(MiningContext::new(
            store,
            &config,
            collector.clone(),
            None,
            Arc::new(MiningStats::new()),
        ));
        let root = MiningStep::root(SequenceState::<PositionList>::root(ctx), false);
        BreadthFirstExecutor::new(root, 2).unwrap().run().unwrap();

        let mut minimal = collector.finish();
        minimal.sort();
        assert_eq!(minimal, vec![vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn test_vote_ors_every_ballot() {
        let vote = Arc::new(Vote::new(3));
        let handles: Vec<_> = (0..3)
            .map(|id| {
                let vote = Arc::clone(&vote);
                thread::spawn(move || {
                    let first = vote.cast(id == 1);
                    let second = vote.cast(false);
                    (first, second)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), (true, false));
        }
    }
}
