use super::MiningStep;
use crate::error::{Error, Result};
use crate::occurrences::Occurrences;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;
use tracing::debug;

type Stack<O> = RwLock<Vec<Arc<MiningStep<O>>>>;

/// One stack of frames per worker. A worker with an empty stack steals an
/// extension from the shallowest frame of another worker that still has one.
pub struct DepthFirstExecutor<O> {
    stacks: Vec<Stack<O>>,
}

impl<O: Occurrences> DepthFirstExecutor<O> {
    /// Every worker starts on the shared root frame.
    pub fn new(root: MiningStep<O>, threads: usize) -> Self {
        let root = Arc::new(root);
        Self {
            stacks: (0..threads.max(1))
                .map(|_| RwLock::new(vec![Arc::clone(&root)]))
                .collect(),
        }
    }

    pub fn run(&self) -> Result<()> {
        thread::scope(|scope| -> Result<()> {
            let mut workers = Vec::with_capacity(self.stacks.len());
            for id in 0..self.stacks.len() {
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
        let stack = &self.stacks[id];
        loop {
            // only this worker pushes or pops its own stack
            let top = stack.read().last().cloned();
            match top {
                Some(step) => match step.next() {
                    Some(child) => stack.write().push(child),
                    None => {
                        stack.write().pop();
                    }
                },
                None => {
                    if !self.steal(id) {
                        break;
                    }
                }
            }
        }
        debug!("mining worker {} found nothing left to steal", id);
    }

    fn steal(&self, id: usize) -> bool {
        let threads = self.stacks.len();
        for offset in 1..threads {
            let victim = (id + offset) % threads;
            let frames = self.stacks[victim].read().clone();
            for frame in frames {
                if let Some(child) = frame.next() {
                    let mut stack = self.stacks[id].write();
                    stack.push(frame);
                    stack.push(child);
                    return true;
                }
            }
        }
        false
    }
}
