//! Work-stealing pool that drives nodes to a fixpoint.
//!
//! Each worker owns a FIFO deque; dependents scheduled by a pass go to the
//! local deque, remote schedules go to the global injector, and idle workers
//! steal. The run ends when the pending counter drops to zero: every queue
//! entry is counted before it is pushed and released only after its pass,
//! including the schedules the pass made, has completed.

use std::iter;
use std::sync::atomic::Ordering;

use crossbeam::deque::{Injector, Steal, Stealer, Worker};
use crossbeam::utils::Backoff;

use super::TypeInferer;
use crate::{InferError, Node, NodeId};

impl TypeInferer {
    /// Recalculate scheduled nodes until nothing changes.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run_to_fixpoint(&self) -> Result<(), InferError> {
        if self.pending.load(Ordering::Acquire) == 0 {
            return Ok(());
        }
        self.abort.store(false, Ordering::Release);
        let num_workers = self.config.effective_workers();
        let before = self.stats();

        let result = if num_workers == 1 {
            self.worker_loop(&Worker::new_fifo(), &[])
        } else {
            self.run_pool(num_workers)
        };

        let after = self.stats();
        tracing::debug!(
            workers = num_workers,
            recalculations = after.recalculations - before.recalculations,
            relaunches = after.relaunches - before.relaunches,
            changes = after.changes - before.changes,
            "fixpoint reached"
        );
        result
    }

    fn run_pool(&self, num_workers: usize) -> Result<(), InferError> {
        let workers: Vec<Worker<NodeId>> = (0..num_workers).map(|_| Worker::new_fifo()).collect();
        let stealers: Vec<Stealer<NodeId>> = workers.iter().map(Worker::stealer).collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .into_iter()
                .map(|local| {
                    let stealers = &stealers;
                    scope.spawn(move || self.worker_loop(&local, stealers))
                })
                .collect();

            let mut result = Ok(());
            for handle in handles {
                let outcome = handle.join().unwrap_or(Err(InferError::WorkerPanicked));
                if let Err(err) = outcome {
                    self.abort.store(true, Ordering::Release);
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
            result
        })
    }

    fn worker_loop(
        &self,
        local: &Worker<NodeId>,
        stealers: &[Stealer<NodeId>],
    ) -> Result<(), InferError> {
        let backoff = Backoff::new();
        loop {
            if self.abort.load(Ordering::Acquire) {
                return Ok(());
            }
            match find_task(local, &self.injector, stealers) {
                Some(id) => {
                    backoff.reset();
                    let result = self.process_entry(id, local);
                    self.pending.fetch_sub(1, Ordering::AcqRel);
                    if let Err(err) = result {
                        self.abort.store(true, Ordering::Release);
                        return Err(err);
                    }
                }
                None => {
                    if self.pending.load(Ordering::Acquire) == 0 {
                        return Ok(());
                    }
                    if backoff.is_completed() {
                        std::thread::yield_now();
                    } else {
                        backoff.snooze();
                    }
                }
            }
        }
    }

    fn process_entry(&self, id: NodeId, local: &Worker<NodeId>) -> Result<(), InferError> {
        let node = self.graph.node(id)?;
        if !node.state.claim_queued() {
            // Stale: claimed inline by `resolve` after it was queued.
            return Ok(());
        }
        self.run_claimed(&node, Some(local))
    }

    /// Run passes over a node this thread owns until no relaunch is pending.
    pub(crate) fn run_claimed(
        &self,
        node: &Node,
        local: Option<&Worker<NodeId>>,
    ) -> Result<(), InferError> {
        loop {
            if let Err(err) = self.pass(node, local) {
                node.state.abandon();
                return Err(err);
            }
            if !node.state.finish_pass() {
                return Ok(());
            }
            self.counters.relaunches.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn pass(&self, node: &Node, local: Option<&Worker<NodeId>>) -> Result<(), InferError> {
        self.counters.recalculations.fetch_add(1, Ordering::Relaxed);
        if self.recalculate(node)? {
            self.counters.changes.fetch_add(1, Ordering::Relaxed);
            for dependent in self.graph.dependents(node)? {
                self.enqueue(dependent, local)?;
            }
        }
        Ok(())
    }
}

fn find_task<T>(local: &Worker<T>, global: &Injector<T>, stealers: &[Stealer<T>]) -> Option<T> {
    local.pop().or_else(|| {
        iter::repeat_with(|| {
            global
                .steal_batch_and_pop(local)
                .or_else(|| stealers.iter().map(Stealer::steal).collect::<Steal<T>>())
        })
        .find(|steal| !steal.is_retry())
        .and_then(Steal::success)
    })
}
