//! Batch execution of independent tasks over a fixed number of executors.
//!
//! A batch is a list of inputs and one side-effect-free task; the executor runs the
//! task once per input and hands back the outputs in input order. The first failure
//! (an `Err` or a panic) fails the whole batch and no outputs are returned.

use crate::error::SimError;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

pub trait BatchExecutor {
    /// Number of tasks that may run at once.
    fn num_workers(&self) -> usize;

    /// Runs `task` on every input and returns the outputs paired by position with
    /// `inputs`. Does not return until every task has finished.
    fn execute<I, O, F>(&self, inputs: Vec<I>, task: F) -> Result<Vec<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Sync;
}

/// Runs every task on the calling thread, in order.
///
/// `workers` only sets how many pieces a caller splits its batch into, which keeps
/// partitioned work deterministic without spawning threads.
#[derive(Debug, Clone, Copy)]
pub struct InlineExecutor {
    workers: usize,
}

impl InlineExecutor {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }
}

impl Default for InlineExecutor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BatchExecutor for InlineExecutor {
    fn num_workers(&self) -> usize {
        self.workers
    }

    fn execute<I, O, F>(&self, inputs: Vec<I>, task: F) -> Result<Vec<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Sync,
    {
        inputs
            .into_iter()
            .enumerate()
            .map(|(worker, input)| run_guarded(worker, &task, input))
            .collect()
    }
}

/// A dedicated Rayon thread pool with a fixed number of threads.
///
/// The pool is built once and reused for every batch, so a run pays the thread
/// start-up cost a single time.
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
    num_workers: usize,
}

impl ThreadPoolExecutor {
    pub fn new(num_workers: usize) -> Result<Self> {
        if num_workers == 0 {
            anyhow::bail!("Thread pool needs at least one worker.");
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|idx| format!("force-worker-{}", idx))
            .build()
            .context("Failed to build force worker thread pool")?;
        log::debug!("Built force worker pool with {} threads.", num_workers);
        Ok(Self { pool, num_workers })
    }
}

impl BatchExecutor for ThreadPoolExecutor {
    fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn execute<I, O, F>(&self, inputs: Vec<I>, task: F) -> Result<Vec<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Sync,
    {
        // `install` blocks until the whole parallel iterator is drained, and the
        // indexed collect keeps outputs in input order.
        self.pool.install(|| {
            inputs
                .into_par_iter()
                .enumerate()
                .map(|(worker, input)| run_guarded(worker, &task, input))
                .collect()
        })
    }
}

/// Runs one task, turning both errors and panics into [`SimError::WorkerFailure`].
/// Errors that already are a `SimError` (e.g. a degenerate configuration found by
/// the worker) are passed through unchanged.
fn run_guarded<I, O, F>(worker: usize, task: &F, input: I) -> Result<O>
where
    F: Fn(I) -> Result<O>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| task(input))) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.downcast_ref::<SimError>().is_some() => Err(e),
        Ok(Err(e)) => Err(SimError::WorkerFailure { worker, reason: format!("{:#}", e) }.into()),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string());
            Err(SimError::WorkerFailure { worker, reason }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_follow_input_order() {
        let pool = ThreadPoolExecutor::new(4).unwrap();
        let inputs: Vec<u64> = (0..64).collect();
        let outputs = pool.execute(inputs, |x| Ok(x * x)).unwrap();
        let expected: Vec<u64> = (0..64).map(|x| x * x).collect();
        assert_eq!(outputs, expected);
    }

    #[test]
    fn inline_executor_matches_pool() {
        let inputs: Vec<i32> = vec![3, 1, 4, 1, 5];
        let inline = InlineExecutor::new(2).execute(inputs.clone(), |x| Ok(x + 1)).unwrap();
        let pooled = ThreadPoolExecutor::new(2).unwrap().execute(inputs, |x| Ok(x + 1)).unwrap();
        assert_eq!(inline, pooled);
    }

    #[test]
    fn task_error_fails_the_batch() {
        let pool = ThreadPoolExecutor::new(3).unwrap();
        let err = pool
            .execute(vec![0, 1, 2], |x| {
                if x == 1 {
                    anyhow::bail!("bad input {}", x);
                }
                Ok(x)
            })
            .unwrap_err();
        match err.downcast_ref::<SimError>() {
            Some(SimError::WorkerFailure { worker, reason }) => {
                assert_eq!(*worker, 1);
                assert!(reason.contains("bad input 1"));
            }
            other => panic!("expected WorkerFailure, got {:?}", other),
        }
    }

    #[test]
    fn panic_is_reported_as_worker_failure() {
        let pool = ThreadPoolExecutor::new(2).unwrap();
        let err = pool
            .execute(vec![0, 1], |x: i32| -> Result<i32> {
                if x == 0 {
                    panic!("boom");
                }
                Ok(x)
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimError>(),
            Some(SimError::WorkerFailure { worker: 0, .. })
        ));
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(ThreadPoolExecutor::new(0).is_err());
    }
}
