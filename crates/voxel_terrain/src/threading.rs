//! Worker pool for the threaded CPU strategy.
//!
//! Jobs run on a dedicated rayon pool; completions come back over a bounded
//! channel and are consumed on the calling thread in arrival order.
//!
//! ```text
//!   caller ──spawn×N──► terrain-worker-0..k ──(index, result)──► caller
//!                                                    consume(index, result)
//! ```
//!
//! Every job produces exactly one completion. A panicking job produces a
//! [`ChunkError::WorkerPanicked`] instead of losing its slot, so the caller
//! always receives `N` completions.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crossbeam_channel::bounded;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{ChunkError, TerrainError};

/// Dedicated thread pool for chunk generation.
#[derive(Debug)]
pub struct WorkerPool {
  pool: ThreadPool,
}

impl WorkerPool {
  /// Pool with `threads` workers. 0 means one per core.
  pub fn new(threads: usize) -> Result<Self, TerrainError> {
    let pool = ThreadPoolBuilder::new()
      .num_threads(threads)
      .thread_name(|i| format!("terrain-worker-{i}"))
      .build()
      .map_err(|err| TerrainError::config(format!("failed to start worker pool: {err}")))?;
    Ok(Self { pool })
  }

  pub fn num_threads(&self) -> usize {
    self.pool.current_num_threads()
  }

  /// Run `work` for every job on the pool and hand each completion to
  /// `consume` on the calling thread. Returns after all completions.
  pub fn run_to_completion<J, R, W, C>(&self, jobs: Vec<J>, work: W, mut consume: C)
  where
    J: Send,
    R: Send,
    W: Fn(J) -> Result<R, ChunkError> + Sync,
    C: FnMut(usize, Result<R, ChunkError>),
  {
    let total = jobs.len();
    if total == 0 {
      return;
    }
    let (tx, rx) = bounded::<(usize, Result<R, ChunkError>)>(total);
    let work = &work;

    self.pool.in_place_scope(|scope| {
      for (index, job) in jobs.into_iter().enumerate() {
        let tx = tx.clone();
        scope.spawn(move |_| {
          let result = catch_unwind(AssertUnwindSafe(|| work(job))).unwrap_or_else(|payload| {
            tracing::error!(job = index, "worker panicked");
            Err(ChunkError::from_panic(payload))
          });
          // The receiver outlives the scope, so the send cannot fail
          let _ = tx.send((index, result));
        });
      }
      drop(tx);

      for (index, result) in rx.iter().take(total) {
        consume(index, result);
      }
    });
  }
}

#[cfg(test)]
#[path = "threading_test.rs"]
mod threading_test;
