use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[test]
fn test_every_job_completes_once() {
  let pool = WorkerPool::new(4).expect("pool starts");
  let mut seen = HashSet::new();
  let mut sum = 0;

  pool.run_to_completion((0..100u64).collect::<Vec<_>>(), |n| Ok(n * 2), |index, result| {
    assert!(seen.insert(index), "job {index} completed twice");
    sum += result.expect("job succeeds");
  });

  assert_eq!(seen.len(), 100);
  assert_eq!(sum, (0..100u64).map(|n| n * 2).sum::<u64>());
}

#[test]
fn test_completion_index_matches_job() {
  let pool = WorkerPool::new(3).expect("pool starts");
  let jobs: Vec<usize> = (0..20).map(|i| i * 7).collect();
  pool.run_to_completion(jobs, |job| Ok(job), |index, result| {
    assert_eq!(result, Ok(index * 7));
  });
}

#[test]
fn test_panic_is_isolated() {
  let pool = WorkerPool::new(2).expect("pool starts");
  let mut failures = Vec::new();
  let mut successes = 0;

  pool.run_to_completion(
    (0..10u32).collect::<Vec<_>>(),
    |n| {
      if n == 3 {
        panic!("density exploded");
      }
      Ok(n)
    },
    |index, result| match result {
      Ok(_) => successes += 1,
      Err(err) => failures.push((index, err)),
    },
  );

  assert_eq!(successes, 9);
  assert_eq!(
    failures,
    vec![(3, ChunkError::WorkerPanicked("density exploded".to_string()))]
  );
}

#[test]
fn test_errors_pass_through() {
  let pool = WorkerPool::new(2).expect("pool starts");
  let mut errors = 0;
  pool.run_to_completion(
    vec![(); 4],
    |_| {
      Err::<(), _>(ChunkError::CapacityOverflow {
        requested: 10,
        capacity: 5,
      })
    },
    |_, result| errors += result.is_err() as usize,
  );
  assert_eq!(errors, 4);
}

#[test]
fn test_runs_on_named_workers() {
  let pool = WorkerPool::new(2).expect("pool starts");
  assert_eq!(pool.num_threads(), 2);

  let on_worker = AtomicUsize::new(0);
  pool.run_to_completion(
    vec![(); 8],
    |_| {
      let name = std::thread::current().name().map(str::to_owned).unwrap_or_default();
      if name.starts_with("terrain-worker-") {
        on_worker.fetch_add(1, Ordering::Relaxed);
      }
      Ok(())
    },
    |_, _| {},
  );
  assert_eq!(on_worker.load(Ordering::Relaxed), 8);
}

#[test]
fn test_empty_job_list() {
  let pool = WorkerPool::new(1).expect("pool starts");
  let mut calls = 0;
  pool.run_to_completion(Vec::<u8>::new(), |_| Ok(()), |_, _| calls += 1);
  assert_eq!(calls, 0);
}
