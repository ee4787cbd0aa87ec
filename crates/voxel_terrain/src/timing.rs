//! Stage timing.
//!
//! The pipeline brackets each of its four stages per chunk with
//! `start_measurement` / `end_measurement`. What happens with those calls is
//! up to the [`Measurements`] implementation:
//!
//! - [`NoMeasurements`]: nothing (used when `measure_time` is off)
//! - [`StageTimer`]: per-chunk durations, summed per stage
//!
//! # Usage
//!
//! ```ignore
//! let timer = StageTimer::new(true);
//! timer.begin_build();
//! {
//!   let _stage = measure(&timer, StageKind::Triangulation, coord);
//!   // ... triangulate ...
//! }
//! timer.finish_build(false);
//! timer.show_measurements();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use web_time::Instant;

use crate::types::ChunkCoord;

/// The four bracketed pipeline stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
  VoxelGeneration,
  Triangulation,
  Smoothing,
  MeshBuilding,
}

impl StageKind {
  pub const ALL: [StageKind; 4] = [
    StageKind::VoxelGeneration,
    StageKind::Triangulation,
    StageKind::Smoothing,
    StageKind::MeshBuilding,
  ];

  pub fn label(self) -> &'static str {
    match self {
      StageKind::VoxelGeneration => "voxel generation",
      StageKind::Triangulation => "triangulation",
      StageKind::Smoothing => "smoothing",
      StageKind::MeshBuilding => "mesh building",
    }
  }

  fn slot(self) -> usize {
    self as usize
  }
}

impl fmt::Display for StageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Timing collaborator of the pipeline.
pub trait Measurements: Send + Sync {
  /// Begin timing `kind` for `chunk`. Stages of one chunk never overlap.
  fn start_measurement(&self, kind: StageKind, chunk: ChunkCoord);

  /// End the running measurement of `chunk`.
  fn end_measurement(&self, chunk: ChunkCoord);

  fn show_measurements(&self);

  /// Called once before the first chunk of a build.
  fn begin_build(&self) {}

  /// Called once after the last chunk of a build was assembled.
  fn finish_build(&self, _threaded: bool) {}

  /// Forget what was measured for `chunk`, before it is generated again.
  fn reset_chunk(&self, _chunk: ChunkCoord) {}

  fn summary(&self) -> Option<StageSummary> {
    None
  }
}

/// Discards every measurement.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMeasurements;

impl Measurements for NoMeasurements {
  fn start_measurement(&self, _kind: StageKind, _chunk: ChunkCoord) {}

  fn end_measurement(&self, _chunk: ChunkCoord) {}

  fn show_measurements(&self) {}
}

/// Ends the measurement it started when dropped.
pub struct StageGuard<'a> {
  timer: &'a dyn Measurements,
  chunk: ChunkCoord,
}

impl Drop for StageGuard<'_> {
  fn drop(&mut self) {
    self.timer.end_measurement(self.chunk);
  }
}

/// Bracket a stage for the lifetime of the returned guard.
pub fn measure(timer: &dyn Measurements, kind: StageKind, chunk: ChunkCoord) -> StageGuard<'_> {
  timer.start_measurement(kind, chunk);
  StageGuard { timer, chunk }
}

/// Accumulated stage durations of one chunk.
#[derive(Clone, Debug, Default)]
struct MeasurementSet {
  running: Option<(StageKind, Instant)>,
  totals: [Duration; 4],
}

/// Per-stage totals of a build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageSummary {
  /// Indexed like [`StageKind::ALL`].
  pub stages: [Duration; 4],
  /// Wall-clock time between `begin_build` and `finish_build`.
  pub total: Duration,
  pub chunks: usize,
}

impl StageSummary {
  pub fn stage(&self, kind: StageKind) -> Duration {
    self.stages[kind.slot()]
  }
}

#[derive(Debug, Default)]
struct BuildClock {
  started: Option<Instant>,
  total: Duration,
  threaded: bool,
}

/// Default [`Measurements`] implementation.
///
/// Threaded builds overlap stages of different chunks, so their stage sums
/// exceed the wall clock. For those the stage totals are rescaled to add up to
/// the elapsed build time, keeping their relative weight.
#[derive(Debug)]
pub struct StageTimer {
  sets: Mutex<HashMap<ChunkCoord, MeasurementSet>>,
  clock: Mutex<BuildClock>,
  smoothing_enabled: bool,
}

impl StageTimer {
  pub fn new(smoothing_enabled: bool) -> Self {
    Self {
      sets: Mutex::new(HashMap::new()),
      clock: Mutex::new(BuildClock::default()),
      smoothing_enabled,
    }
  }

  /// Accumulated totals of one chunk.
  pub fn chunk_totals(&self, chunk: ChunkCoord) -> Option<[Duration; 4]> {
    self.sets.lock().get(&chunk).map(|set| set.totals)
  }

  fn build_summary(&self) -> StageSummary {
    let sets = self.sets.lock();
    let mut stages = [Duration::ZERO; 4];
    for set in sets.values() {
      for (sum, value) in stages.iter_mut().zip(set.totals.iter()) {
        *sum += *value;
      }
    }

    let clock = self.clock.lock();
    if clock.threaded {
      let measured: f64 = stages.iter().map(Duration::as_secs_f64).sum();
      if measured > 0.0 {
        let scale = clock.total.as_secs_f64() / measured;
        for stage in stages.iter_mut() {
          *stage = Duration::from_secs_f64(stage.as_secs_f64() * scale);
        }
      }
    }

    StageSummary {
      stages,
      total: clock.total,
      chunks: sets.len(),
    }
  }
}

impl Default for StageTimer {
  fn default() -> Self {
    Self::new(true)
  }
}

impl Measurements for StageTimer {
  fn start_measurement(&self, kind: StageKind, chunk: ChunkCoord) {
    let mut sets = self.sets.lock();
    let set = sets.entry(chunk).or_default();
    set.running = Some((kind, Instant::now()));
  }

  fn end_measurement(&self, chunk: ChunkCoord) {
    let mut sets = self.sets.lock();
    if let Some(set) = sets.get_mut(&chunk) {
      if let Some((kind, started)) = set.running.take() {
        set.totals[kind.slot()] += started.elapsed();
      }
    }
  }

  fn show_measurements(&self) {
    let summary = self.build_summary();
    tracing::info!(
      chunks = summary.chunks,
      total_ms = summary.total.as_secs_f64() * 1000.0,
      "terrain generation time"
    );
    for kind in StageKind::ALL {
      if kind == StageKind::Smoothing && !self.smoothing_enabled {
        continue;
      }
      tracing::info!(
        stage = kind.label(),
        ms = summary.stage(kind).as_secs_f64() * 1000.0,
        "stage time"
      );
    }
  }

  fn begin_build(&self) {
    self.sets.lock().clear();
    let mut clock = self.clock.lock();
    *clock = BuildClock {
      started: Some(Instant::now()),
      ..BuildClock::default()
    };
  }

  fn reset_chunk(&self, chunk: ChunkCoord) {
    self.sets.lock().remove(&chunk);
  }

  fn finish_build(&self, threaded: bool) {
    let mut clock = self.clock.lock();
    if let Some(started) = clock.started.take() {
      clock.total = started.elapsed();
    }
    clock.threaded = threaded;
  }

  fn summary(&self) -> Option<StageSummary> {
    Some(self.build_summary())
  }
}

#[cfg(test)]
#[path = "timing_test.rs"]
mod timing_test;
