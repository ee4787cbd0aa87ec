//! Terrain build orchestration.
//!
//! A [`TerrainBuildContext`] owns the chunk collection of one terrain. A build
//! creates every chunk `Pending` and generates each exactly once with the
//! configured [`Strategy`]:
//!
//! ```text
//!   ┌────────┐     ┌──────────────────────┐     ┌──────────┐     ┌─────────────┐
//!   │ config ├────►│ TerrainSizing::derive├────►│ chunks   ├────►│ BuildReport │
//!   └────────┘     └──────────────────────┘     │ Pending  │     └─────────────┘
//!                                               └────┬─────┘
//!                               Strategy::generate_chunk / worker pool
//!                                                    ▼
//!                                   Mesh | DeviceResident | Failed
//! ```
//!
//! The threaded strategy runs the worker stages of all chunks on the pool and
//! assembles each chunk on the calling thread as its completion arrives. The
//! build is finished once all chunks are assembled. A failing chunk is
//! recorded in the report and never blocks its siblings.

mod strategy;

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use web_time::Instant;

pub use strategy::{assemble, assemble_guarded, run_worker_stages, GenerationContext, StagedChunk, Strategy};

use crate::chunk::Chunk;
use crate::config::{GenerationStrategy, TerrainConfig};
use crate::density::DensityField;
use crate::error::{ChunkError, TerrainError};
use crate::gpu::DeviceBuffer;
use crate::sizing::TerrainSizing;
use crate::timing::{Measurements, NoMeasurements, StageSummary, StageTimer};
use crate::types::{ChunkCoord, Triangle};

/// Aggregate outcome of one build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildReport {
  pub strategy: GenerationStrategy,
  pub total_chunks: usize,
  /// Chunks that ended with renderable geometry.
  pub completed_chunks: usize,
  pub failed: Vec<(ChunkCoord, ChunkError)>,
  pub triangles: u64,
  pub vertices: u64,
  pub density_failures: u64,
  pub degenerate_triangles: u64,
  pub elapsed: Duration,
  /// Stage totals when the timer collects them.
  pub stages: Option<StageSummary>,
}

impl BuildReport {
  fn from_chunks(strategy: GenerationStrategy, chunks: &[Chunk]) -> Self {
    let mut report = Self {
      strategy,
      total_chunks: chunks.len(),
      completed_chunks: 0,
      failed: Vec::new(),
      triangles: 0,
      vertices: 0,
      density_failures: 0,
      degenerate_triangles: 0,
      elapsed: Duration::ZERO,
      stages: None,
    };
    for chunk in chunks {
      let stats = chunk.stats();
      if let Some(err) = chunk.error() {
        report.failed.push((chunk.coord, err.clone()));
      } else if !chunk.is_pending() {
        report.completed_chunks += 1;
        report.triangles += stats.triangles as u64;
        report.vertices += stats.triangles as u64 * 3;
      }
      report.density_failures += stats.density_failures as u64;
      report.degenerate_triangles += stats.degenerate_triangles as u64;
    }
    report
  }

  /// Every chunk was generated without failure.
  pub fn is_complete(&self) -> bool {
    self.failed.is_empty() && self.completed_chunks == self.total_chunks
  }
}

/// Owns the chunks of one terrain and drives their generation.
pub struct TerrainBuildContext {
  config: TerrainConfig,
  sizing: TerrainSizing,
  field: Arc<dyn DensityField>,
  strategy: Strategy,
  timer: Arc<dyn Measurements>,
  chunks: Vec<Chunk>,
  report: Option<BuildReport>,
}

impl TerrainBuildContext {
  /// Validate `config` and derive the chunk layout. Nothing is generated yet.
  pub fn new(config: TerrainConfig, field: Arc<dyn DensityField>) -> Result<Self, TerrainError> {
    let sizing = TerrainSizing::derive(&config)?;
    let strategy = Strategy::from_config(&config)?;
    let timer: Arc<dyn Measurements> = if config.measure_time {
      Arc::new(StageTimer::new(config.smooth_normals))
    } else {
      Arc::new(NoMeasurements)
    };
    Ok(Self {
      config,
      sizing,
      field,
      strategy,
      timer,
      chunks: Vec::new(),
      report: None,
    })
  }

  /// Replace the timing collaborator.
  pub fn with_measurements(mut self, timer: Arc<dyn Measurements>) -> Self {
    self.timer = timer;
    self
  }

  /// Switch to another strategy before building.
  pub fn with_strategy(mut self, strategy: GenerationStrategy) -> Result<Self, TerrainError> {
    self.config.strategy = strategy;
    self.strategy = Strategy::from_config(&self.config)?;
    Ok(self)
  }

  pub fn config(&self) -> &TerrainConfig {
    &self.config
  }

  pub fn sizing(&self) -> &TerrainSizing {
    &self.sizing
  }

  pub fn strategy(&self) -> &Strategy {
    &self.strategy
  }

  pub fn measurements(&self) -> &dyn Measurements {
    &*self.timer
  }

  /// Chunks in [`TerrainSizing::coords`] order. Empty before the first build.
  pub fn chunks(&self) -> &[Chunk] {
    &self.chunks
  }

  pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
    self.sizing.chunk_index(coord).and_then(|index| self.chunks.get(index))
  }

  /// Report of the last [`build`](Self::build).
  pub fn report(&self) -> Option<&BuildReport> {
    self.report.as_ref()
  }

  /// Generate every chunk once. Previous chunks are discarded.
  pub fn build(&mut self) -> BuildReport {
    if self.config.log_terrain_parameters {
      self.log_parameters();
    }

    let started = Instant::now();
    self.timer.begin_build();
    self.chunks = self
      .sizing
      .coords()
      .map(|coord| Chunk::new(&self.sizing, coord))
      .collect();

    let ctx = GenerationContext {
      config: &self.config,
      sizing: &self.sizing,
      field: &*self.field,
      timer: &*self.timer,
    };

    match &self.strategy {
      Strategy::CpuThreaded(pool) => {
        let chunks = &mut self.chunks;
        let jobs: Vec<ChunkCoord> = chunks.iter().map(|chunk| chunk.coord).collect();
        pool.run_to_completion(
          jobs,
          |coord| Ok(run_worker_stages(&ctx, coord)),
          |index, result| chunks[index].complete(result.and_then(|staged| assemble_guarded(&ctx, staged))),
        );
      }
      strategy => {
        for chunk in self.chunks.iter_mut() {
          chunk.complete(strategy.generate_chunk(&ctx, chunk.coord));
        }
      }
    }

    self.timer.finish_build(self.strategy.kind().is_threaded());

    let mut report = BuildReport::from_chunks(self.strategy.kind(), &self.chunks);
    report.elapsed = started.elapsed();
    report.stages = self.timer.summary();

    tracing::info!(
      strategy = ?report.strategy,
      chunks = report.total_chunks,
      failed = report.failed.len(),
      triangles = report.triangles,
      elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
      "terrain build finished"
    );
    if self.config.measure_time {
      self.timer.show_measurements();
    }

    self.report = Some(report.clone());
    report
  }

  /// Generate one chunk again with the build's strategy and replace it.
  ///
  /// The chunk's stage timings are replaced by the regeneration's, so a later
  /// timer summary counts it once. The stored [`report`](Self::report) is not
  /// updated.
  pub fn regenerate_chunk(&mut self, coord: ChunkCoord) -> Result<&Chunk, TerrainError> {
    let index = self.sizing.chunk_index(coord).ok_or(TerrainError::UnknownChunk(coord))?;
    if self.chunks.is_empty() {
      self.chunks = self
        .sizing
        .coords()
        .map(|coord| Chunk::new(&self.sizing, coord))
        .collect();
    }

    let ctx = GenerationContext {
      config: &self.config,
      sizing: &self.sizing,
      field: &*self.field,
      timer: &*self.timer,
    };
    self.timer.reset_chunk(coord);
    let mut chunk = Chunk::new(&self.sizing, coord);
    chunk.complete(self.strategy.generate_chunk(&ctx, coord));
    tracing::debug!(chunk = %coord, "chunk regenerated");

    self.chunks[index] = chunk;
    Ok(&self.chunks[index])
  }

  /// Host-side geometry of a chunk: `(vertices, normals, indices)`. `None`
  /// for pending, failed and device-resident chunks.
  pub fn final_geometry(&self, coord: ChunkCoord) -> Result<Option<(&[Vec3], &[Vec3], &[u32])>, TerrainError> {
    let chunk = self.lookup(coord)?;
    Ok(chunk
      .and_then(Chunk::mesh)
      .map(|mesh| (mesh.vertices.as_slice(), mesh.normals.as_slice(), mesh.indices.as_slice())))
  }

  /// Device buffer and live triangle count of a device-resident chunk.
  pub fn device_output(&self, coord: ChunkCoord) -> Result<Option<(&DeviceBuffer<Triangle>, u32)>, TerrainError> {
    let chunk = self.lookup(coord)?;
    Ok(chunk
      .and_then(Chunk::device_output)
      .map(|output| (output.buffer(), output.triangle_count())))
  }

  fn lookup(&self, coord: ChunkCoord) -> Result<Option<&Chunk>, TerrainError> {
    let index = self.sizing.chunk_index(coord).ok_or(TerrainError::UnknownChunk(coord))?;
    Ok(self.chunks.get(index))
  }

  fn log_parameters(&self) {
    let sizing = &self.sizing;
    let counts = sizing.chunk_counts();
    tracing::info!(
      terrain_size = ?sizing.terrain_size,
      chunks = ?[counts.x, counts.y, counts.z],
      chunk_cubes = sizing.chunk_cubes_side,
      chunk_cubes_real = sizing.chunk_cubes_side_real,
      cube_size = sizing.cube_size,
      chunk_size = sizing.chunk_size,
      "terrain parameters"
    );
  }
}
