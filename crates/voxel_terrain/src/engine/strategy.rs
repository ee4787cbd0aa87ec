//! Per-chunk generation strategies.
//!
//! ```text
//!   CpuSync        sample → triangulate → smooth → assemble      calling thread
//!   CpuThreaded    sample → triangulate → smooth ║ assemble      worker ║ caller
//!   CpuGpuHybrid   4 dispatches → readback → ChunkMesh           device, blocking
//!   GpuResident    4 dispatches → output buffer kept             device
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::chunk::{ChunkGeometry, ChunkOutput, ChunkStats};
use crate::config::{GenerationStrategy, TerrainConfig};
use crate::density::DensityField;
use crate::error::{ChunkError, TerrainError};
use crate::gpu::{GpuPipeline, GpuRun};
use crate::marching_cubes::triangulate;
use crate::mesh_builder::build_chunk_mesh;
use crate::sampler::sample_chunk;
use crate::sizing::{ChunkDimensions, TerrainSizing};
use crate::smoothing::smooth_normals;
use crate::threading::WorkerPool;
use crate::timing::{measure, Measurements, StageKind};
use crate::types::{ChunkCoord, Triangle};

/// Everything a strategy reads while generating a chunk.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
  pub config: &'a TerrainConfig,
  pub sizing: &'a TerrainSizing,
  pub field: &'a dyn DensityField,
  pub timer: &'a dyn Measurements,
}

/// Output of the worker half of the CPU pipeline, waiting for assembly.
#[derive(Debug)]
pub struct StagedChunk {
  pub coord: ChunkCoord,
  pub dims: ChunkDimensions,
  pub triangles: Vec<Triangle>,
  /// Per-cube grouping of `triangles`, as in [`TriangleSoup::cube_offsets`](crate::marching_cubes::TriangleSoup::cube_offsets).
  pub cube_offsets: Vec<u32>,
  pub density_failures: u32,
  pub degenerate_triangles: u32,
}

/// Sample, triangulate and smooth one chunk. The voxel grid and the
/// provisional soup are dropped before returning.
pub fn run_worker_stages(ctx: &GenerationContext<'_>, coord: ChunkCoord) -> StagedChunk {
  let grid = {
    let _stage = measure(ctx.timer, StageKind::VoxelGeneration, coord);
    sample_chunk(ctx.sizing, coord, ctx.field)
  };
  let soup = {
    let _stage = measure(ctx.timer, StageKind::Triangulation, coord);
    triangulate(&grid, ctx.config.interpolate_vertices)
  };
  let triangles = {
    let _stage = measure(ctx.timer, StageKind::Smoothing, coord);
    smooth_normals(&soup, ctx.config.smooth_normals)
  };

  StagedChunk {
    coord,
    dims: grid.dims,
    triangles,
    cube_offsets: soup.cube_offsets,
    density_failures: grid.density_failures,
    degenerate_triangles: soup.degenerate,
  }
}

/// Final mesh assembly of a staged chunk.
pub fn assemble(ctx: &GenerationContext<'_>, staged: StagedChunk) -> ChunkGeometry {
  let mesh = {
    let _stage = measure(ctx.timer, StageKind::MeshBuilding, staged.coord);
    build_chunk_mesh(&staged.dims, &staged.cube_offsets, &staged.triangles)
  };
  ChunkGeometry {
    stats: ChunkStats {
      triangles: mesh.triangle_count() as u32,
      density_failures: staged.density_failures,
      degenerate_triangles: staged.degenerate_triangles,
    },
    output: ChunkOutput::Mesh(mesh),
  }
}

/// [`assemble`] with panics turned into [`ChunkError::WorkerPanicked`], for
/// consumers that assemble outside a worker.
pub fn assemble_guarded(ctx: &GenerationContext<'_>, staged: StagedChunk) -> Result<ChunkGeometry, ChunkError> {
  guarded(|| Ok(assemble(ctx, staged)))
}

/// The strategy selected for a build.
#[derive(Debug)]
pub enum Strategy {
  CpuSync,
  CpuThreaded(WorkerPool),
  CpuGpuHybrid(GpuPipeline),
  GpuResident(GpuPipeline),
}

impl Strategy {
  /// Build the strategy `config.strategy` names. Device pipelines get a
  /// software device limited to `config.buffer_capacity` per allocation.
  pub fn from_config(config: &TerrainConfig) -> Result<Self, TerrainError> {
    Ok(match config.strategy {
      GenerationStrategy::CpuSync => Strategy::CpuSync,
      GenerationStrategy::CpuThreaded => Strategy::CpuThreaded(WorkerPool::new(config.worker_threads)?),
      GenerationStrategy::CpuGpuHybrid => Strategy::CpuGpuHybrid(GpuPipeline::software(config.buffer_capacity)),
      GenerationStrategy::GpuResident => Strategy::GpuResident(GpuPipeline::software(config.buffer_capacity)),
    })
  }

  pub fn kind(&self) -> GenerationStrategy {
    match self {
      Strategy::CpuSync => GenerationStrategy::CpuSync,
      Strategy::CpuThreaded(_) => GenerationStrategy::CpuThreaded,
      Strategy::CpuGpuHybrid(_) => GenerationStrategy::CpuGpuHybrid,
      Strategy::GpuResident(_) => GenerationStrategy::GpuResident,
    }
  }

  /// Generate one chunk to completion. Panics of the density field or any
  /// stage become [`ChunkError::WorkerPanicked`].
  pub fn generate_chunk(&self, ctx: &GenerationContext<'_>, coord: ChunkCoord) -> Result<ChunkGeometry, ChunkError> {
    match self {
      Strategy::CpuSync => guarded(|| Ok(assemble(ctx, run_worker_stages(ctx, coord)))),
      Strategy::CpuThreaded(pool) => {
        let mut outcome = None;
        pool.run_to_completion(
          vec![coord],
          |coord| Ok(run_worker_stages(ctx, coord)),
          |_, result| outcome = Some(result.and_then(|staged| assemble_guarded(ctx, staged))),
        );
        outcome.unwrap_or_else(|| Err(ChunkError::WorkerPanicked("worker produced no completion".to_string())))
      }
      Strategy::CpuGpuHybrid(pipeline) => guarded(|| {
        let run = run_pipeline(pipeline, ctx, coord)?;
        let mesh = {
          let _stage = measure(ctx.timer, StageKind::MeshBuilding, coord);
          run.output.read_back(&**pipeline.device())
        };
        // The output buffer is released here; only host arrays remain
        Ok(ChunkGeometry {
          stats: ChunkStats {
            triangles: mesh.triangle_count() as u32,
            density_failures: run.density_failures,
            degenerate_triangles: run.degenerate_triangles,
          },
          output: ChunkOutput::Mesh(mesh),
        })
      }),
      Strategy::GpuResident(pipeline) => guarded(|| {
        let run = run_pipeline(pipeline, ctx, coord)?;
        Ok(ChunkGeometry {
          stats: ChunkStats {
            triangles: run.output.triangle_count(),
            density_failures: run.density_failures,
            degenerate_triangles: run.degenerate_triangles,
          },
          output: ChunkOutput::DeviceResident(run.output),
        })
      }),
    }
  }
}

fn run_pipeline(pipeline: &GpuPipeline, ctx: &GenerationContext<'_>, coord: ChunkCoord) -> Result<GpuRun, ChunkError> {
  pipeline.run(
    ctx.sizing,
    coord,
    ctx.field,
    ctx.config.interpolate_vertices,
    ctx.config.smooth_normals,
    ctx.timer,
  )
}

fn guarded<F>(generate: F) -> Result<ChunkGeometry, ChunkError>
where
  F: FnOnce() -> Result<ChunkGeometry, ChunkError>,
{
  catch_unwind(AssertUnwindSafe(generate)).unwrap_or_else(|payload| Err(ChunkError::from_panic(payload)))
}
