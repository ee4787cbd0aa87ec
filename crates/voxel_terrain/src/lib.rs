//! voxel_terrain - Chunked Marching Cubes terrain generation
//!
//! Generates a terrain surface from a signed density field. The terrain is
//! split into chunks sized so one chunk's triangles fit a single device
//! buffer; every chunk carries a one-cube halo so normals are smoothed across
//! chunk borders without reading sibling chunks.
//!
//! # Pipeline
//!
//! ```text
//! ┌────────────┐     ┌────────────────┐     ┌───────────┐     ┌───────────────┐
//! │ VoxelGrid  ├────►│ Marching Cubes ├────►│ Smoothing ├────►│ Mesh building │
//! └────────────┘     └────────────────┘     └───────────┘     └───────────────┘
//!  density per        triangle soup,         per-vertex        halo trimmed,
//!  grid point         face normals           normals           ChunkMesh
//! ```
//!
//! The same four stages run as sequential dispatches on a
//! [`ComputeDevice`](gpu::ComputeDevice) for the device strategies.
//!
//! # Strategies
//!
//! - **CpuSync**: every chunk on the calling thread
//! - **CpuThreaded**: worker pool, single-threaded assembly in arrival order
//! - **CpuGpuHybrid**: device pipeline, geometry read back into a `ChunkMesh`
//! - **GpuResident**: device pipeline, output buffer kept for the renderer
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voxel_terrain::{GenerationStrategy, SphereDensity, TerrainBuildContext, TerrainConfig};
//!
//! let config = TerrainConfig::default()
//!   .with_terrain_size([1.0, 1.0, 1.0])
//!   .with_cubes_per_unit(2)
//!   .with_strategy(GenerationStrategy::CpuSync);
//! let mut terrain = TerrainBuildContext::new(config, Arc::new(SphereDensity::at_origin(0.4)))?;
//! let report = terrain.build();
//!
//! println!("{} chunks, {} triangles", report.total_chunks, report.triangles);
//! ```

pub mod config;
pub mod edge_table;
pub mod error;
pub mod sizing;
pub mod types;

// Re-export commonly used items
pub use config::{GenerationStrategy, NoiseConfig, TerrainConfig};
pub use error::{ChunkError, DensityError, TerrainError};
pub use sizing::{AxisSizing, ChunkDimensions, TerrainSizing};
pub use types::{ChunkCoord, ChunkMesh, MinMaxAABB, ProvisionalTriangle, Triangle, Voxel};

// Density sources
pub mod density;
pub use density::{
  BoxDensity, DensityField, FnDensity, LayeredNoiseTerrain, PlaneDensity, SphereDensity, TryFnDensity,
};

// Pipeline stages
pub mod marching_cubes;
pub mod mesh_builder;
pub mod sampler;
pub mod smoothing;

// Chunks and their lifecycle
pub mod chunk;
pub use chunk::{Chunk, ChunkState, ChunkStats};

// Device pipeline
pub mod gpu;
pub use gpu::{DeviceOutput, GpuPipeline, SoftwareDevice};

// Execution
pub mod engine;
pub mod threading;
pub mod timing;
pub use engine::{BuildReport, Strategy, TerrainBuildContext};
pub use timing::{Measurements, NoMeasurements, StageKind, StageSummary, StageTimer};

#[cfg(test)]
mod test_utils;
