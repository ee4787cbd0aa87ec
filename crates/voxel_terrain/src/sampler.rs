//! Voxel sampling: one density evaluation per grid point of a chunk.

use glam::Vec3;

use crate::density::{DensityField, OUTSIDE_SENTINEL};
use crate::sizing::{ChunkDimensions, TerrainSizing};
use crate::types::{ChunkCoord, Voxel};

/// Sampled density grid of one chunk, halo voxels included.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
  pub coord: ChunkCoord,
  pub dims: ChunkDimensions,
  /// `dims.voxel_count()` voxels, indexed by [`ChunkDimensions::voxel_index`].
  pub voxels: Vec<Voxel>,
  /// Points whose density failed or was not finite.
  pub density_failures: u32,
}

impl VoxelGrid {
  #[inline]
  pub fn voxel(&self, x: u32, y: u32, z: u32) -> &Voxel {
    &self.voxels[self.dims.voxel_index(x, y, z)]
  }
}

/// Evaluate the density at one position. Failures and non-finite values
/// become [`OUTSIDE_SENTINEL`]; the flag reports whether that happened.
#[inline]
pub fn sample_density<D: DensityField + ?Sized>(field: &D, position: Vec3) -> (f32, bool) {
  match field.try_density(position) {
    Ok(value) if value.is_finite() => (value, false),
    Ok(_) => (OUTSIDE_SENTINEL, true),
    Err(err) => {
      tracing::trace!(%err, "density evaluation failed");
      (OUTSIDE_SENTINEL, true)
    }
  }
}

/// Sample voxel `index` of chunk `coord`.
#[inline]
pub fn sample_voxel<D: DensityField + ?Sized>(
  sizing: &TerrainSizing,
  coord: ChunkCoord,
  dims: &ChunkDimensions,
  index: usize,
  field: &D,
) -> (Voxel, bool) {
  let position = sizing.voxel_position(coord, dims.voxel_coords(index));
  let (value, failed) = sample_density(field, position);
  (Voxel::new(position, value), failed)
}

/// Fill the chunk's voxel grid, one [`sample_voxel`] per index.
pub fn sample_chunk<D: DensityField + ?Sized>(
  sizing: &TerrainSizing,
  coord: ChunkCoord,
  field: &D,
) -> VoxelGrid {
  let dims = sizing.chunk_dimensions(coord);
  let mut voxels = Vec::with_capacity(dims.voxel_count());
  let mut density_failures = 0u32;

  for index in 0..dims.voxel_count() {
    let (voxel, failed) = sample_voxel(sizing, coord, &dims, index, field);
    density_failures += failed as u32;
    voxels.push(voxel);
  }

  if density_failures > 0 {
    tracing::warn!(
      chunk = %coord,
      failures = density_failures,
      "density evaluation failed, voxels treated as outside"
    );
  }

  VoxelGrid {
    coord,
    dims,
    voxels,
    density_failures,
  }
}

#[cfg(test)]
#[path = "sampler_test.rs"]
mod sampler_test;
