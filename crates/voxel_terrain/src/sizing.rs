//! Chunk partitioning derived from the terrain configuration.
//!
//! The device output buffer must hold one chunk's worth of triangles, so the
//! buffer capacity bounds the cubes per chunk:
//!
//! ```text
//!   max_cubes  = capacity / (5 * size_of::<Triangle>())
//!   side       = floor(cbrt(max_cubes))      cubes per axis, halo included
//!   real       = side - 2                    cubes emitted into the mesh
//!   voxels     = side + 1                    grid points per axis
//!
//!   3 <= side <= 1624, so a chunk always has a real cube and its voxel
//!   indices fit in u32
//!
//!   one chunk along an axis (real = 4):
//!
//!     voxel   0   1   2   3   4   5   6
//!             |---|---|---|---|---|---|
//!     cube      0   1   2   3   4   5
//!              halo [  real cubes  ] halo
//! ```
//!
//! The last chunk on each axis holds whatever remains of the axis' cubes and
//! keeps a halo on both sides.

use glam::{UVec3, Vec3};

use crate::config::TerrainConfig;
use crate::edge_table::MAX_TRIANGLES_PER_CUBE;
use crate::error::TerrainError;
use crate::types::{ChunkCoord, MinMaxAABB, Triangle};

/// Bytes of device output one cube may need.
pub const TRIANGLE_BUCKET_BYTES: u64 = (MAX_TRIANGLES_PER_CUBE * std::mem::size_of::<Triangle>()) as u64;

/// Largest chunk side (cubes, halo included) whose voxel grid still has a
/// `u32` index: `(side + 1)^3 <= u32::MAX`.
pub const MAX_CHUNK_CUBES_SIDE: u32 = 1624;

/// Partition of one axis into chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct AxisSizing {
  /// Real cubes along the whole axis.
  pub total_cubes: u32,
  pub chunks: u32,
  /// Real cubes of the last chunk (equal to the nominal side when the axis
  /// divides evenly).
  pub last_chunk_real_cubes: u32,
}

impl AxisSizing {
  fn derive(total_cubes: u32, real_side: u32) -> Self {
    let chunks = total_cubes.div_ceil(real_side);
    Self {
      total_cubes,
      chunks,
      last_chunk_real_cubes: total_cubes - (chunks - 1) * real_side,
    }
  }

  /// Real cubes of chunk `index` on this axis.
  pub fn real_cubes(&self, index: u32, real_side: u32) -> u32 {
    if index + 1 == self.chunks {
      self.last_chunk_real_cubes
    } else {
      real_side
    }
  }
}

/// Cube and voxel counts of one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDimensions {
  /// Real cubes per axis.
  pub real: UVec3,
  /// Cubes per axis, halo included (`real + 2`).
  pub cubes: UVec3,
  /// Voxels per axis (`cubes + 1`).
  pub voxels: UVec3,
}

impl ChunkDimensions {
  pub fn from_real(real: UVec3) -> Self {
    let cubes = real + UVec3::splat(2);
    Self {
      real,
      cubes,
      voxels: cubes + UVec3::ONE,
    }
  }

  pub fn voxel_count(&self) -> usize {
    volume(self.voxels)
  }

  pub fn cube_count(&self) -> usize {
    volume(self.cubes)
  }

  pub fn real_cube_count(&self) -> usize {
    volume(self.real)
  }

  /// Linear voxel index, x slowest and z fastest.
  #[inline]
  pub fn voxel_index(&self, x: u32, y: u32, z: u32) -> usize {
    linear_index(self.voxels, x, y, z)
  }

  /// Linear cube index, same ordering as voxels.
  #[inline]
  pub fn cube_index(&self, x: u32, y: u32, z: u32) -> usize {
    linear_index(self.cubes, x, y, z)
  }

  #[inline]
  pub fn voxel_coords(&self, index: usize) -> UVec3 {
    grid_coords(self.voxels, index)
  }

  #[inline]
  pub fn cube_coords(&self, index: usize) -> UVec3 {
    grid_coords(self.cubes, index)
  }

  /// True for cubes in the outer one-cube shell.
  pub fn is_halo_cube(&self, index: usize) -> bool {
    let c = self.cube_coords(index);
    let last = self.cubes - UVec3::ONE;
    c.cmpeq(UVec3::ZERO).any() || c.cmpeq(last).any()
  }
}

#[inline]
fn volume(extent: UVec3) -> usize {
  extent.x as usize * extent.y as usize * extent.z as usize
}

#[inline]
fn linear_index(extent: UVec3, x: u32, y: u32, z: u32) -> usize {
  (x as usize * extent.y as usize + y as usize) * extent.z as usize + z as usize
}

#[inline]
fn grid_coords(extent: UVec3, index: usize) -> UVec3 {
  let (ny, nz) = (extent.y as usize, extent.z as usize);
  UVec3::new((index / (nz * ny)) as u32, ((index / nz) % ny) as u32, (index % nz) as u32)
}

/// Sizing record for a whole terrain.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct TerrainSizing {
  pub cube_size: f32,
  pub max_cubes_per_chunk: u64,
  pub chunk_cubes_side: u32,
  pub chunk_cubes_side_real: u32,
  pub chunk_voxels_side: u32,
  /// World extent of a full chunk's real cubes.
  pub chunk_size: f32,
  pub terrain_size: Vec3,
  /// World position of the terrain's minimum corner (terrain is centered).
  pub terrain_start: Vec3,
  pub axes: [AxisSizing; 3],
}

impl TerrainSizing {
  /// Derive the chunk layout. Fails with a configuration error when the
  /// config is invalid, the capacity cannot hold a chunk with a halo, or the
  /// capacity allows chunks whose voxels outgrow `u32` indices.
  pub fn derive(config: &TerrainConfig) -> Result<Self, TerrainError> {
    config.validate()?;

    let cube_size = 1.0 / config.cubes_per_unit as f32;
    let max_cubes_per_chunk = config.buffer_capacity / TRIANGLE_BUCKET_BYTES;
    let side = integer_cbrt(max_cubes_per_chunk);
    if side < 3 {
      return Err(TerrainError::config(format!(
        "buffer_capacity {} fits {} cubes per chunk, at least 27 are needed for one real cube and its halo",
        config.buffer_capacity, max_cubes_per_chunk
      )));
    }
    if side > MAX_CHUNK_CUBES_SIDE as u64 {
      return Err(TerrainError::config(format!(
        "buffer_capacity {} gives chunks of {side}^3 cubes, at most {MAX_CHUNK_CUBES_SIDE}^3 keep the voxel count within u32",
        config.buffer_capacity
      )));
    }
    let chunk_cubes_side = side as u32;
    let chunk_cubes_side_real = chunk_cubes_side - 2;

    let terrain_size = Vec3::from_array(config.terrain_size);
    let mut axes = [AxisSizing::derive(1, 1); 3];
    for (axis, sizing) in axes.iter_mut().enumerate() {
      let total = (terrain_size[axis] * config.cubes_per_unit as f32).round();
      if total < 1.0 || total > u32::MAX as f32 {
        return Err(TerrainError::config(format!(
          "terrain_size[{axis}] = {} gives {total} cubes",
          terrain_size[axis]
        )));
      }
      *sizing = AxisSizing::derive(total as u32, chunk_cubes_side_real);
    }

    Ok(Self {
      cube_size,
      max_cubes_per_chunk,
      chunk_cubes_side,
      chunk_cubes_side_real,
      chunk_voxels_side: chunk_cubes_side + 1,
      chunk_size: chunk_cubes_side_real as f32 * cube_size,
      terrain_size,
      terrain_start: -terrain_size * 0.5,
      axes,
    })
  }

  pub fn chunk_counts(&self) -> UVec3 {
    UVec3::new(self.axes[0].chunks, self.axes[1].chunks, self.axes[2].chunks)
  }

  pub fn chunk_count(&self) -> usize {
    volume(self.chunk_counts())
  }

  /// All chunk coordinates, x slowest and z fastest.
  pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> {
    let counts = self.chunk_counts();
    (0..counts.x).flat_map(move |x| {
      (0..counts.y).flat_map(move |y| (0..counts.z).map(move |z| ChunkCoord::new(x, y, z)))
    })
  }

  /// Position of `coord` in [`coords`](Self::coords), if it is in the grid.
  pub fn chunk_index(&self, coord: ChunkCoord) -> Option<usize> {
    let counts = self.chunk_counts();
    if coord.x >= counts.x || coord.y >= counts.y || coord.z >= counts.z {
      return None;
    }
    Some(linear_index(counts, coord.x, coord.y, coord.z))
  }

  pub fn chunk_dimensions(&self, coord: ChunkCoord) -> ChunkDimensions {
    let real = UVec3::new(
      self.axes[0].real_cubes(coord.x, self.chunk_cubes_side_real),
      self.axes[1].real_cubes(coord.y, self.chunk_cubes_side_real),
      self.axes[2].real_cubes(coord.z, self.chunk_cubes_side_real),
    );
    ChunkDimensions::from_real(real)
  }

  /// Dimensions of a full chunk; device buffers are sized from these.
  pub fn max_chunk_dimensions(&self) -> ChunkDimensions {
    ChunkDimensions::from_real(UVec3::splat(self.chunk_cubes_side_real))
  }

  /// World position of voxel `local` of chunk `coord`.
  ///
  /// Voxel 0 sits one cube before the chunk's first real cube. Positions are
  /// computed from the global voxel index, so a halo voxel is bit-identical
  /// to the neighbour's interior voxel at the same place.
  #[inline]
  pub fn voxel_position(&self, coord: ChunkCoord, local: UVec3) -> Vec3 {
    let real = self.chunk_cubes_side_real as i64;
    let global = |c: u32, i: u32| (c as i64 * real + i as i64 - 1) as f32;
    Vec3::new(
      self.terrain_start.x + global(coord.x, local.x) * self.cube_size,
      self.terrain_start.y + global(coord.y, local.y) * self.cube_size,
      self.terrain_start.z + global(coord.z, local.z) * self.cube_size,
    )
  }

  pub fn chunk_center(&self, coord: ChunkCoord) -> Vec3 {
    let c = Vec3::new(coord.x as f32, coord.y as f32, coord.z as f32);
    self.terrain_start + (c + Vec3::splat(0.5)) * self.chunk_size
  }

  pub fn chunk_bounds(&self, coord: ChunkCoord) -> MinMaxAABB {
    MinMaxAABB::from_center_size(self.chunk_center(coord), self.chunk_size)
  }

  /// Upper bound on the triangles one chunk may emit.
  pub fn max_triangles_per_chunk(&self) -> u64 {
    (self.chunk_cubes_side_real as u64).pow(3) * MAX_TRIANGLES_PER_CUBE as u64
  }

  /// Triangle slots of the device triangle buffers (halo cubes included).
  pub fn device_triangle_capacity(&self) -> u64 {
    (self.chunk_cubes_side as u64).pow(3) * MAX_TRIANGLES_PER_CUBE as u64
  }
}

/// Largest `s` with `s^3 <= n`.
fn integer_cbrt(n: u64) -> u64 {
  let mut s = (n as f64).cbrt() as u64;
  while s > 0 && s.saturating_mul(s).saturating_mul(s) > n {
    s -= 1;
  }
  while (s + 1).saturating_mul(s + 1).saturating_mul(s + 1) <= n {
    s += 1;
  }
  s
}

#[cfg(test)]
#[path = "sizing_test.rs"]
mod sizing_test;
