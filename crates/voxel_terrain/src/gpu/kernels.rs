//! The four pipeline kernels, one function per invocation.
//!
//! ```text
//!   generate_voxel   one invocation per voxel        -> voxel buffer
//!   march_cubes      one invocation per cube         -> 5 triangle slots per cube
//!   smooth_normals   one invocation per slot         -> smoothed triangle buffer
//!   create_output    one invocation per slot         -> append buffer (non-halo only)
//! ```
//!
//! Each kernel reuses the CPU stage for a single element, so both paths
//! evaluate the same expressions.

use bytemuck::Zeroable;

use crate::density::DensityField;
use crate::edge_table::MAX_TRIANGLES_PER_CUBE;
use crate::marching_cubes::march_cube;
use crate::mesh_builder::is_output_triangle;
use crate::sampler::sample_voxel;
use crate::sizing::{ChunkDimensions, TerrainSizing};
use crate::smoothing::{smooth_triangle, CubeTriangleSource};
use crate::types::{ChunkCoord, ProvisionalTriangle, Triangle, Voxel};

/// Per-chunk uniforms shared by all kernels.
#[derive(Clone, Copy, Debug)]
pub struct KernelParams<'a> {
  pub sizing: &'a TerrainSizing,
  pub coord: ChunkCoord,
  pub dims: ChunkDimensions,
  pub interpolate: bool,
  pub smooth: bool,
}

/// Sample voxel `index`. Returns `true` when the density failed.
#[inline]
pub fn generate_voxel<D: DensityField + ?Sized>(
  params: &KernelParams<'_>,
  field: &D,
  index: usize,
  out: &mut Voxel,
) -> bool {
  let (voxel, failed) = sample_voxel(params.sizing, params.coord, &params.dims, index, field);
  *out = voxel;
  failed
}

/// Triangulate cube `cube` into its 5 slots. Unused slots stay zeroed (zero
/// normal, not live). Returns the number of zero-area triangles dropped.
#[inline]
pub fn march_cubes(params: &KernelParams<'_>, voxels: &[Voxel], cube: usize, slots: &mut [ProvisionalTriangle]) -> u32 {
  let marched = march_cube(voxels, &params.dims, cube, params.interpolate);
  for (slot, triangle) in slots.iter_mut().zip(
    marched
      .triangles
      .iter()
      .copied()
      .chain(std::iter::repeat(ProvisionalTriangle::zeroed())),
  ) {
    *slot = triangle;
  }
  marched.degenerate
}

/// Provisional triangle slots viewed per cube.
pub struct SlotSource<'a> {
  pub dims: ChunkDimensions,
  pub slots: &'a [ProvisionalTriangle],
}

impl CubeTriangleSource for SlotSource<'_> {
  fn dims(&self) -> &ChunkDimensions {
    &self.dims
  }

  fn cube_triangles(&self, cube: usize) -> &[ProvisionalTriangle] {
    let start = cube * MAX_TRIANGLES_PER_CUBE;
    self
      .slots
      .get(start..start + MAX_TRIANGLES_PER_CUBE)
      .unwrap_or(&[])
  }
}

/// Cube that owns triangle slot `index`.
#[inline]
pub fn slot_cube(index: usize) -> usize {
  index / MAX_TRIANGLES_PER_CUBE
}

/// Per-vertex normals for slot `index`. Dead slots stay dead.
#[inline]
pub fn smooth_normals(params: &KernelParams<'_>, source: &SlotSource<'_>, index: usize) -> Triangle {
  let triangle = &source.slots[index];
  if !triangle.is_live() {
    return Triangle::zeroed();
  }
  if params.smooth {
    smooth_triangle(source, slot_cube(index), triangle)
  } else {
    Triangle::flat(triangle)
  }
}

/// Emit slot `index` when it is live and came from a real cube.
#[inline]
pub fn create_output(params: &KernelParams<'_>, triangles: &[Triangle], index: usize) -> Option<Triangle> {
  let triangle = triangles[index];
  is_output_triangle(&params.dims, slot_cube(index), &triangle).then_some(triangle)
}
