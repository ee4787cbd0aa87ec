//! Vertex normal smoothing.
//!
//! Each vertex normal becomes the unweighted mean of the face normals of all
//! triangles that share the vertex and originate in a cube within one cube of
//! the triangle's own cube. Vertices are shared when their positions are
//! equal: every edge crossing is interpolated from the lower voxel index, so
//! shared vertices are bit-identical at any cube size.
//!
//! ```text
//!   ┌───┬───┬───┐
//!   │   │ ░ │   │   cubes searched for triangle T in cube C:
//!   ├───┼───┼───┤   the 3x3x3 block around C, clamped to the grid
//!   │ ░ │ C │ ░ │
//!   ├───┼───┼───┤   halo cubes are searched too, so real cubes on the
//!   │   │ ░ │   │   chunk boundary see the same neighbours as their
//!   └───┴───┴───┘   twins in the adjacent chunk
//! ```
//!
//! Every cube touching a vertex lies in that block, so all triangles sharing a
//! vertex agree on its normal. Neighbours are visited in ascending cube order,
//! which keeps the sum order (and the result) identical across chunks and
//! between the CPU and device paths.

use glam::{UVec3, Vec3};

use crate::marching_cubes::TriangleSoup;
use crate::sizing::ChunkDimensions;
use crate::types::{ProvisionalTriangle, Triangle};

/// Neighbourhood radius in cubes.
pub const SMOOTHING_RADIUS: u32 = 1;

/// Triangles grouped by originating cube.
pub trait CubeTriangleSource {
  fn dims(&self) -> &ChunkDimensions;

  /// Triangle slots of `cube`. Slots that are not live (zero normal) are
  /// skipped.
  fn cube_triangles(&self, cube: usize) -> &[ProvisionalTriangle];
}

impl CubeTriangleSource for TriangleSoup {
  fn dims(&self) -> &ChunkDimensions {
    &self.dims
  }

  fn cube_triangles(&self, cube: usize) -> &[ProvisionalTriangle] {
    TriangleSoup::cube_triangles(self, cube)
  }
}

/// Smoothed copy of `triangle`, which originates in cube `cube`.
pub fn smooth_triangle<S: CubeTriangleSource + ?Sized>(
  source: &S,
  cube: usize,
  triangle: &ProvisionalTriangle,
) -> Triangle {
  let dims = source.dims();
  let cube = dims.cube_coords(cube);
  let lo = cube.saturating_sub(UVec3::splat(SMOOTHING_RADIUS));
  let hi = (cube + UVec3::splat(SMOOTHING_RADIUS)).min(dims.cubes - UVec3::ONE);

  let mut sums = [Vec3::ZERO; 3];
  let mut counts = [0u32; 3];

  for x in lo.x..=hi.x {
    for y in lo.y..=hi.y {
      for z in lo.z..=hi.z {
        for other in source.cube_triangles(dims.cube_index(x, y, z)) {
          if !other.is_live() {
            continue;
          }
          for (k, vertex) in triangle.vertices.iter().enumerate() {
            if other.vertices.contains(vertex) {
              sums[k] += other.normal;
              counts[k] += 1;
            }
          }
        }
      }
    }
  }

  let mut normals = [triangle.normal; 3];
  for k in 0..3 {
    if counts[k] > 0 {
      let mean = sums[k] / counts[k] as f32;
      normals[k] = mean.try_normalize().unwrap_or(triangle.normal);
    }
  }

  Triangle {
    vertices: triangle.vertices,
    normals,
  }
}

/// Per-vertex normals for every triangle of the soup, in soup order. With
/// smoothing off each vertex inherits its face normal.
pub fn smooth_normals(soup: &TriangleSoup, enabled: bool) -> Vec<Triangle> {
  if enabled {
    soup
      .triangles
      .iter()
      .zip(soup.triangle_cubes())
      .map(|(triangle, cube)| smooth_triangle(soup, cube, triangle))
      .collect()
  } else {
    soup.triangles.iter().map(Triangle::flat).collect()
  }
}

#[cfg(test)]
#[path = "smoothing_test.rs"]
mod smoothing_test;
