//! Final mesh assembly: drop halo geometry, flatten to vertex arrays.

use crate::marching_cubes::triangle_cubes;
use crate::sizing::ChunkDimensions;
use crate::types::{ChunkMesh, Triangle};

/// True for live triangles produced by a real (non-halo) cube.
#[inline]
pub fn is_output_triangle(dims: &ChunkDimensions, cube: usize, triangle: &Triangle) -> bool {
  triangle.is_live() && !dims.is_halo_cube(cube)
}

/// Build the chunk's renderable mesh from smoothed triangles, grouped by cube
/// as `cube_offsets` describes (see [`TriangleSoup`](crate::marching_cubes::TriangleSoup)).
///
/// The result is a soup with `3 * n` vertices and normals and the index list
/// `[0, 1, .., 3n - 1]`.
pub fn build_chunk_mesh(dims: &ChunkDimensions, cube_offsets: &[u32], triangles: &[Triangle]) -> ChunkMesh {
  let kept = triangles
    .iter()
    .zip(triangle_cubes(cube_offsets))
    .filter(|(triangle, cube)| is_output_triangle(dims, *cube, triangle))
    .map(|(triangle, _)| triangle);
  let mut mesh = ChunkMesh::with_capacity(kept.clone().count());
  for triangle in kept {
    mesh.push_triangle(triangle);
  }
  mesh
}

#[cfg(test)]
#[path = "mesh_builder_test.rs"]
mod mesh_builder_test;
