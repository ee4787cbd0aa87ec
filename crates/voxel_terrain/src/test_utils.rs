//! Shared test fixtures.

use std::collections::HashMap;

use glam::{UVec3, Vec3};

use crate::config::TerrainConfig;
use crate::density::DensityField;
use crate::sampler::VoxelGrid;
use crate::sizing::{ChunkDimensions, TRIANGLE_BUCKET_BYTES};
use crate::types::{ChunkCoord, ChunkMesh, Voxel};

/// Buffer capacity giving chunks of exactly `side` cubes per axis.
pub fn capacity_for_side(side: u32) -> u64 {
  (side as u64).pow(3) * TRIANGLE_BUCKET_BYTES
}

/// Config with the given extent, resolution and chunk side.
pub fn small_config(size: [f32; 3], cubes_per_unit: u32, side: u32) -> TerrainConfig {
  TerrainConfig::default()
    .with_terrain_size(size)
    .with_cubes_per_unit(cubes_per_unit)
    .with_buffer_capacity(capacity_for_side(side))
}

/// Grid of `real` cubes plus halo, voxel `(i, j, k)` at
/// `origin + (i, j, k) * cube_size`.
pub fn grid_from_field(real: UVec3, origin: Vec3, cube_size: f32, field: &dyn DensityField) -> VoxelGrid {
  let dims = ChunkDimensions::from_real(real);
  let mut voxels = Vec::with_capacity(dims.voxel_count());
  for index in 0..dims.voxel_count() {
    let c = dims.voxel_coords(index).as_vec3();
    let position = origin + c * cube_size;
    voxels.push(Voxel::new(position, field.density(position)));
  }
  VoxelGrid {
    coord: ChunkCoord::default(),
    dims,
    voxels,
    density_failures: 0,
  }
}

/// Grid with explicit densities, voxel `(i, j, k)` at `(i, j, k)`.
pub fn grid_from_values(real: UVec3, values: &[f32]) -> VoxelGrid {
  let dims = ChunkDimensions::from_real(real);
  assert_eq!(values.len(), dims.voxel_count());
  let voxels = values
    .iter()
    .enumerate()
    .map(|(i, &v)| Voxel::new(dims.voxel_coords(i).as_vec3(), v))
    .collect();
  VoxelGrid {
    coord: ChunkCoord::default(),
    dims,
    voxels,
    density_failures: 0,
  }
}

fn vertex_key(v: Vec3) -> [u32; 3] {
  [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}

/// True when every triangle edge of the soup is shared by exactly two
/// triangles (positions compared bit for bit).
pub fn is_closed(mesh: &ChunkMesh) -> bool {
  let mut edges: HashMap<([u32; 3], [u32; 3]), u32> = HashMap::new();
  for tri in mesh.indices.chunks_exact(3) {
    for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
      let ka = vertex_key(mesh.vertices[a as usize]);
      let kb = vertex_key(mesh.vertices[b as usize]);
      let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
      *edges.entry(key).or_default() += 1;
    }
  }
  !edges.is_empty() && edges.values().all(|&count| count == 2)
}

/// Largest distance between corresponding vertices of two meshes.
pub fn max_vertex_deviation(a: &ChunkMesh, b: &ChunkMesh) -> f32 {
  a.vertices
    .iter()
    .zip(&b.vertices)
    .map(|(p, q)| p.distance(*q))
    .fold(0.0, f32::max)
}
