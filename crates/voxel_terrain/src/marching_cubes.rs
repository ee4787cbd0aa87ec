//! Marching Cubes triangulation of a sampled voxel grid.
//!
//! # Algorithm
//!
//! For every cube of the grid (halo cubes included, smoothing needs them):
//!
//! 1. Classify: bit `i` of the configuration is set when corner `i` is inside
//!    (`density < ISO_LEVEL`).
//! 2. Look up the crossed edges (`EDGE_TABLE`) and their triangles
//!    (`TRI_TABLE`, at most 5).
//! 3. Place one vertex per crossed edge by linear interpolation of the two
//!    corner densities, or at the edge midpoint.
//! 4. Face normal = normalised cross product, facing out of the solid.
//!    Zero-area triangles are dropped.
//!
//! Edge endpoints are always taken in ascending voxel-index order, so
//! neighbouring cubes (and neighbouring chunks, through the halo) compute
//! bit-identical positions for a shared edge.
//!
//! Triangle winding follows the table: clockwise seen from outside.

use glam::{UVec3, Vec3};
use smallvec::SmallVec;

use crate::edge_table::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, MAX_TRIANGLES_PER_CUBE, TRI_TABLE};
use crate::sampler::VoxelGrid;
use crate::sizing::ChunkDimensions;
use crate::types::{ProvisionalTriangle, Voxel};

/// Density of the extracted surface.
pub const ISO_LEVEL: f32 = 0.0;

/// Triangles of one cube.
pub type CubeTriangles = SmallVec<[ProvisionalTriangle; MAX_TRIANGLES_PER_CUBE]>;

/// Result of triangulating one cube.
#[derive(Clone, Debug, Default)]
pub struct MarchedCube {
  pub triangles: CubeTriangles,
  /// Zero-area triangles dropped from this cube.
  pub degenerate: u32,
}

/// Triangle soup of a chunk, addressable by originating cube.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleSoup {
  pub dims: ChunkDimensions,
  pub triangles: Vec<ProvisionalTriangle>,
  /// Triangles of cube `c` are `triangles[cube_offsets[c]..cube_offsets[c + 1]]`.
  pub cube_offsets: Vec<u32>,
  pub degenerate: u32,
}

impl TriangleSoup {
  pub fn len(&self) -> usize {
    self.triangles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }

  #[inline]
  pub fn cube_triangles(&self, cube: usize) -> &[ProvisionalTriangle] {
    match (self.cube_offsets.get(cube), self.cube_offsets.get(cube + 1)) {
      (Some(&start), Some(&end)) => &self.triangles[start as usize..end as usize],
      _ => &[],
    }
  }

  /// Originating cube of each triangle, in triangle order.
  pub fn triangle_cubes(&self) -> impl Iterator<Item = usize> + '_ {
    triangle_cubes(&self.cube_offsets)
  }
}

/// Expand per-cube triangle offsets into one cube index per triangle.
pub fn triangle_cubes(cube_offsets: &[u32]) -> impl Iterator<Item = usize> + Clone + '_ {
  cube_offsets
    .windows(2)
    .enumerate()
    .flat_map(|(cube, range)| std::iter::repeat(cube).take(range[1].saturating_sub(range[0]) as usize))
}

/// Voxel indices of the 8 corners of `cube`, in table corner order.
#[inline]
pub fn cube_corners(dims: &ChunkDimensions, cube: UVec3) -> [usize; 8] {
  CORNER_OFFSETS.map(|[dx, dy, dz]| dims.voxel_index(cube.x + dx, cube.y + dy, cube.z + dz))
}

/// 8-bit configuration index from corner densities.
#[inline]
pub fn classify_cube(values: &[f32; 8]) -> u8 {
  let mut config = 0u8;
  for (corner, &value) in values.iter().enumerate() {
    if value < ISO_LEVEL {
      config |= 1 << corner;
    }
  }
  config
}

/// Surface crossing on the edge between voxels `a` and `b`.
///
/// `index_a`/`index_b` are the voxels' linear indices; the lower one is the
/// interpolation origin. Falls back to the midpoint when interpolation is off
/// or both densities are equal.
#[inline]
pub fn interpolate_edge(a: &Voxel, index_a: usize, b: &Voxel, index_b: usize, interpolate: bool) -> Vec3 {
  let (start, end) = if index_a <= index_b { (a, b) } else { (b, a) };
  if !interpolate || start.value == end.value {
    return (start.position + end.position) * 0.5;
  }
  let t = (ISO_LEVEL - start.value) / (end.value - start.value);
  start.position + t * (end.position - start.position)
}

/// Unit face normal facing out of the solid, `None` for zero-area triangles.
#[inline]
pub fn face_normal(vertices: &[Vec3; 3]) -> Option<Vec3> {
  let [v0, v1, v2] = *vertices;
  (v2 - v0).cross(v1 - v0).try_normalize()
}

/// Triangulate cube `cube_index` of a grid.
pub fn march_cube(voxels: &[Voxel], dims: &ChunkDimensions, cube_index: usize, interpolate: bool) -> MarchedCube {
  let mut marched = MarchedCube::default();

  let corners = cube_corners(dims, dims.cube_coords(cube_index));
  let values = corners.map(|i| voxels[i].value);
  let config = classify_cube(&values);
  let edge_mask = EDGE_TABLE[config as usize];
  if edge_mask == 0 {
    return marched;
  }

  let mut edge_points = [Vec3::ZERO; 12];
  for (edge, point) in edge_points.iter_mut().enumerate() {
    if edge_mask & (1 << edge) != 0 {
      let [ca, cb] = EDGE_CORNERS[edge];
      let (ia, ib) = (corners[ca], corners[cb]);
      *point = interpolate_edge(&voxels[ia], ia, &voxels[ib], ib, interpolate);
    }
  }

  for edges in TRI_TABLE[config as usize].chunks_exact(3) {
    if edges[0] < 0 {
      break;
    }
    let vertices = [
      edge_points[edges[0] as usize],
      edge_points[edges[1] as usize],
      edge_points[edges[2] as usize],
    ];
    match face_normal(&vertices) {
      Some(normal) => marched
        .triangles
        .push(ProvisionalTriangle::new(vertices, normal)),
      None => marched.degenerate += 1,
    }
  }

  marched
}

/// Triangulate every cube of the grid, in linear cube order.
pub fn triangulate(grid: &VoxelGrid, interpolate: bool) -> TriangleSoup {
  let dims = grid.dims;
  let cube_count = dims.cube_count();
  let mut soup = TriangleSoup {
    dims,
    triangles: Vec::new(),
    cube_offsets: Vec::with_capacity(cube_count + 1),
    degenerate: 0,
  };

  soup.cube_offsets.push(0);
  for cube in 0..cube_count {
    let marched = march_cube(&grid.voxels, &dims, cube, interpolate);
    soup.degenerate += marched.degenerate;
    soup.triangles.extend(marched.triangles);
    soup.cube_offsets.push(soup.triangles.len() as u32);
  }

  if soup.degenerate > 0 {
    tracing::debug!(
      chunk = %grid.coord,
      dropped = soup.degenerate,
      "dropped zero-area triangles"
    );
  }

  soup
}

#[cfg(test)]
#[path = "marching_cubes_test.rs"]
mod marching_cubes_test;
