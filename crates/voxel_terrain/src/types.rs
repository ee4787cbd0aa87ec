//! Core data types shared by the CPU stages and the device pipeline.
//!
//! The `#[repr(C)]` structs are `bytemuck::Pod` so the same layouts back the
//! host vectors and the device buffers.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Grid sample: world position and scalar density.
/// Negative = inside/solid, positive = outside/air.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Voxel {
  pub position: Vec3,
  pub value: f32,
}

impl Voxel {
  pub fn new(position: Vec3, value: f32) -> Self {
    Self { position, value }
  }

  #[inline]
  pub fn is_inside(&self) -> bool {
    self.value < 0.0
  }
}

/// Triangle as emitted by the triangulator: three positions and one face
/// normal.
///
/// Device slots carry no cube index or flags: the originating cube is the
/// slot index divided by 5, and a slot is live when its normal is non-zero
/// (zero-area triangles are never emitted, unused slots are zeroed).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ProvisionalTriangle {
  pub vertices: [Vec3; 3],
  pub normal: Vec3,
}

impl ProvisionalTriangle {
  pub fn new(vertices: [Vec3; 3], normal: Vec3) -> Self {
    Self { vertices, normal }
  }

  #[inline]
  pub fn is_live(&self) -> bool {
    self.normal != Vec3::ZERO
  }
}

/// Triangle with per-vertex normals, after the smoothing stage. This is the
/// output buffer's element.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Triangle {
  pub vertices: [Vec3; 3],
  pub normals: [Vec3; 3],
}

impl Triangle {
  /// Flat-shaded triangle: every vertex inherits the face normal.
  pub fn flat(source: &ProvisionalTriangle) -> Self {
    Self {
      vertices: source.vertices,
      normals: [source.normal; 3],
    }
  }

  #[inline]
  pub fn is_live(&self) -> bool {
    self.normals.iter().any(|n| *n != Vec3::ZERO)
  }
}

/// Integer chunk coordinate within the terrain's chunk grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
  pub x: u32,
  pub y: u32,
  pub z: u32,
}

impl ChunkCoord {
  pub const fn new(x: u32, y: u32, z: u32) -> Self {
    Self { x, y, z }
  }

  pub fn to_array(self) -> [u32; 3] {
    [self.x, self.y, self.z]
  }
}

impl From<[u32; 3]> for ChunkCoord {
  fn from([x, y, z]: [u32; 3]) -> Self {
    Self { x, y, z }
  }
}

impl fmt::Display for ChunkCoord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {}, {})", self.x, self.y, self.z)
  }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxAABB {
  pub min: Vec3,
  pub max: Vec3,
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: Vec3::splat(f32::INFINITY),
      max: Vec3::splat(f32::NEG_INFINITY),
    }
  }

  pub fn new(min: Vec3, max: Vec3) -> Self {
    Self { min, max }
  }

  /// Cube of edge `size` centered on `center`.
  pub fn from_center_size(center: Vec3, size: f32) -> Self {
    let half = Vec3::splat(size * 0.5);
    Self {
      min: center - half,
      max: center + half,
    }
  }

  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min.cmple(self.max).all()
  }

  pub fn contains(&self, point: Vec3) -> bool {
    self.min.cmple(point).all() && point.cmple(self.max).all()
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Final renderable chunk geometry. A triangle soup: three unshared vertices
/// per triangle and a trivial index list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
  pub vertices: Vec<Vec3>,
  pub normals: Vec<Vec3>,
  pub indices: Vec<u32>,
  /// Bounds of the emitted vertices (empty for an empty mesh).
  pub bounds: MinMaxAABB,
}

impl ChunkMesh {
  pub fn with_capacity(triangles: usize) -> Self {
    Self {
      vertices: Vec::with_capacity(triangles * 3),
      normals: Vec::with_capacity(triangles * 3),
      indices: Vec::with_capacity(triangles * 3),
      bounds: MinMaxAABB::empty(),
    }
  }

  /// Append one triangle's vertices and normals.
  pub fn push_triangle(&mut self, triangle: &Triangle) {
    for (vertex, normal) in triangle.vertices.iter().zip(triangle.normals.iter()) {
      self.indices.push(self.vertices.len() as u32);
      self.vertices.push(*vertex);
      self.normals.push(*normal);
      self.bounds.encapsulate(*vertex);
    }
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }
}

/// Index list `[0, 1, 2, .., 3n - 1]` for `n` unshared triangles.
pub fn trivial_indices(triangle_count: usize) -> Vec<u32> {
  (0..(triangle_count * 3) as u32).collect()
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
