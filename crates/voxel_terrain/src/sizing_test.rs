use super::*;
use crate::test_utils::{capacity_for_side, small_config};

#[test]
fn test_default_sizing() {
  let sizing = TerrainSizing::derive(&TerrainConfig::default()).expect("default config is valid");

  assert_eq!(sizing.cube_size, 0.05);
  assert_eq!(sizing.max_cubes_per_chunk, 59_652);
  assert_eq!(sizing.chunk_cubes_side, 39);
  assert_eq!(sizing.chunk_cubes_side_real, 37);
  assert_eq!(sizing.chunk_voxels_side, 40);
  assert_eq!(sizing.axes[0].total_cubes, 400);
  assert_eq!(sizing.axes[0].chunks, 11);
  assert_eq!(sizing.axes[0].last_chunk_real_cubes, 30);
  assert_eq!(sizing.axes[1].total_cubes, 200);
  assert_eq!(sizing.axes[1].chunks, 6);
  assert_eq!(sizing.axes[1].last_chunk_real_cubes, 15);
  assert_eq!(sizing.axes[2], sizing.axes[0]);
}

#[test]
fn test_bucket_holds_five_triangles() {
  assert_eq!(std::mem::size_of::<Triangle>(), 72, "three positions and three normals");
  assert_eq!(TRIANGLE_BUCKET_BYTES, 5 * 72);
}

#[test]
fn test_integer_cbrt() {
  assert_eq!(integer_cbrt(0), 0);
  assert_eq!(integer_cbrt(26), 2);
  assert_eq!(integer_cbrt(27), 3);
  assert_eq!(integer_cbrt(1728), 12);
  assert_eq!(integer_cbrt(1727), 11);
  assert_eq!(integer_cbrt(59_652), 39);
}

#[test]
fn test_partition_is_exact() {
  let sizes = [[1.0, 1.0, 1.0], [3.3, 0.7, 2.05], [7.0, 2.5, 1.15]];
  for size in sizes {
    for side in [3, 5, 12] {
      let config = small_config(size, 10, side);
      let sizing = TerrainSizing::derive(&config).expect("valid");
      for (axis, axis_sizing) in sizing.axes.iter().enumerate() {
        let sum: u32 = (0..axis_sizing.chunks)
          .map(|c| axis_sizing.real_cubes(c, sizing.chunk_cubes_side_real))
          .sum();
        assert_eq!(
          sum, axis_sizing.total_cubes,
          "axis {} of {:?} with side {} does not partition exactly",
          axis, size, side
        );
        assert!(axis_sizing.last_chunk_real_cubes >= 1);
        assert!(axis_sizing.last_chunk_real_cubes <= sizing.chunk_cubes_side_real);
      }
    }
  }
}

#[test]
fn test_exactly_three_chunks() {
  // side 12 -> 10 real cubes, 10 cubes per unit -> one chunk is 1.0 unit
  let config = small_config([3.0, 1.0, 1.0], 10, 12);
  let sizing = TerrainSizing::derive(&config).expect("valid");

  assert_eq!(sizing.chunk_cubes_side_real, 10);
  assert_eq!(sizing.axes[0].chunks, 3);
  for c in 0..3 {
    assert_eq!(sizing.axes[0].real_cubes(c, 10), 10, "chunk {} is undersized", c);
  }
}

#[test]
fn test_two_and_a_half_chunks() {
  let config = small_config([2.5, 1.0, 1.0], 10, 12);
  let sizing = TerrainSizing::derive(&config).expect("valid");

  assert_eq!(sizing.axes[0].chunks, 3);
  assert_eq!(sizing.axes[0].last_chunk_real_cubes, 5);

  let last = sizing.chunk_dimensions(ChunkCoord::new(2, 0, 0));
  assert_eq!(last.real.x, 5);
  // Halo on both sides
  assert_eq!(last.cubes.x, 7);
  assert_eq!(last.voxels.x, 8);
  assert!(last.is_halo_cube(last.cube_index(0, 5, 5)));
  assert!(last.is_halo_cube(last.cube_index(6, 5, 5)));
  assert!(!last.is_halo_cube(last.cube_index(5, 5, 5)));
}

#[test]
fn test_halo_voxels_match_neighbour_interior() {
  let config = small_config([2.5, 2.2, 1.7], 10, 8);
  let sizing = TerrainSizing::derive(&config).expect("valid");
  let real = sizing.chunk_cubes_side_real;

  for coord in sizing.coords() {
    if coord.x + 1 >= sizing.axes[0].chunks {
      continue;
    }
    let dims = sizing.chunk_dimensions(coord);
    let neighbour = ChunkCoord::new(coord.x + 1, coord.y, coord.z);
    for y in 0..dims.voxels.y {
      for z in 0..dims.voxels.z {
        // Last three voxel planes of `coord` are the first three of `neighbour`.
        for (mine, theirs) in [(real, 0), (real + 1, 1), (real + 2, 2)] {
          let a = sizing.voxel_position(coord, UVec3::new(mine, y, z));
          let b = sizing.voxel_position(neighbour, UVec3::new(theirs, y, z));
          assert_eq!(a, b, "seam mismatch between {} and {}", coord, neighbour);
        }
      }
    }
  }
}

#[test]
fn test_rejects_tiny_capacity() {
  let config = TerrainConfig::default().with_buffer_capacity(capacity_for_side(3) - 1);
  assert!(matches!(
    TerrainSizing::derive(&config),
    Err(TerrainError::Configuration(_))
  ));

  let config = TerrainConfig::default().with_buffer_capacity(capacity_for_side(3));
  let sizing = TerrainSizing::derive(&config).expect("27 cubes is enough");
  assert_eq!(sizing.chunk_cubes_side_real, 1);
}

#[test]
fn test_rejects_capacity_beyond_u32_voxels() {
  let config = small_config([1.0, 1.0, 1.0], 2, 3).with_buffer_capacity(4_000_000_000_000);
  match TerrainSizing::derive(&config) {
    Err(TerrainError::Configuration(message)) => assert!(message.contains("u32"), "message: {message}"),
    other => panic!("expected a configuration error, got {other:?}"),
  }

  let config = config.with_buffer_capacity(capacity_for_side(MAX_CHUNK_CUBES_SIDE));
  let sizing = TerrainSizing::derive(&config).expect("largest side is valid");
  assert_eq!(sizing.chunk_cubes_side, MAX_CHUNK_CUBES_SIDE);
  let dims = sizing.max_chunk_dimensions();
  assert!(dims.voxel_count() <= u32::MAX as usize);
  assert_eq!(dims.voxel_index(1624, 1624, 1624), dims.voxel_count() - 1);

  let config = config.with_buffer_capacity(capacity_for_side(MAX_CHUNK_CUBES_SIDE + 1));
  assert!(matches!(
    TerrainSizing::derive(&config),
    Err(TerrainError::Configuration(_))
  ));
}

#[test]
fn test_counts_do_not_wrap_near_the_limit() {
  let dims = ChunkDimensions::from_real(UVec3::splat(MAX_CHUNK_CUBES_SIDE - 2));
  assert_eq!(dims.voxel_count(), 1625usize.pow(3));
  assert_eq!(dims.cube_count(), 1624usize.pow(3));
  let last = dims.cube_count() - 1;
  assert_eq!(dims.cube_coords(last), UVec3::splat(1623));
  assert!(dims.is_halo_cube(last));
}

#[test]
fn test_rejects_extent_below_one_cube() {
  let config = small_config([0.01, 1.0, 1.0], 10, 12);
  assert!(matches!(
    TerrainSizing::derive(&config),
    Err(TerrainError::Configuration(_))
  ));
}

#[test]
fn test_coords_and_index_agree() {
  let config = small_config([2.5, 1.5, 3.0], 10, 12);
  let sizing = TerrainSizing::derive(&config).expect("valid");

  let coords: Vec<_> = sizing.coords().collect();
  assert_eq!(coords.len(), sizing.chunk_count());
  for (i, coord) in coords.iter().enumerate() {
    assert_eq!(sizing.chunk_index(*coord), Some(i));
  }
  assert_eq!(sizing.chunk_index(ChunkCoord::new(3, 0, 0)), None);
}

#[test]
fn test_chunk_center_and_bounds() {
  let config = small_config([2.0, 1.0, 1.0], 10, 12);
  let sizing = TerrainSizing::derive(&config).expect("valid");

  let center = sizing.chunk_center(ChunkCoord::new(1, 0, 0));
  assert!((center - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);

  let bounds = sizing.chunk_bounds(ChunkCoord::new(0, 0, 0));
  assert!((bounds.min - Vec3::new(-1.0, -0.5, -0.5)).length() < 1e-6);
  assert!((bounds.max - Vec3::new(0.0, 0.5, 0.5)).length() < 1e-6);
}

#[test]
fn test_index_coords_roundtrip() {
  let dims = ChunkDimensions::from_real(UVec3::new(3, 1, 2));
  for i in 0..dims.cube_count() {
    let c = dims.cube_coords(i);
    assert_eq!(dims.cube_index(c.x, c.y, c.z), i);
  }
  for i in 0..dims.voxel_count() {
    let v = dims.voxel_coords(i);
    assert_eq!(dims.voxel_index(v.x, v.y, v.z), i);
  }
}

#[test]
fn test_triangle_bounds() {
  let config = small_config([1.0, 1.0, 1.0], 10, 12);
  let sizing = TerrainSizing::derive(&config).expect("valid");
  assert_eq!(sizing.max_triangles_per_chunk(), 1000 * 5);
  assert_eq!(sizing.device_triangle_capacity(), 1728 * 5);
  assert!(sizing.device_triangle_capacity() * 72 <= config.buffer_capacity);
}
