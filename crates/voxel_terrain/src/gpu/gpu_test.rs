use glam::Vec3;

use super::*;
use crate::density::{SphereDensity, TryFnDensity};
use crate::error::DensityError;
use crate::marching_cubes::triangulate;
use crate::mesh_builder::build_chunk_mesh;
use crate::sampler::sample_chunk;
use crate::smoothing::smooth_normals;
use crate::test_utils::{max_vertex_deviation, small_config};
use crate::timing::NoMeasurements;

fn sizing() -> TerrainSizing {
  // 2 chunks of 4 real cubes per axis
  TerrainSizing::derive(&small_config([2.0, 2.0, 2.0], 4, 6)).expect("valid config")
}

fn cpu_mesh(sizing: &TerrainSizing, coord: ChunkCoord, field: &dyn DensityField) -> ChunkMesh {
  let grid = sample_chunk(sizing, coord, field);
  let soup = triangulate(&grid, true);
  let triangles = smooth_normals(&soup, true);
  build_chunk_mesh(&grid.dims, &soup.cube_offsets, &triangles)
}

#[test]
fn test_slots_map_to_cubes() {
  assert_eq!(kernels::slot_cube(0), 0);
  assert_eq!(kernels::slot_cube(4), 0);
  assert_eq!(kernels::slot_cube(5), 1);
  assert_eq!(kernels::slot_cube(5 * 27 + 3), 27);
}

#[test]
fn test_output_stride_is_bare_triangle() {
  let sizing = sizing();
  let sphere = SphereDensity::at_origin(0.7);
  let pipeline = GpuPipeline::software(1 << 24);
  let run = pipeline
    .run(&sizing, ChunkCoord::new(0, 0, 0), &sphere, true, true, &NoMeasurements)
    .expect("chunk fits the device");

  assert_eq!(run.output.buffer().size_bytes(), sizing.device_triangle_capacity() * 72);
}

#[test]
fn test_matches_cpu_pipeline() {
  let sizing = sizing();
  let sphere = SphereDensity::at_origin(0.7);
  let pipeline = GpuPipeline::software(1 << 24);

  for coord in sizing.coords() {
    let expected = cpu_mesh(&sizing, coord, &sphere);
    let run = pipeline
      .run(&sizing, coord, &sphere, true, true, &NoMeasurements)
      .expect("chunk fits the device");
    let actual = run.output.read_back(&**pipeline.device());

    assert!(expected.triangle_count() > 0, "sphere crosses chunk {coord}");
    assert_eq!(actual.triangle_count(), expected.triangle_count(), "chunk {coord}");
    assert!(max_vertex_deviation(&expected, &actual) < 1e-4);
    for (a, b) in expected.normals.iter().zip(&actual.normals) {
      assert!(a.distance(*b) < 1e-4, "normals differ in chunk {coord}");
    }
  }
}

#[test]
fn test_only_output_buffer_survives() {
  let sizing = sizing();
  let sphere = SphereDensity::at_origin(0.7);
  let pipeline = GpuPipeline::software(1 << 24);
  let memory = Arc::clone(pipeline.device().memory());

  let run = pipeline
    .run(&sizing, ChunkCoord::new(0, 0, 0), &sphere, true, true, &NoMeasurements)
    .expect("chunk fits the device");
  assert_eq!(memory.live_buffers(), 1);
  assert_eq!(memory.live_bytes(), run.output.buffer().size_bytes());
  assert!(memory.peak_bytes() > memory.live_bytes());

  drop(run);
  assert_eq!(memory.live_bytes(), 0);
}

#[test]
fn test_output_overflow_fails_chunk() {
  let sizing = sizing();
  let sphere = SphereDensity::at_origin(0.7);
  let pipeline = GpuPipeline::software(1 << 24).with_output_capacity(2);

  let err = pipeline
    .run(&sizing, ChunkCoord::new(1, 1, 1), &sphere, true, true, &NoMeasurements)
    .unwrap_err();
  match err {
    ChunkError::CapacityOverflow { requested, capacity } => {
      assert_eq!(capacity, 2);
      assert!(requested > 2);
    }
    other => panic!("expected CapacityOverflow, got {other:?}"),
  }
  assert_eq!(pipeline.device().memory().live_bytes(), 0, "failed run releases every buffer");
}

#[test]
fn test_allocation_limit_fails_chunk() {
  let sizing = sizing();
  let sphere = SphereDensity::at_origin(0.7);
  let pipeline = GpuPipeline::software(1024);

  let err = pipeline
    .run(&sizing, ChunkCoord::new(0, 0, 0), &sphere, true, true, &NoMeasurements)
    .unwrap_err();
  assert!(matches!(err, ChunkError::BufferTooLarge { .. }));
}

#[test]
fn test_density_failures_counted() {
  let sizing = sizing();
  let broken = TryFnDensity(|p: Vec3| Err::<f32, _>(DensityError::new(p, "offline")));
  let pipeline = GpuPipeline::software(1 << 24);
  let coord = ChunkCoord::new(0, 1, 0);

  let run = pipeline
    .run(&sizing, coord, &broken, true, true, &NoMeasurements)
    .expect("failures are absorbed");
  assert_eq!(
    run.density_failures as usize,
    sizing.chunk_dimensions(coord).voxel_count()
  );
  assert_eq!(run.output.triangle_count(), 0, "sentinel voxels are all outside");
}

#[test]
fn test_device_output_accessors() {
  let sizing = sizing();
  let sphere = SphereDensity::at_origin(0.7);
  let pipeline = GpuPipeline::software(1 << 24);
  let coord = ChunkCoord::new(1, 0, 1);

  let run = pipeline
    .run(&sizing, coord, &sphere, true, false, &NoMeasurements)
    .expect("chunk fits the device");
  let output = &run.output;
  assert_eq!(output.vertex_count(), output.triangle_count() * 3);
  assert_eq!(output.indices().len(), output.vertex_count() as usize);
  assert_eq!(output.bounds(), sizing.chunk_bounds(coord));

  let mesh = output.read_back(&**pipeline.device());
  for (i, normals) in mesh.normals.chunks_exact(3).enumerate() {
    assert_eq!(normals[0], normals[1], "flat normals in triangle {i}");
    assert_eq!(normals[1], normals[2], "flat normals in triangle {i}");
  }
}
