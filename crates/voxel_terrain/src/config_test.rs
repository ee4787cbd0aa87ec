use super::*;

#[test]
fn test_defaults() {
  let config = TerrainConfig::default();
  assert_eq!(config.terrain_size, [20.0, 10.0, 20.0]);
  assert_eq!(config.cubes_per_unit, 20);
  assert_eq!(config.buffer_capacity, 21_474_836);
  assert_eq!(config.strategy, GenerationStrategy::GpuResident);
  assert_eq!(config.noise.seed, 3452);
  assert_eq!(config.noise.layers, 9);
  assert!(config.validate().is_ok());
}

#[test]
fn test_builder_setters() {
  let config = TerrainConfig::new()
    .with_terrain_size([1.0, 2.0, 3.0])
    .with_cubes_per_unit(4)
    .with_smooth_normals(false)
    .with_interpolation(false)
    .with_strategy(GenerationStrategy::CpuThreaded)
    .with_worker_threads(3);

  assert_eq!(config.terrain_size, [1.0, 2.0, 3.0]);
  assert_eq!(config.cubes_per_unit, 4);
  assert!(!config.smooth_normals);
  assert!(!config.interpolate_vertices);
  assert!(config.strategy.is_threaded());
  assert_eq!(config.worker_threads, 3);
  assert_eq!(config.max_terrain_size(), 3.0);
}

#[test]
fn test_strategy_flags() {
  assert!(!GenerationStrategy::CpuSync.uses_device());
  assert!(!GenerationStrategy::CpuThreaded.uses_device());
  assert!(GenerationStrategy::CpuGpuHybrid.uses_device());
  assert!(GenerationStrategy::GpuResident.uses_device());
}

#[test]
fn test_rejects_non_positive_extent() {
  for size in [[0.0, 1.0, 1.0], [1.0, -2.0, 1.0], [1.0, 1.0, f32::NAN]] {
    let config = TerrainConfig::default().with_terrain_size(size);
    assert!(
      matches!(config.validate(), Err(TerrainError::Configuration(_))),
      "extent {:?} should be rejected",
      size
    );
  }
}

#[test]
fn test_rejects_zero_resolution_and_capacity() {
  let config = TerrainConfig::default().with_cubes_per_unit(0);
  assert!(matches!(config.validate(), Err(TerrainError::Configuration(_))));

  let config = TerrainConfig::default().with_buffer_capacity(0);
  assert!(matches!(config.validate(), Err(TerrainError::Configuration(_))));
}

#[test]
fn test_rejects_bad_noise() {
  let mut noise = NoiseConfig::default();
  noise.layers = 0;
  let config = TerrainConfig::default().with_noise(noise);
  assert!(config.validate().is_err());

  let mut noise = NoiseConfig::default();
  noise.frequency = 0.0;
  let config = TerrainConfig::default().with_noise(noise);
  assert!(config.validate().is_err());
}

#[test]
fn test_from_toml_partial() {
  let config = TerrainConfig::from_toml_str(
    r#"
terrain_size = [4.0, 2.0, 4.0]
cubes_per_unit = 8
strategy = "cpu_gpu_hybrid"

[noise]
seed = 7
"#,
  )
  .expect("valid config");

  assert_eq!(config.terrain_size, [4.0, 2.0, 4.0]);
  assert_eq!(config.cubes_per_unit, 8);
  assert_eq!(config.strategy, GenerationStrategy::CpuGpuHybrid);
  assert_eq!(config.noise.seed, 7);
  // Unspecified fields keep their defaults
  assert_eq!(config.noise.layers, 9);
  assert!(config.smooth_normals);
}

#[test]
fn test_from_toml_rejects_invalid_values() {
  let result = TerrainConfig::from_toml_str("cubes_per_unit = 0");
  assert!(matches!(result, Err(TerrainError::Configuration(_))));
}

#[test]
fn test_from_toml_rejects_unknown_strategy() {
  let result = TerrainConfig::from_toml_str(r#"strategy = "gpu_magic""#);
  assert!(matches!(result, Err(TerrainError::Parse(_))));
}

#[test]
fn test_load_missing_file() {
  let result = TerrainConfig::load(Path::new("/nonexistent/terrain.toml"));
  assert!(matches!(result, Err(TerrainError::Io { .. })));
}

#[test]
fn test_toml_roundtrip_of_defaults() {
  let text = toml::to_string(&TerrainConfig::default()).expect("serializable");
  let parsed = TerrainConfig::from_toml_str(&text).expect("parsable");
  assert_eq!(parsed, TerrainConfig::default());
}
