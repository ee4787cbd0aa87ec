use std::sync::Arc;

use super::*;
use crate::config::{NoiseConfig, TerrainConfig};

#[test]
fn test_sphere_signs() {
  let sphere = SphereDensity::at_origin(0.4);
  assert!((sphere.density(Vec3::ZERO) + 0.4).abs() < 1e-6);
  assert!(sphere.density(Vec3::new(0.5, 0.0, 0.0)) > 0.0);
  assert!(sphere.density(Vec3::new(0.4, 0.0, 0.0)).abs() < 1e-6);
}

#[test]
fn test_ground_plane() {
  let ground = PlaneDensity::ground(0.25);
  assert!(ground.density(Vec3::new(3.0, 0.0, -2.0)) < 0.0, "below is solid");
  assert!(ground.density(Vec3::new(3.0, 1.0, -2.0)) > 0.0, "above is air");
  assert_eq!(ground.density(Vec3::new(9.0, 0.25, 4.0)), 0.0);
}

#[test]
fn test_tilted_plane_zero_degrees_is_ground() {
  let tilted = PlaneDensity::tilted(0.0);
  let ground = PlaneDensity::ground(0.0);
  for p in [Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, -0.5, 0.0)] {
    assert!((tilted.density(p) - ground.density(p)).abs() < 1e-6);
  }
}

#[test]
fn test_tilted_plane_contains_diagonal() {
  let tilted = PlaneDensity::tilted(45.0);
  assert!(tilted.density(Vec3::new(1.0, 1.0, 5.0)).abs() < 1e-6);
}

#[test]
fn test_box_density() {
  let cube = BoxDensity::new(Vec3::ZERO, Vec3::splat(0.5));
  assert!((cube.density(Vec3::ZERO) + 0.5).abs() < 1e-6);
  assert!((cube.density(Vec3::new(1.0, 0.0, 0.0)) - 0.5).abs() < 1e-6);
  assert!(cube.density(Vec3::new(0.5, 0.2, 0.1)).abs() < 1e-6);
}

#[test]
fn test_closure_adapter() {
  let field = FnDensity(|p: Vec3| p.x - 1.0);
  assert_eq!(field.density(Vec3::new(3.0, 0.0, 0.0)), 2.0);
  assert_eq!(field.try_density(Vec3::ZERO), Ok(-1.0));
}

#[test]
fn test_fallible_adapter_uses_sentinel() {
  let field = TryFnDensity(|p: Vec3| {
    if p.x > 0.0 {
      Err(DensityError::new(p, "out of domain"))
    } else {
      Ok(-1.0_f32)
    }
  });
  assert!(field.try_density(Vec3::X).is_err());
  assert_eq!(field.density(Vec3::X), OUTSIDE_SENTINEL);
  assert_eq!(field.density(-Vec3::X), -1.0);
}

#[test]
fn test_shared_field_forwards() {
  let field: Arc<dyn DensityField> = Arc::new(SphereDensity::at_origin(1.0));
  assert_eq!(field.density(Vec3::ZERO), -1.0);
  assert_eq!((&field).density(Vec3::ZERO), -1.0);
}

#[test]
fn test_noise_terrain_is_deterministic() {
  let config = TerrainConfig::default();
  let a = LayeredNoiseTerrain::from_config(&config);
  let b = LayeredNoiseTerrain::from_config(&config);
  for i in 0..32 {
    let p = Vec3::new(i as f32 * 0.37 - 5.0, i as f32 * 0.11 - 2.0, i as f32 * -0.23);
    assert_eq!(a.density(p).to_bits(), b.density(p).to_bits(), "differs at {:?}", p);
  }
}

#[test]
fn test_noise_terrain_is_solid_deep_down_and_air_high_up() {
  let config = TerrainConfig::default();
  let terrain = LayeredNoiseTerrain::from_config(&config);
  // Normalised |y| = 0.5 exceeds the noise amplitude of 0.3 * ~1.0
  let extent = config.max_terrain_size();
  for x in [-8.0, 0.0, 3.5] {
    assert!(terrain.density(Vec3::new(x, -0.5 * extent, 1.0)) < 0.0);
    assert!(terrain.density(Vec3::new(x, 0.5 * extent, 1.0)) > 0.0);
  }
}

#[test]
fn test_noise_terrain_seed_changes_field() {
  let mut other = NoiseConfig::default();
  other.seed += 1;
  let a = LayeredNoiseTerrain::new(&NoiseConfig::default(), 20.0);
  let b = LayeredNoiseTerrain::new(&other, 20.0);
  let differs = (0..64).any(|i| {
    let p = Vec3::new(i as f32 * 0.31, 0.0, i as f32 * 0.17);
    a.density(p) != b.density(p)
  });
  assert!(differs);
}
