//! Layered noise terrain, the default density source.

use glam::Vec3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::DensityField;
use crate::config::{NoiseConfig, TerrainConfig};

/// Height field perturbed by fractal Perlin noise.
///
/// Positions are normalised by the largest terrain extent, so the same
/// parameters give the same shape at any terrain size or resolution:
///
/// `density = y_n - strength * fbm(p_n)` with `p_n = p / max_extent`.
///
/// Below the noisy surface the density is negative (solid).
#[derive(Clone)]
pub struct LayeredNoiseTerrain {
  fbm: Fbm<Perlin>,
  strength: f64,
  inv_extent: f64,
}

impl LayeredNoiseTerrain {
  pub fn new(noise: &NoiseConfig, max_extent: f32) -> Self {
    let fbm = Fbm::<Perlin>::new(noise.seed)
      .set_octaves(noise.layers)
      .set_frequency(noise.frequency)
      .set_lacunarity(noise.layer_frequency_multiplier)
      .set_persistence(0.5);
    Self {
      fbm,
      strength: noise.strength,
      inv_extent: 1.0 / max_extent.max(f32::EPSILON) as f64,
    }
  }

  pub fn from_config(config: &TerrainConfig) -> Self {
    Self::new(&config.noise, config.max_terrain_size())
  }
}

impl DensityField for LayeredNoiseTerrain {
  fn density(&self, position: Vec3) -> f32 {
    let p = position.as_dvec3() * self.inv_extent;
    let n = self.fbm.get([p.x, p.y, p.z]);
    (p.y - self.strength * n) as f32
  }
}
