//! Terrain configuration.
//!
//! `TerrainConfig` is constructed once (defaults, builder setters or a TOML
//! file), validated once, and then shared read-only by every stage. All chunk
//! sizes are derived from it by [`TerrainSizing`](crate::sizing::TerrainSizing);
//! none of them can be set independently.
//!
//! ```toml
//! terrain_size = [20.0, 10.0, 20.0]
//! cubes_per_unit = 20
//! buffer_capacity = 21474836
//! strategy = "cpu_threaded"
//!
//! [noise]
//! seed = 3452
//! layers = 9
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Default GPU buffer capacity in bytes (1% of a 2 GiB device buffer).
pub const DEFAULT_BUFFER_CAPACITY: u64 = 2_147_483_648 / 100;

/// How chunks are generated. Selected once per build, applied to every chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
  /// Each chunk generated to completion on the calling thread.
  CpuSync,

  /// Sampling, triangulation and smoothing on a worker pool; mesh assembly
  /// on the calling thread as chunks complete.
  CpuThreaded,

  /// Compute device produces the geometry, the host reads it back and builds
  /// the mesh arrays.
  CpuGpuHybrid,

  /// Compute device produces the geometry and keeps it in a device buffer
  /// for the renderer to bind. No readback besides the triangle count.
  #[default]
  GpuResident,
}

impl GenerationStrategy {
  /// True when chunk work is fanned out to background workers.
  pub fn is_threaded(self) -> bool {
    matches!(self, GenerationStrategy::CpuThreaded)
  }

  /// True when the compute device pipeline runs the stages.
  pub fn uses_device(self) -> bool {
    matches!(
      self,
      GenerationStrategy::CpuGpuHybrid | GenerationStrategy::GpuResident
    )
  }
}

/// Parameters of the layered noise terrain density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
  pub seed: u32,
  /// Base frequency applied to normalised terrain coordinates.
  pub frequency: f64,
  /// Amplitude of the noise relative to the terrain height.
  pub strength: f64,
  /// Number of noise layers (octaves).
  pub layers: usize,
  /// Frequency multiplier between consecutive layers.
  pub layer_frequency_multiplier: f64,
}

impl Default for NoiseConfig {
  fn default() -> Self {
    Self {
      seed: 3452,
      frequency: 2.5,
      strength: 0.3,
      layers: 9,
      layer_frequency_multiplier: 1.8,
    }
  }
}

/// Process-wide terrain parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
  /// Terrain extent in world units per axis.
  pub terrain_size: [f32; 3],
  /// Voxel resolution: cubes per world unit.
  pub cubes_per_unit: u32,
  /// Byte capacity of one device buffer. Bounds the cubes per chunk.
  pub buffer_capacity: u64,
  /// Smooth vertex normals across neighbouring cubes (flat shading otherwise).
  pub smooth_normals: bool,
  /// Interpolate edge crossings (edge midpoints otherwise).
  pub interpolate_vertices: bool,
  pub strategy: GenerationStrategy,
  /// Worker threads for `CpuThreaded`. 0 means one per core.
  pub worker_threads: usize,
  /// Bracket every pipeline stage with timing measurements.
  pub measure_time: bool,
  /// Log the derived chunk layout before building.
  pub log_terrain_parameters: bool,
  pub noise: NoiseConfig,
}

impl Default for TerrainConfig {
  fn default() -> Self {
    Self {
      terrain_size: [20.0, 10.0, 20.0],
      cubes_per_unit: 20,
      buffer_capacity: DEFAULT_BUFFER_CAPACITY,
      smooth_normals: true,
      interpolate_vertices: true,
      strategy: GenerationStrategy::default(),
      worker_threads: 0,
      measure_time: true,
      log_terrain_parameters: false,
      noise: NoiseConfig::default(),
    }
  }
}

impl TerrainConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_terrain_size(mut self, size: [f32; 3]) -> Self {
    self.terrain_size = size;
    self
  }

  pub fn with_cubes_per_unit(mut self, cubes_per_unit: u32) -> Self {
    self.cubes_per_unit = cubes_per_unit;
    self
  }

  pub fn with_buffer_capacity(mut self, bytes: u64) -> Self {
    self.buffer_capacity = bytes;
    self
  }

  pub fn with_smooth_normals(mut self, smooth: bool) -> Self {
    self.smooth_normals = smooth;
    self
  }

  pub fn with_interpolation(mut self, interpolate: bool) -> Self {
    self.interpolate_vertices = interpolate;
    self
  }

  pub fn with_strategy(mut self, strategy: GenerationStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  pub fn with_worker_threads(mut self, threads: usize) -> Self {
    self.worker_threads = threads;
    self
  }

  pub fn with_measure_time(mut self, measure: bool) -> Self {
    self.measure_time = measure;
    self
  }

  pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
    self.noise = noise;
    self
  }

  /// Largest extent over the three axes.
  pub fn max_terrain_size(&self) -> f32 {
    self.terrain_size.iter().copied().fold(0.0, f32::max)
  }

  /// Load and validate a configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self, TerrainError> {
    let content = std::fs::read_to_string(path).map_err(|source| TerrainError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&content)
  }

  /// Parse and validate a configuration from TOML text.
  pub fn from_toml_str(content: &str) -> Result<Self, TerrainError> {
    let config: TerrainConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Reject configurations no chunk layout can be derived from.
  ///
  /// Buffer-capacity checks that depend on the derived chunk side live in
  /// [`TerrainSizing::derive`](crate::sizing::TerrainSizing::derive).
  pub fn validate(&self) -> Result<(), TerrainError> {
    for (axis, &extent) in ["x", "y", "z"].iter().zip(self.terrain_size.iter()) {
      if !extent.is_finite() || extent <= 0.0 {
        return Err(TerrainError::config(format!(
          "terrain_size.{axis} must be positive and finite, got {extent}"
        )));
      }
    }
    if self.cubes_per_unit == 0 {
      return Err(TerrainError::config("cubes_per_unit must be positive"));
    }
    if self.buffer_capacity == 0 {
      return Err(TerrainError::config("buffer_capacity must be non-zero"));
    }

    let noise = &self.noise;
    if noise.layers == 0 {
      return Err(TerrainError::config("noise.layers must be at least 1"));
    }
    if !noise.frequency.is_finite() || noise.frequency <= 0.0 {
      return Err(TerrainError::config(format!(
        "noise.frequency must be positive, got {}",
        noise.frequency
      )));
    }
    if !noise.layer_frequency_multiplier.is_finite() || noise.layer_frequency_multiplier <= 0.0 {
      return Err(TerrainError::config(format!(
        "noise.layer_frequency_multiplier must be positive, got {}",
        noise.layer_frequency_multiplier
      )));
    }
    if !noise.strength.is_finite() {
      return Err(TerrainError::config("noise.strength must be finite"));
    }

    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
