//! Error kinds for terrain configuration and per-chunk generation.
//!
//! Only [`TerrainError`] aborts a build. [`ChunkError`] is recorded on the
//! failing chunk and never affects its siblings. [`DensityError`] is absorbed
//! by the voxel sampler (the voxel gets an outside sentinel) and only counted.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ChunkCoord;

/// Errors fatal to a whole terrain build.
#[derive(Debug, Error)]
pub enum TerrainError {
  /// Invalid `TerrainConfig`, surfaced before any generation starts.
  #[error("invalid terrain configuration: {0}")]
  Configuration(String),

  /// Configuration file could not be read.
  #[error("failed to read terrain config {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Configuration file is not valid TOML for `TerrainConfig`.
  #[error("failed to parse terrain config: {0}")]
  Parse(#[from] toml::de::Error),

  /// Chunk coordinate outside the terrain's chunk grid.
  #[error("no chunk at {0}")]
  UnknownChunk(ChunkCoord),
}

impl TerrainError {
  pub(crate) fn config(message: impl Into<String>) -> Self {
    TerrainError::Configuration(message.into())
  }
}

/// Failure of a single chunk. The chunk is left without renderable geometry.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ChunkError {
  /// More triangles than the device output buffer can hold.
  #[error("chunk needs {requested} triangles but the device buffer holds {capacity}")]
  CapacityOverflow { requested: u64, capacity: u64 },

  /// A device allocation larger than the device allows.
  #[error("device buffer `{label}` needs {bytes} bytes, above the {limit}-byte limit")]
  BufferTooLarge {
    label: &'static str,
    bytes: u64,
    limit: u64,
  },

  /// A density field or pipeline stage panicked while generating the chunk.
  #[error("chunk generation panicked: {0}")]
  WorkerPanicked(String),
}

impl ChunkError {
  /// Build a `WorkerPanicked` from a caught panic payload.
  pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "non-string panic payload".to_string()
    };
    ChunkError::WorkerPanicked(message)
  }
}

/// A density source failed to produce a value for one point.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("density evaluation failed at {position:?}: {reason}")]
pub struct DensityError {
  pub position: [f32; 3],
  pub reason: String,
}

impl DensityError {
  pub fn new(position: glam::Vec3, reason: impl Into<String>) -> Self {
    Self {
      position: position.to_array(),
      reason: reason.into(),
    }
  }
}
