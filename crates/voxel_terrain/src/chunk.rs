//! Chunk lifecycle.
//!
//! ```text
//!   Pending ──generate──► Mesh | DeviceResident | Failed
//! ```
//!
//! A chunk is populated by exactly one generation pass. Regeneration builds a
//! fresh `Pending` chunk and replaces the old one wholesale.

use glam::Vec3;

use crate::error::ChunkError;
use crate::gpu::DeviceOutput;
use crate::sizing::{ChunkDimensions, TerrainSizing};
use crate::types::{ChunkCoord, ChunkMesh};

/// Counters gathered while generating one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
  /// Triangles in the final geometry.
  pub triangles: u32,
  pub density_failures: u32,
  /// Zero-area triangles dropped during triangulation.
  pub degenerate_triangles: u32,
}

/// Renderable result of one generation pass.
#[derive(Debug)]
pub enum ChunkOutput {
  /// Host-side arrays (CPU strategies and the hybrid readback).
  Mesh(ChunkMesh),
  /// Geometry left in a device buffer for the renderer to bind.
  DeviceResident(DeviceOutput),
}

/// Output plus counters, as produced by a strategy.
#[derive(Debug)]
pub struct ChunkGeometry {
  pub output: ChunkOutput,
  pub stats: ChunkStats,
}

#[derive(Debug, Default)]
pub enum ChunkState {
  #[default]
  Pending,
  Mesh(ChunkMesh),
  DeviceResident(DeviceOutput),
  /// Generation failed; the chunk has no renderable geometry.
  Failed(ChunkError),
}

#[derive(Debug)]
pub struct Chunk {
  pub coord: ChunkCoord,
  pub center: Vec3,
  pub dims: ChunkDimensions,
  state: ChunkState,
  stats: ChunkStats,
}

impl Chunk {
  pub fn new(sizing: &TerrainSizing, coord: ChunkCoord) -> Self {
    Self {
      coord,
      center: sizing.chunk_center(coord),
      dims: sizing.chunk_dimensions(coord),
      state: ChunkState::Pending,
      stats: ChunkStats::default(),
    }
  }

  pub fn state(&self) -> &ChunkState {
    &self.state
  }

  pub fn stats(&self) -> ChunkStats {
    self.stats
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, ChunkState::Pending)
  }

  pub fn mesh(&self) -> Option<&ChunkMesh> {
    match &self.state {
      ChunkState::Mesh(mesh) => Some(mesh),
      _ => None,
    }
  }

  pub fn device_output(&self) -> Option<&DeviceOutput> {
    match &self.state {
      ChunkState::DeviceResident(output) => Some(output),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ChunkError> {
    match &self.state {
      ChunkState::Failed(err) => Some(err),
      _ => None,
    }
  }

  /// Store the result of the chunk's generation pass.
  pub(crate) fn complete(&mut self, result: Result<ChunkGeometry, ChunkError>) {
    debug_assert!(self.is_pending(), "chunk {} generated twice", self.coord);
    match result {
      Ok(geometry) => {
        self.stats = geometry.stats;
        self.state = match geometry.output {
          ChunkOutput::Mesh(mesh) => ChunkState::Mesh(mesh),
          ChunkOutput::DeviceResident(output) => ChunkState::DeviceResident(output),
        };
      }
      Err(err) => {
        tracing::warn!(chunk = %self.coord, %err, "chunk generation failed");
        self.state = ChunkState::Failed(err);
      }
    }
  }
}

#[cfg(test)]
#[path = "chunk_test.rs"]
mod chunk_test;
