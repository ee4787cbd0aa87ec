//! Scalar density sources.
//!
//! Every stage treats the density as a black box `density(position) -> f32`
//! that must be deterministic: the CPU and device pipelines sample the same
//! field and have to agree on the result.
//!
//! Negative density is inside the surface, positive is outside.

mod samplers;
mod terrain;

use glam::Vec3;

pub use samplers::{BoxDensity, PlaneDensity, SphereDensity};
pub use terrain::LayeredNoiseTerrain;

use crate::error::DensityError;

/// Density assigned to a voxel whose density could not be evaluated.
/// Positive, i.e. outside the surface.
pub const OUTSIDE_SENTINEL: f32 = 1.0;

/// A deterministic, side-effect free scalar field.
pub trait DensityField: Send + Sync {
  fn density(&self, position: Vec3) -> f32;

  /// Fallible evaluation. Sources backed by external code override this;
  /// the sampler replaces failures with [`OUTSIDE_SENTINEL`].
  fn try_density(&self, position: Vec3) -> Result<f32, DensityError> {
    Ok(self.density(position))
  }
}

impl<T: DensityField + ?Sized> DensityField for std::sync::Arc<T> {
  fn density(&self, position: Vec3) -> f32 {
    (**self).density(position)
  }

  fn try_density(&self, position: Vec3) -> Result<f32, DensityError> {
    (**self).try_density(position)
  }
}

impl<T: DensityField + ?Sized> DensityField for &T {
  fn density(&self, position: Vec3) -> f32 {
    (**self).density(position)
  }

  fn try_density(&self, position: Vec3) -> Result<f32, DensityError> {
    (**self).try_density(position)
  }
}

/// Adapts a closure into a [`DensityField`].
#[derive(Clone)]
pub struct FnDensity<F>(pub F);

impl<F> DensityField for FnDensity<F>
where
  F: Fn(Vec3) -> f32 + Send + Sync,
{
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    (self.0)(position)
  }
}

/// Adapts a fallible closure into a [`DensityField`].
#[derive(Clone)]
pub struct TryFnDensity<F>(pub F);

impl<F> DensityField for TryFnDensity<F>
where
  F: Fn(Vec3) -> Result<f32, DensityError> + Send + Sync,
{
  fn density(&self, position: Vec3) -> f32 {
    (self.0)(position).unwrap_or(OUTSIDE_SENTINEL)
  }

  fn try_density(&self, position: Vec3) -> Result<f32, DensityError> {
    (self.0)(position)
  }
}

#[cfg(test)]
#[path = "density_test.rs"]
mod density_test;
