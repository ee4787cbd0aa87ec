//! Simple analytic density fields for testing and debugging.
//!
//! Exact signed distances with a known surface, so triangulation output can
//! be checked against closed-form expectations.

use glam::Vec3;

use super::DensityField;

/// Sphere SDF: `|p - center| - radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereDensity {
  pub center: Vec3,
  pub radius: f32,
}

impl SphereDensity {
  pub fn new(center: Vec3, radius: f32) -> Self {
    Self { center, radius }
  }

  pub fn at_origin(radius: f32) -> Self {
    Self::new(Vec3::ZERO, radius)
  }
}

impl DensityField for SphereDensity {
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    (position - self.center).length() - self.radius
  }
}

/// Plane SDF: `dot(p, normal) - offset`, negative on the side opposite the
/// normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneDensity {
  /// Unit normal pointing out of the solid.
  pub normal: Vec3,
  pub offset: f32,
}

impl PlaneDensity {
  /// Horizontal ground at `height`: solid below, air above.
  pub fn ground(height: f32) -> Self {
    Self {
      normal: Vec3::Y,
      offset: height,
    }
  }

  /// Plane through the origin tilted around the Z axis.
  ///
  /// SDF: `y * cos(angle) - x * sin(angle)`. Crosses many chunk boundaries at
  /// a predictable angle.
  pub fn tilted(angle_degrees: f32) -> Self {
    let angle = angle_degrees.to_radians();
    Self {
      normal: Vec3::new(-angle.sin(), angle.cos(), 0.0),
      offset: 0.0,
    }
  }

  pub fn with_offset(mut self, offset: f32) -> Self {
    self.offset = offset;
    self
  }
}

impl DensityField for PlaneDensity {
  #[inline]
  fn density(&self, position: Vec3) -> f32 {
    position.dot(self.normal) - self.offset
  }
}

/// Axis-aligned box SDF with edges at `center ± half_extents`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxDensity {
  pub center: Vec3,
  pub half_extents: Vec3,
}

impl BoxDensity {
  pub fn new(center: Vec3, half_extents: Vec3) -> Self {
    Self {
      center,
      half_extents,
    }
  }
}

impl DensityField for BoxDensity {
  fn density(&self, position: Vec3) -> f32 {
    let d = (position - self.center).abs() - self.half_extents;
    let outside = d.max(Vec3::ZERO).length();
    let inside = d.max_element().min(0.0);
    outside + inside
  }
}
