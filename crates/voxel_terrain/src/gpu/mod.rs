//! Device pipeline: the CPU stages as four sequential compute dispatches.
//!
//! ```text
//!   dispatch          reads                  writes
//!   ───────────────   ────────────────────   ─────────────────────────────
//!   generate_voxel    density field          voxels
//!   march_cubes       voxels (released)      provisional, 5 slots per cube
//!   smooth_normals    provisional (released) smoothed
//!   create_output     smoothed (released)    output + append counter
//! ```
//!
//! Buffers are sized for the largest chunk and dispatched with the actual
//! chunk's counts. Intermediate buffers are released as soon as the next
//! stage has consumed them; only the output buffer leaves [`GpuPipeline::run`].

mod device;
pub mod kernels;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub use device::{AppendBuffer, ComputeDevice, DeviceBuffer, DeviceMemory, SoftwareDevice};

use crate::density::DensityField;
use crate::edge_table::MAX_TRIANGLES_PER_CUBE;
use crate::error::ChunkError;
use crate::sizing::TerrainSizing;
use crate::timing::{measure, Measurements, StageKind};
use crate::types::{trivial_indices, ChunkCoord, ChunkMesh, MinMaxAABB, ProvisionalTriangle, Triangle, Voxel};
use kernels::{KernelParams, SlotSource};

/// Device-resident geometry of one chunk: what a renderer binds.
#[derive(Debug)]
pub struct DeviceOutput {
  buffer: DeviceBuffer<Triangle>,
  triangle_count: u32,
  bounds: MinMaxAABB,
}

impl DeviceOutput {
  pub fn buffer(&self) -> &DeviceBuffer<Triangle> {
    &self.buffer
  }

  /// Live triangles at the start of the buffer.
  pub fn triangle_count(&self) -> u32 {
    self.triangle_count
  }

  pub fn vertex_count(&self) -> u32 {
    self.triangle_count * 3
  }

  /// Nominal chunk bounds (the buffer is never read back to compute exact ones).
  pub fn bounds(&self) -> MinMaxAABB {
    self.bounds
  }

  /// Index list for drawing the buffer as unshared triangles.
  pub fn indices(&self) -> Vec<u32> {
    trivial_indices(self.triangle_count as usize)
  }

  /// Blocking readback into host arrays.
  pub fn read_back<D: ComputeDevice>(&self, device: &D) -> ChunkMesh {
    let triangles = device.read_back(&self.buffer, self.triangle_count as usize);
    let mut mesh = ChunkMesh::with_capacity(triangles.len());
    for triangle in &triangles {
      mesh.push_triangle(triangle);
    }
    mesh
  }
}

/// Result of one pipeline invocation.
#[derive(Debug)]
pub struct GpuRun {
  pub output: DeviceOutput,
  pub density_failures: u32,
  pub degenerate_triangles: u32,
}

/// Four-dispatch chunk pipeline on a compute device.
#[derive(Debug)]
pub struct GpuPipeline<D: ComputeDevice = SoftwareDevice> {
  device: Arc<D>,
  /// Output capacity override in triangles (defaults to the sizing's slots).
  output_capacity: Option<usize>,
}

impl GpuPipeline<SoftwareDevice> {
  /// Software device whose allocation limit is the configured buffer capacity.
  pub fn software(buffer_capacity: u64) -> Self {
    Self::new(Arc::new(SoftwareDevice::new(buffer_capacity)))
  }
}

impl<D: ComputeDevice> GpuPipeline<D> {
  pub fn new(device: Arc<D>) -> Self {
    Self {
      device,
      output_capacity: None,
    }
  }

  /// Limit the output buffer to `triangles` slots.
  pub fn with_output_capacity(mut self, triangles: usize) -> Self {
    self.output_capacity = Some(triangles);
    self
  }

  pub fn device(&self) -> &Arc<D> {
    &self.device
  }

  /// Generate chunk `coord` on the device.
  pub fn run<F: DensityField + ?Sized>(
    &self,
    sizing: &TerrainSizing,
    coord: ChunkCoord,
    field: &F,
    interpolate: bool,
    smooth: bool,
    timer: &dyn Measurements,
  ) -> Result<GpuRun, ChunkError> {
    let device = &*self.device;
    let params = KernelParams {
      sizing,
      coord,
      dims: sizing.chunk_dimensions(coord),
      interpolate,
      smooth,
    };
    let max_dims = sizing.max_chunk_dimensions();
    let slot_count = max_dims.cube_count() * MAX_TRIANGLES_PER_CUBE;
    let cubes = params.dims.cube_count();
    let slots = cubes * MAX_TRIANGLES_PER_CUBE;

    let density_failures = AtomicU32::new(0);
    let degenerate = AtomicU32::new(0);

    let mut voxels = device.create_buffer::<Voxel>("voxels", max_dims.voxel_count())?;
    {
      let _stage = measure(timer, StageKind::VoxelGeneration, coord);
      device.dispatch(&mut voxels, params.dims.voxel_count(), 1, |index, out| {
        if kernels::generate_voxel(&params, field, index, &mut out[0]) {
          density_failures.fetch_add(1, Ordering::Relaxed);
        }
      });
    }

    let mut provisional = device.create_buffer::<ProvisionalTriangle>("provisional_triangles", slot_count)?;
    {
      let _stage = measure(timer, StageKind::Triangulation, coord);
      let voxel_data = voxels.as_slice();
      device.dispatch(&mut provisional, cubes, MAX_TRIANGLES_PER_CUBE, |cube, out| {
        let dropped = kernels::march_cubes(&params, voxel_data, cube, out);
        if dropped > 0 {
          degenerate.fetch_add(dropped, Ordering::Relaxed);
        }
      });
    }
    drop(voxels);

    let mut smoothed = device.create_buffer::<Triangle>("smoothed_triangles", slot_count)?;
    {
      let _stage = measure(timer, StageKind::Smoothing, coord);
      let source = SlotSource {
        dims: params.dims,
        slots: provisional.as_slice(),
      };
      device.dispatch(&mut smoothed, slots, 1, |index, out| {
        out[0] = kernels::smooth_normals(&params, &source, index);
      });
    }
    drop(provisional);

    let capacity = self.output_capacity.unwrap_or(slot_count);
    let mut output = device.create_append_buffer::<Triangle>("output_triangles", capacity)?;
    let triangle_count = {
      let _stage = measure(timer, StageKind::MeshBuilding, coord);
      let triangles = smoothed.as_slice();
      device.dispatch_append(&mut output, slots, |index| kernels::create_output(&params, triangles, index));
      device.read_counter(&output)
    };
    drop(smoothed);

    if triangle_count as usize > output.capacity() {
      return Err(ChunkError::CapacityOverflow {
        requested: triangle_count as u64,
        capacity: output.capacity() as u64,
      });
    }

    Ok(GpuRun {
      output: DeviceOutput {
        buffer: output.into_buffer(),
        triangle_count,
        bounds: sizing.chunk_bounds(coord),
      },
      density_failures: density_failures.into_inner(),
      degenerate_triangles: degenerate.into_inner(),
    })
  }
}

#[cfg(test)]
#[path = "gpu_test.rs"]
mod gpu_test;
