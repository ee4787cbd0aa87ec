//! Compute device seam and the software device.
//!
//! Buffers are scoped acquisitions: a [`DeviceBuffer`] returns its bytes to
//! the device's [`DeviceMemory`] when dropped. Dispatches run one kernel
//! invocation per element; the software device spreads invocations over
//! rayon's pool and returns once all of them finished, like a blocking queue
//! submit.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use rayon::prelude::*;

use crate::error::ChunkError;

/// Live and peak device allocation counters.
#[derive(Debug, Default)]
pub struct DeviceMemory {
  live_bytes: AtomicU64,
  peak_bytes: AtomicU64,
  live_buffers: AtomicU64,
}

impl DeviceMemory {
  fn acquire(&self, bytes: u64) {
    let live = self.live_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes;
    self.peak_bytes.fetch_max(live, Ordering::AcqRel);
    self.live_buffers.fetch_add(1, Ordering::AcqRel);
  }

  fn release(&self, bytes: u64) {
    self.live_bytes.fetch_sub(bytes, Ordering::AcqRel);
    self.live_buffers.fetch_sub(1, Ordering::AcqRel);
  }

  pub fn live_bytes(&self) -> u64 {
    self.live_bytes.load(Ordering::Acquire)
  }

  pub fn peak_bytes(&self) -> u64 {
    self.peak_bytes.load(Ordering::Acquire)
  }

  pub fn live_buffers(&self) -> u64 {
    self.live_buffers.load(Ordering::Acquire)
  }
}

/// Typed device allocation, released on drop.
pub struct DeviceBuffer<T: Pod> {
  label: &'static str,
  data: Vec<T>,
  memory: Arc<DeviceMemory>,
}

impl<T: Pod> DeviceBuffer<T> {
  /// Wrap host storage as a device allocation accounted in `memory`.
  pub fn from_host(label: &'static str, data: Vec<T>, memory: &Arc<DeviceMemory>) -> Self {
    memory.acquire(std::mem::size_of_val(data.as_slice()) as u64);
    Self {
      label,
      data,
      memory: Arc::clone(memory),
    }
  }

  pub fn label(&self) -> &'static str {
    self.label
  }

  /// Capacity in elements.
  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn size_bytes(&self) -> u64 {
    std::mem::size_of_val(self.data.as_slice()) as u64
  }

  /// Device-side view, as bound to a kernel.
  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.data
  }

  /// Raw bytes, in the layout a renderer binds.
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.data)
  }
}

impl<T: Pod> Drop for DeviceBuffer<T> {
  fn drop(&mut self) {
    self.memory.release(self.size_bytes());
  }
}

impl<T: Pod> fmt::Debug for DeviceBuffer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeviceBuffer")
      .field("label", &self.label)
      .field("len", &self.data.len())
      .finish()
  }
}

/// Buffer with an atomic append counter.
///
/// Every append bumps the counter; only appends below the capacity are
/// written. A counter above the capacity reports overflow without touching
/// memory outside the buffer.
pub struct AppendBuffer<T: Pod> {
  buffer: DeviceBuffer<T>,
  counter: AtomicU32,
}

impl<T: Pod> AppendBuffer<T> {
  pub fn capacity(&self) -> usize {
    self.buffer.len()
  }

  #[inline]
  pub fn append(&mut self, item: T) {
    let slot = self.counter.fetch_add(1, Ordering::AcqRel) as usize;
    if let Some(target) = self.buffer.data.get_mut(slot) {
      *target = item;
    }
  }

  pub fn reset_counter(&self) {
    self.counter.store(0, Ordering::Release);
  }

  pub fn buffer(&self) -> &DeviceBuffer<T> {
    &self.buffer
  }

  /// Give up the counter, keeping the storage.
  pub fn into_buffer(self) -> DeviceBuffer<T> {
    self.buffer
  }
}

impl<T: Pod> fmt::Debug for AppendBuffer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppendBuffer")
      .field("buffer", &self.buffer)
      .field("counter", &self.counter.load(Ordering::Relaxed))
      .finish()
  }
}

/// Execution target of the device pipeline.
pub trait ComputeDevice: Send + Sync {
  /// Largest single allocation the device accepts, in bytes.
  fn max_buffer_bytes(&self) -> u64;

  fn memory(&self) -> &Arc<DeviceMemory>;

  /// Allocate a zero-initialised buffer of `len` elements.
  fn create_buffer<T: Pod + Send + Sync>(&self, label: &'static str, len: usize) -> Result<DeviceBuffer<T>, ChunkError>;

  fn create_append_buffer<T: Pod + Send + Sync>(
    &self,
    label: &'static str,
    capacity: usize,
  ) -> Result<AppendBuffer<T>, ChunkError> {
    Ok(AppendBuffer {
      buffer: self.create_buffer(label, capacity)?,
      counter: AtomicU32::new(0),
    })
  }

  /// Run `invocations` kernel invocations; invocation `i` writes the `stride`
  /// elements starting at `i * stride`.
  fn dispatch<T, F>(&self, output: &mut DeviceBuffer<T>, invocations: usize, stride: usize, kernel: F)
  where
    T: Pod + Send + Sync,
    F: Fn(usize, &mut [T]) + Send + Sync;

  /// Run `invocations` invocations that each append at most one element.
  fn dispatch_append<T, F>(&self, output: &mut AppendBuffer<T>, invocations: usize, kernel: F)
  where
    T: Pod + Send + Sync,
    F: Fn(usize) -> Option<T> + Send + Sync;

  /// Blocking read of an append counter.
  fn read_counter<T: Pod>(&self, buffer: &AppendBuffer<T>) -> u32 {
    buffer.counter.load(Ordering::Acquire)
  }

  /// Blocking copy of the first `len` elements to host memory.
  fn read_back<T: Pod>(&self, buffer: &DeviceBuffer<T>, len: usize) -> Vec<T> {
    buffer.data[..len.min(buffer.data.len())].to_vec()
  }
}

/// Host-memory device running kernels on rayon's thread pool.
#[derive(Debug)]
pub struct SoftwareDevice {
  max_buffer_bytes: u64,
  memory: Arc<DeviceMemory>,
}

impl SoftwareDevice {
  pub fn new(max_buffer_bytes: u64) -> Self {
    Self {
      max_buffer_bytes,
      memory: Arc::new(DeviceMemory::default()),
    }
  }
}

impl ComputeDevice for SoftwareDevice {
  fn max_buffer_bytes(&self) -> u64 {
    self.max_buffer_bytes
  }

  fn memory(&self) -> &Arc<DeviceMemory> {
    &self.memory
  }

  fn create_buffer<T: Pod + Send + Sync>(&self, label: &'static str, len: usize) -> Result<DeviceBuffer<T>, ChunkError> {
    let bytes = (len as u64).saturating_mul(std::mem::size_of::<T>() as u64);
    if bytes > self.max_buffer_bytes {
      return Err(ChunkError::BufferTooLarge {
        label,
        bytes,
        limit: self.max_buffer_bytes,
      });
    }
    Ok(DeviceBuffer::from_host(label, vec![T::zeroed(); len], &self.memory))
  }

  fn dispatch<T, F>(&self, output: &mut DeviceBuffer<T>, invocations: usize, stride: usize, kernel: F)
  where
    T: Pod + Send + Sync,
    F: Fn(usize, &mut [T]) + Send + Sync,
  {
    let stride = stride.max(1);
    let used = (invocations * stride).min(output.len());
    output.as_mut_slice()[..used]
      .par_chunks_mut(stride)
      .enumerate()
      .for_each(|(invocation, slots)| kernel(invocation, slots));
  }

  fn dispatch_append<T, F>(&self, output: &mut AppendBuffer<T>, invocations: usize, kernel: F)
  where
    T: Pod + Send + Sync,
    F: Fn(usize) -> Option<T> + Send + Sync,
  {
    let results: Vec<Option<T>> = (0..invocations).into_par_iter().map(kernel).collect();
    for item in results.into_iter().flatten() {
      output.append(item);
    }
  }
}

#[cfg(test)]
#[path = "device_test.rs"]
mod device_test;
