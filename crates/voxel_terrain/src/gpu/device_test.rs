use super::*;

#[test]
fn test_buffer_released_on_drop() {
  let device = SoftwareDevice::new(1 << 20);
  {
    let a = device.create_buffer::<u32>("a", 64).expect("fits");
    let _b = device.create_buffer::<f32>("b", 16).expect("fits");
    assert_eq!(a.size_bytes(), 256);
    assert_eq!(device.memory().live_bytes(), 256 + 64);
    assert_eq!(device.memory().live_buffers(), 2);
  }
  assert_eq!(device.memory().live_bytes(), 0);
  assert_eq!(device.memory().live_buffers(), 0);
  assert_eq!(device.memory().peak_bytes(), 320);
}

#[test]
fn test_buffer_too_large() {
  let device = SoftwareDevice::new(100);
  let err = device.create_buffer::<u32>("big", 26).unwrap_err();
  assert_eq!(
    err,
    ChunkError::BufferTooLarge {
      label: "big",
      bytes: 104,
      limit: 100,
    }
  );
  assert_eq!(device.memory().live_bytes(), 0, "failed allocation holds no memory");

  assert!(device.create_buffer::<u32>("exact", 25).is_ok());
}

#[test]
fn test_buffers_start_zeroed() {
  let device = SoftwareDevice::new(1024);
  let buffer = device.create_buffer::<u32>("zeros", 8).expect("fits");
  assert!(buffer.as_slice().iter().all(|&v| v == 0));
  assert_eq!(buffer.as_bytes().len(), 32);
}

#[test]
fn test_dispatch_stride() {
  let device = SoftwareDevice::new(1024);
  let mut buffer = device.create_buffer::<u32>("strided", 12).expect("fits");
  device.dispatch(&mut buffer, 3, 3, |invocation, slots| {
    assert_eq!(slots.len(), 3);
    for (i, slot) in slots.iter_mut().enumerate() {
      *slot = (invocation * 10 + i) as u32 + 1;
    }
  });

  assert_eq!(buffer.as_slice(), &[1, 2, 3, 11, 12, 13, 21, 22, 23, 0, 0, 0]);
}

#[test]
fn test_append_keeps_invocation_order() {
  let device = SoftwareDevice::new(1024);
  let mut output = device.create_append_buffer::<u32>("append", 8).expect("fits");
  device.dispatch_append(&mut output, 10, |i| (i % 2 == 0).then_some(i as u32));

  assert_eq!(device.read_counter(&output), 5);
  assert_eq!(device.read_back(output.buffer(), 5), vec![0, 2, 4, 6, 8]);
}

#[test]
fn test_append_overflow_skips_writes() {
  let device = SoftwareDevice::new(1024);
  let mut output = device.create_append_buffer::<u32>("append", 4).expect("fits");
  device.dispatch_append(&mut output, 6, |i| Some(i as u32 + 1));

  assert_eq!(device.read_counter(&output), 6, "counter counts every append");
  assert_eq!(output.buffer().as_slice(), &[1, 2, 3, 4]);

  output.reset_counter();
  assert_eq!(device.read_counter(&output), 0);
}

#[test]
fn test_read_back_clamps_length() {
  let device = SoftwareDevice::new(1024);
  let buffer = device.create_buffer::<u32>("short", 3).expect("fits");
  assert_eq!(device.read_back(&buffer, 10).len(), 3);
}
