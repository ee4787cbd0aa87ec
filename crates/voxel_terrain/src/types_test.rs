use super::*;

#[test]
fn test_device_layouts() {
  assert_eq!(std::mem::size_of::<Voxel>(), 16);
  assert_eq!(std::mem::size_of::<ProvisionalTriangle>(), 48);
  assert_eq!(std::mem::size_of::<Triangle>(), 72);
}

#[test]
fn test_zeroed_slots_are_not_live() {
  let provisional: ProvisionalTriangle = Zeroable::zeroed();
  let triangle: Triangle = Zeroable::zeroed();
  assert!(!provisional.is_live());
  assert!(!triangle.is_live());
}

#[test]
fn test_flat_triangle_copies_face_normal() {
  let source = ProvisionalTriangle::new([Vec3::ZERO, Vec3::X, Vec3::Z], Vec3::Y);
  let flat = Triangle::flat(&source);

  assert_eq!(flat.normals, [Vec3::Y; 3]);
  assert_eq!(flat.vertices, source.vertices);
  assert!(flat.is_live());
}

#[test]
fn test_chunk_coord_display() {
  assert_eq!(ChunkCoord::new(1, 0, 12).to_string(), "(1, 0, 12)");
  assert_eq!(ChunkCoord::from([3, 4, 5]).to_array(), [3, 4, 5]);
}

#[test]
fn test_aabb_encapsulate() {
  let mut aabb = MinMaxAABB::empty();
  assert!(!aabb.is_valid());

  aabb.encapsulate(Vec3::new(1.0, 2.0, 3.0));
  aabb.encapsulate(Vec3::new(-1.0, -2.0, -3.0));

  assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -3.0));
  assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
  assert!(aabb.is_valid());
  assert!(aabb.contains(Vec3::ZERO));
}

#[test]
fn test_aabb_from_center_size() {
  let aabb = MinMaxAABB::from_center_size(Vec3::new(1.0, 0.0, 0.0), 2.0);
  assert_eq!(aabb.min, Vec3::new(0.0, -1.0, -1.0));
  assert_eq!(aabb.max, Vec3::new(2.0, 1.0, 1.0));
}

#[test]
fn test_mesh_push_triangle() {
  let mut mesh = ChunkMesh::with_capacity(2);
  let triangle = Triangle::flat(&ProvisionalTriangle::new(
    [Vec3::ZERO, Vec3::X, Vec3::Y],
    Vec3::Z,
  ));
  mesh.push_triangle(&triangle);
  mesh.push_triangle(&triangle);

  assert_eq!(mesh.triangle_count(), 2);
  assert_eq!(mesh.vertex_count(), 6);
  assert_eq!(mesh.indices, trivial_indices(2));
  assert_eq!(mesh.normals.len(), mesh.vertices.len());
  assert_eq!(mesh.bounds.max, Vec3::new(1.0, 1.0, 0.0));
}

#[test]
fn test_trivial_indices() {
  assert!(trivial_indices(0).is_empty());
  assert_eq!(trivial_indices(2), vec![0, 1, 2, 3, 4, 5]);
}
