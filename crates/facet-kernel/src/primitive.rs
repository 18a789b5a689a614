//! Reference primitive kernel
//!
//! A deterministic kernel that knows a handful of analytic shapes and
//! tessellates them directly:
//! - Sphere (one face, one seam edge)
//! - Box (six faces, twelve edges)
//! - Polyline curves, planar regions, bilinear surface patches
//!
//! Transforms are accumulated on the handle and applied at tessellation time.

use std::f32::consts::PI;

use async_trait::async_trait;
use glam::{Mat3, Mat4, Vec3};

use crate::buffers::{EdgeBuffer, FaceBuffer, ItemBuffers, MeshBuffer};
use crate::traits::{GeometryKernel, ItemType, KernelError, KernelItem, KernelResult};

/// Shapes the primitive kernel understands
#[derive(Debug, Clone)]
enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Box { center: Vec3, size: Vec3 },
    Polyline { points: Vec<Vec3>, closed: bool },
    Region { outline: Vec<Vec3> },
    Surface { corners: [Vec3; 4] },
}

impl Shape {
    fn item_type(&self) -> ItemType {
        match self {
            Shape::Sphere { .. } | Shape::Box { .. } => ItemType::Solid,
            Shape::Polyline { .. } => ItemType::Curve,
            Shape::Region { .. } => ItemType::Region,
            Shape::Surface { .. } => ItemType::Surface,
        }
    }
}

/// Kernel-side representation stored inside a [`KernelItem`]
#[derive(Debug, Clone)]
struct Primitive {
    shape: Shape,
    transform: Mat4,
}

/// Deterministic kernel for analytic primitives
#[derive(Debug, Clone)]
pub struct PrimitiveKernel {
    /// Lower bound on segments per full turn or edge
    min_segments: u32,
    /// Upper bound on segments per full turn or edge
    max_segments: u32,
}

impl Default for PrimitiveKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimitiveKernel {
    /// Create a kernel with default resolution limits
    pub fn new() -> Self {
        Self {
            min_segments: 8,
            max_segments: 128,
        }
    }

    /// Create a kernel with custom resolution limits
    pub fn with_segment_limits(min_segments: u32, max_segments: u32) -> Self {
        Self {
            min_segments: min_segments.max(1),
            max_segments: max_segments.max(min_segments.max(1)),
        }
    }

    fn make(shape: Shape) -> KernelItem {
        let item_type = shape.item_type();
        KernelItem::new(
            item_type,
            Primitive {
                shape,
                transform: Mat4::IDENTITY,
            },
        )
    }

    fn primitive(item: &KernelItem) -> KernelResult<&Primitive> {
        item.data::<Primitive>().ok_or_else(|| {
            KernelError::ForeignItem("item was not created by the primitive kernel".into())
        })
    }

    fn segments_for(&self, length: f32, tolerance: f32) -> u32 {
        let raw = (length / tolerance).ceil();
        if raw.is_finite() && raw > 0.0 {
            (raw as u32).clamp(self.min_segments, self.max_segments)
        } else {
            self.min_segments
        }
    }

    fn tessellate_primitive(
        &self,
        primitive: &Primitive,
        tolerance: f32,
    ) -> KernelResult<ItemBuffers> {
        let mut buffers = match &primitive.shape {
            Shape::Sphere { center, radius } => {
                let lon = self.segments_for(2.0 * PI * radius, tolerance);
                let lat = (lon / 2).max(2);
                sphere_buffers(*center, *radius, lat, lon)
            }
            Shape::Box { center, size } => box_buffers(*center, *size),
            Shape::Polyline { points, closed } => polyline_buffers(points, *closed),
            Shape::Region { outline } => ItemBuffers::Region(region_mesh(outline)),
            Shape::Surface { corners } => {
                let longest = (corners[1] - corners[0])
                    .length()
                    .max((corners[3] - corners[0]).length());
                let divisions = self.segments_for(longest, tolerance);
                ItemBuffers::Surface(surface_mesh(corners, divisions))
            }
        };

        if primitive.transform != Mat4::IDENTITY {
            apply_transform(&mut buffers, &primitive.transform);
        }
        Ok(buffers)
    }
}

#[async_trait]
impl GeometryKernel for PrimitiveKernel {
    fn name(&self) -> &str {
        "primitive"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn create_sphere(&self, center: Vec3, radius: f32) -> KernelResult<KernelItem> {
        if !(radius > 0.0) {
            return Err(KernelError::InvalidParameter(format!(
                "sphere radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self::make(Shape::Sphere { center, radius }))
    }

    async fn create_box(&self, center: Vec3, size: Vec3) -> KernelResult<KernelItem> {
        if size.min_element() <= 0.0 {
            return Err(KernelError::InvalidParameter(format!(
                "box size must be positive, got {}",
                size
            )));
        }
        Ok(Self::make(Shape::Box { center, size }))
    }

    async fn create_polyline(&self, points: &[Vec3], closed: bool) -> KernelResult<KernelItem> {
        if points.len() < 2 {
            return Err(KernelError::InvalidParameter(
                "polyline needs at least 2 points".into(),
            ));
        }
        Ok(Self::make(Shape::Polyline {
            points: points.to_vec(),
            closed,
        }))
    }

    async fn create_region(&self, outline: &[Vec3]) -> KernelResult<KernelItem> {
        if outline.len() < 3 {
            return Err(KernelError::InvalidParameter(
                "region outline needs at least 3 points".into(),
            ));
        }
        Ok(Self::make(Shape::Region {
            outline: outline.to_vec(),
        }))
    }

    async fn create_surface(&self, corners: [Vec3; 4]) -> KernelResult<KernelItem> {
        Ok(Self::make(Shape::Surface { corners }))
    }

    async fn transform(&self, item: &KernelItem, matrix: Mat4) -> KernelResult<KernelItem> {
        let primitive = Self::primitive(item)?;
        if matrix.determinant().abs() <= f32::EPSILON {
            return Err(KernelError::InvalidParameter(
                "transform must be invertible".into(),
            ));
        }
        Ok(KernelItem::new(
            item.item_type(),
            Primitive {
                shape: primitive.shape.clone(),
                transform: matrix * primitive.transform,
            },
        ))
    }

    async fn tessellate(&self, item: &KernelItem, tolerance: f32) -> KernelResult<ItemBuffers> {
        if !(tolerance > 0.0) {
            return Err(KernelError::TessellationFailed(format!(
                "tolerance must be positive, got {}",
                tolerance
            )));
        }
        let primitive = Self::primitive(item)?;
        let buffers = self.tessellate_primitive(primitive, tolerance)?;
        tracing::trace!(
            "Tessellated {:?} at tolerance {}",
            item.item_type(),
            tolerance
        );
        Ok(buffers)
    }
}

/// UV sphere as a single face plus the seam meridian as its only edge
fn sphere_buffers(center: Vec3, radius: f32, lat_segments: u32, lon_segments: u32) -> ItemBuffers {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for lat in 0..=lat_segments {
        let theta = (lat as f32 / lat_segments as f32) * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for lon in 0..=lon_segments {
            let phi = (lon as f32 / lon_segments as f32) * 2.0 * PI;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let n = Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);
            positions.push((center + n * radius).to_array());
            normals.push(n.to_array());
        }
    }

    for lat in 0..lat_segments {
        for lon in 0..lon_segments {
            let current = lat * (lon_segments + 1) + lon;
            let next = current + lon_segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    let seam = (0..=lat_segments)
        .map(|lat| positions[(lat * (lon_segments + 1)) as usize])
        .collect();

    ItemBuffers::Solid {
        faces: vec![FaceBuffer {
            positions,
            normals,
            indices,
            owner: 0,
            index: 0,
            name: "sphere-face".into(),
        }],
        edges: vec![EdgeBuffer {
            positions: seam,
            owner: 0,
            index: 0,
            name: "sphere-seam".into(),
        }],
    }
}

/// Box with 4 vertices per face (for proper normals) and 12 straight edges
fn box_buffers(center: Vec3, size: Vec3) -> ItemBuffers {
    let h = size * 0.5;
    let corner = |x: f32, y: f32, z: f32| (center + Vec3::new(x * h.x, y * h.y, z * h.z)).to_array();

    let quads: [([[f32; 3]; 4], [f32; 3]); 6] = [
        (
            [corner(1., -1., -1.), corner(1., 1., -1.), corner(1., 1., 1.), corner(1., -1., 1.)],
            [1.0, 0.0, 0.0],
        ),
        (
            [corner(-1., 1., -1.), corner(-1., -1., -1.), corner(-1., -1., 1.), corner(-1., 1., 1.)],
            [-1.0, 0.0, 0.0],
        ),
        (
            [corner(1., 1., -1.), corner(-1., 1., -1.), corner(-1., 1., 1.), corner(1., 1., 1.)],
            [0.0, 1.0, 0.0],
        ),
        (
            [corner(-1., -1., -1.), corner(1., -1., -1.), corner(1., -1., 1.), corner(-1., -1., 1.)],
            [0.0, -1.0, 0.0],
        ),
        (
            [corner(-1., -1., 1.), corner(1., -1., 1.), corner(1., 1., 1.), corner(-1., 1., 1.)],
            [0.0, 0.0, 1.0],
        ),
        (
            [corner(-1., 1., -1.), corner(1., 1., -1.), corner(1., -1., -1.), corner(-1., -1., -1.)],
            [0.0, 0.0, -1.0],
        ),
    ];

    let faces = quads
        .iter()
        .enumerate()
        .map(|(i, (corners, normal))| FaceBuffer {
            positions: corners.to_vec(),
            normals: vec![*normal; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            owner: 0,
            index: i as u32,
            name: format!("box-face-{}", i),
        })
        .collect();

    // Bottom ring, top ring, then the four verticals
    let ring = [(-1., -1.), (1., -1.), (1., 1.), (-1., 1.)];
    let mut segments = Vec::with_capacity(12);
    for z in [-1., 1.] {
        for i in 0..4 {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % 4];
            segments.push([corner(x0, y0, z), corner(x1, y1, z)]);
        }
    }
    for (x, y) in ring {
        segments.push([corner(x, y, -1.), corner(x, y, 1.)]);
    }

    let edges = segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| EdgeBuffer {
            positions: segment.to_vec(),
            owner: 0,
            index: i as u32,
            name: format!("box-edge-{}", i),
        })
        .collect();

    ItemBuffers::Solid { faces, edges }
}

fn polyline_buffers(points: &[Vec3], closed: bool) -> ItemBuffers {
    let mut segments: Vec<EdgeBuffer> = points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| EdgeBuffer {
            positions: vec![pair[0].to_array(), pair[1].to_array()],
            owner: 0,
            index: i as u32,
            name: format!("segment-{}", i),
        })
        .collect();

    if closed && let (Some(first), Some(last)) = (points.first(), points.last()) {
        let index = segments.len() as u32;
        segments.push(EdgeBuffer {
            positions: vec![last.to_array(), first.to_array()],
            owner: 0,
            index,
            name: format!("segment-{}", index),
        });
    }

    ItemBuffers::Curve {
        segments,
        control_points: points.iter().map(|p| p.to_array()).collect(),
    }
}

/// Fan triangulation of a convex planar outline
fn region_mesh(outline: &[Vec3]) -> MeshBuffer {
    // Newell's method
    let mut normal = Vec3::ZERO;
    for (i, current) in outline.iter().enumerate() {
        let next = outline[(i + 1) % outline.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    let normal = normal.try_normalize().unwrap_or(Vec3::Z).to_array();

    let mut indices = Vec::with_capacity((outline.len() - 2) * 3);
    for i in 1..outline.len() as u32 - 1 {
        indices.extend_from_slice(&[0, i, i + 1]);
    }

    MeshBuffer {
        positions: outline.iter().map(|p| p.to_array()).collect(),
        normals: vec![normal; outline.len()],
        indices,
    }
}

/// Bilinear patch through corners (c0, c1, c2, c3) in counter-clockwise order
fn surface_mesh(corners: &[Vec3; 4], divisions: u32) -> MeshBuffer {
    let [c0, c1, c2, c3] = *corners;
    let n = divisions;
    let mut positions = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());

    for j in 0..=n {
        let v = j as f32 / n as f32;
        for i in 0..=n {
            let u = i as f32 / n as f32;
            let p = c0 * (1.0 - u) * (1.0 - v) + c1 * u * (1.0 - v) + c2 * u * v + c3 * (1.0 - u) * v;
            let du = (c1 - c0) * (1.0 - v) + (c2 - c3) * v;
            let dv = (c3 - c0) * (1.0 - u) + (c2 - c1) * u;
            positions.push(p.to_array());
            normals.push(du.cross(dv).try_normalize().unwrap_or(Vec3::Z).to_array());
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    for j in 0..n {
        for i in 0..n {
            let a = j * (n + 1) + i;
            let b = a + n + 1;
            indices.extend_from_slice(&[a, a + 1, b + 1, a, b + 1, b]);
        }
    }

    MeshBuffer {
        positions,
        normals,
        indices,
    }
}

fn apply_transform(buffers: &mut ItemBuffers, matrix: &Mat4) {
    let normal_matrix = Mat3::from_mat4(*matrix).inverse().transpose();
    let mirrored = matrix.determinant() < 0.0;

    let point = |p: &mut [f32; 3]| *p = matrix.transform_point3(Vec3::from_array(*p)).to_array();
    let normal = |n: &mut [f32; 3]| {
        *n = (normal_matrix * Vec3::from_array(*n))
            .try_normalize()
            .unwrap_or(Vec3::Z)
            .to_array()
    };
    // A mirror flips handedness, so triangle winding must flip with it
    let rewind = |indices: &mut Vec<u32>| {
        if mirrored {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
    };

    match buffers {
        ItemBuffers::Solid { faces, edges } => {
            for face in faces {
                face.positions.iter_mut().for_each(point);
                face.normals.iter_mut().for_each(normal);
                rewind(&mut face.indices);
            }
            for edge in edges {
                edge.positions.iter_mut().for_each(point);
            }
        }
        ItemBuffers::Curve {
            segments,
            control_points,
        } => {
            for segment in segments {
                segment.positions.iter_mut().for_each(point);
            }
            control_points.iter_mut().for_each(point);
        }
        ItemBuffers::Surface(mesh) | ItemBuffers::Region(mesh) => {
            mesh.positions.iter_mut().for_each(point);
            mesh.normals.iter_mut().for_each(normal);
            rewind(&mut mesh.indices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block<F: std::future::Future>(f: F) -> F::Output {
        pollster::block_on(f)
    }

    #[test]
    fn test_box_topology() {
        let kernel = PrimitiveKernel::new();
        let item = block(kernel.create_box(Vec3::ZERO, Vec3::ONE)).unwrap();
        assert_eq!(item.item_type(), ItemType::Solid);

        match block(kernel.tessellate(&item, 0.1)).unwrap() {
            ItemBuffers::Solid { faces, edges } => {
                assert_eq!(faces.len(), 6);
                assert_eq!(edges.len(), 12);
                assert!(faces.iter().all(|f| f.indices.len() == 6));
            }
            other => panic!("expected solid buffers, got {:?}", other.item_type()),
        }
    }

    #[test]
    fn test_sphere_resolution_follows_tolerance() {
        let kernel = PrimitiveKernel::new();
        let item = block(kernel.create_sphere(Vec3::ZERO, 1.0)).unwrap();

        let count = |tolerance| match block(kernel.tessellate(&item, tolerance)).unwrap() {
            ItemBuffers::Solid { faces, .. } => faces[0].positions.len(),
            _ => 0,
        };
        assert!(count(1.0) < count(0.1));
    }

    #[test]
    fn test_invalid_radius() {
        let kernel = PrimitiveKernel::new();
        let result = block(kernel.create_sphere(Vec3::ZERO, 0.0));
        assert!(matches!(result, Err(KernelError::InvalidParameter(_))));
    }

    #[test]
    fn test_closed_polyline_segments() {
        let kernel = PrimitiveKernel::new();
        let points = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let item = block(kernel.create_polyline(&points, true)).unwrap();

        match block(kernel.tessellate(&item, 0.1)).unwrap() {
            ItemBuffers::Curve {
                segments,
                control_points,
            } => {
                assert_eq!(segments.len(), 3);
                assert_eq!(control_points.len(), 3);
                assert_eq!(segments[2].positions, vec![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]);
            }
            other => panic!("expected curve buffers, got {:?}", other.item_type()),
        }
    }

    #[test]
    fn test_mirror_transform() {
        let kernel = PrimitiveKernel::new();
        let points = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 0.0)];
        let item = block(kernel.create_polyline(&points, false)).unwrap();
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let mirrored = block(kernel.transform(&item, mirror)).unwrap();
        assert!(!KernelItem::ptr_eq(&item, &mirrored));

        match block(kernel.tessellate(&mirrored, 0.1)).unwrap() {
            ItemBuffers::Curve { control_points, .. } => {
                assert_relative_eq!(control_points[0][0], -1.0);
                assert_relative_eq!(control_points[1][0], -2.0);
                assert_relative_eq!(control_points[1][1], 1.0);
            }
            other => panic!("expected curve buffers, got {:?}", other.item_type()),
        }
    }

    #[test]
    fn test_foreign_item_rejected() {
        let kernel = PrimitiveKernel::new();
        let foreign = KernelItem::new(ItemType::Solid, "not a primitive");
        let result = block(kernel.tessellate(&foreign, 0.1));
        assert!(matches!(result, Err(KernelError::ForeignItem(_))));
    }

    #[test]
    fn test_region_fan() {
        let kernel = PrimitiveKernel::new();
        let outline = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        let item = block(kernel.create_region(&outline)).unwrap();
        match block(kernel.tessellate(&item, 0.1)).unwrap() {
            ItemBuffers::Region(mesh) => {
                assert_eq!(mesh.triangle_count(), 2);
                assert_relative_eq!(mesh.normals[0][2], 1.0);
            }
            other => panic!("expected region buffers, got {:?}", other.item_type()),
        }
    }
}
