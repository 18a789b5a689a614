//! Merged draw batches
//!
//! A batch is the GPU-facing buffer set for many topology items at once.
//! Items address their slice of it through a [`GeometryGroup`]. Batches are
//! immutable once built and shared by `Arc`, including between a scene and
//! its snapshots.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::group::GeometryGroup;
use crate::identity::PickId;
use crate::materials::MaterialRef;

/// Vertex layout for face batches
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FaceVertex {
    /// Vertex position in item space
    pub position: [f32; 3],
    /// Vertex normal
    pub normal: [f32; 3],
    /// Pick id of the owning topology item, low word first
    pub pick_id: [u32; 2],
}

/// Vertex layout for line and point batches
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// Vertex position in item space
    pub position: [f32; 3],
    /// Pick id of the owning topology item, low word first
    pub pick_id: [u32; 2],
}

/// Indexed triangle batch
#[derive(Debug, Clone)]
pub struct MeshBatch {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals, same length as `positions`
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices
    pub indices: Vec<u32>,
    /// Per-vertex pick ids
    pub pick_ids: Vec<PickId>,
    /// Index ranges, one per topology item
    pub groups: Vec<GeometryGroup>,
    /// Material
    pub material: MaterialRef,
}

impl MeshBatch {
    /// Create an empty batch
    pub fn empty(material: MaterialRef) -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            pick_ids: Vec::new(),
            groups: Vec::new(),
            material,
        }
    }

    /// Check if the batch draws nothing
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaved vertices ready for upload
    pub fn vertices(&self) -> Vec<FaceVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.pick_ids)
            .map(|((&position, &normal), &pick_id)| FaceVertex {
                position,
                normal,
                pick_id: pick_id.to_words(),
            })
            .collect()
    }

    /// Copy of this batch drawing only `group`
    ///
    /// Vertex data is kept whole so indices stay valid.
    pub fn restricted_to(&self, group: &GeometryGroup) -> MeshBatch {
        let start = (group.start as usize).min(self.indices.len());
        let end = (group.end() as usize).min(self.indices.len());
        let indices = self.indices[start..end].to_vec();
        MeshBatch {
            positions: self.positions.clone(),
            normals: self.normals.clone(),
            groups: vec![GeometryGroup {
                start: 0,
                count: indices.len() as u32,
                material_index: group.material_index,
            }],
            indices,
            pick_ids: self.pick_ids.clone(),
            material: self.material.clone(),
        }
    }
}

/// Line segment batch
///
/// Positions are consecutive segment endpoint pairs.
#[derive(Debug, Clone)]
pub struct LineBatch {
    /// Segment endpoint pairs
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex pick ids
    pub pick_ids: Vec<PickId>,
    /// Vertex ranges, one per topology item
    pub groups: Vec<GeometryGroup>,
    /// Visible line material
    pub material: MaterialRef,
    /// Material for the X-ray pass, if the lines are drawn there
    pub occluded_material: Option<MaterialRef>,
}

impl LineBatch {
    /// Create an empty batch
    pub fn empty(material: MaterialRef, occluded_material: Option<MaterialRef>) -> Self {
        Self {
            positions: Vec::new(),
            pick_ids: Vec::new(),
            groups: Vec::new(),
            material,
            occluded_material,
        }
    }

    /// Check if the batch draws nothing
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.positions.len() / 2
    }

    /// Interleaved vertices ready for upload
    pub fn vertices(&self) -> Vec<LineVertex> {
        interleave(&self.positions, &self.pick_ids)
    }
}

/// Point sprite batch
#[derive(Debug, Clone)]
pub struct PointBatch {
    /// Point positions
    pub positions: Vec<[f32; 3]>,
    /// Per-point pick ids
    pub pick_ids: Vec<PickId>,
    /// Material
    pub material: MaterialRef,
}

impl PointBatch {
    /// Create an empty batch
    pub fn empty(material: MaterialRef) -> Self {
        Self {
            positions: Vec::new(),
            pick_ids: Vec::new(),
            material,
        }
    }

    /// Check if the batch draws nothing
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Interleaved vertices ready for upload
    pub fn vertices(&self) -> Vec<LineVertex> {
        interleave(&self.positions, &self.pick_ids)
    }
}

/// Shared reference to any batch kind
#[derive(Debug, Clone)]
pub enum BatchRef {
    /// Triangle batch
    Mesh(Arc<MeshBatch>),
    /// Line segment batch
    Lines(Arc<LineBatch>),
    /// Point batch
    Points(Arc<PointBatch>),
}

impl BatchRef {
    /// Whether both references point at the same batch
    pub fn ptr_eq(&self, other: &BatchRef) -> bool {
        match (self, other) {
            (BatchRef::Mesh(a), BatchRef::Mesh(b)) => Arc::ptr_eq(a, b),
            (BatchRef::Lines(a), BatchRef::Lines(b)) => Arc::ptr_eq(a, b),
            (BatchRef::Points(a), BatchRef::Points(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Material the batch is drawn with
    pub fn material(&self) -> &MaterialRef {
        match self {
            BatchRef::Mesh(batch) => &batch.material,
            BatchRef::Lines(batch) => &batch.material,
            BatchRef::Points(batch) => &batch.material,
        }
    }
}

fn interleave(positions: &[[f32; 3]], pick_ids: &[PickId]) -> Vec<LineVertex> {
    positions
        .iter()
        .zip(pick_ids)
        .map(|(&position, &pick_id)| LineVertex {
            position,
            pick_id: pick_id.to_words(),
        })
        .collect()
}

/// Expand a polyline into segment endpoint pairs
pub fn polyline_to_segments(points: &[[f32; 3]]) -> Vec<[f32; 3]> {
    points
        .windows(2)
        .flat_map(|pair| [pair[0], pair[1]])
        .collect()
}

/// Smooth per-vertex normals from triangle geometry
///
/// Triangle normals are area-weighted; vertices with no non-degenerate
/// triangle get `+Z`.
pub fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![glam::Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let v0 = glam::Vec3::from(positions[a]);
        let v1 = glam::Vec3::from(positions[b]);
        let v2 = glam::Vec3::from(positions[c]);
        let cross = (v1 - v0).cross(v2 - v0);
        sums[a] += cross;
        sums[b] += cross;
        sums[c] += cross;
    }

    sums.into_iter()
        .map(|n| n.try_normalize().unwrap_or(glam::Vec3::Z).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{MaterialDatabase, MaterialDef};
    use approx::assert_relative_eq;

    #[test]
    fn test_polyline_to_segments() {
        let segments = polyline_to_segments(&[[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[1], segments[2]);
        assert!(polyline_to_segments(&[[0.0; 3]]).is_empty());
    }

    #[test]
    fn test_vertex_normals_flat_quad() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let normals = compute_vertex_normals(&positions, &[0, 1, 2, 0, 2, 3]);
        for n in normals {
            assert_relative_eq!(n[2], 1.0);
        }
    }

    #[test]
    fn test_vertex_normals_degenerate() {
        let normals = compute_vertex_normals(&[[0.0; 3], [0.0; 3], [0.0; 3]], &[0, 1, 2]);
        assert_eq!(normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_restricted_batch() {
        let batch = MeshBatch {
            positions: vec![[0.0; 3]; 4],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            pick_ids: vec![PickId(7); 4],
            groups: vec![GeometryGroup::new(0, 3), GeometryGroup::new(3, 3)],
            material: Arc::new(MaterialDef::new("test", [1.0; 4])),
        };
        let snap = batch.restricted_to(&batch.groups[1]);
        assert_eq!(snap.indices, vec![0, 2, 3]);
        assert_eq!(snap.groups, vec![GeometryGroup::new(0, 3)]);
        assert_eq!(snap.vertex_count(), 4);
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<FaceVertex>(), 32);
        assert_eq!(std::mem::size_of::<LineVertex>(), 20);

        let batch = LineBatch {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            pick_ids: vec![PickId(9 << 32 | 1); 2],
            groups: vec![GeometryGroup::new(0, 2)],
            material: MaterialDatabase::default().line(),
            occluded_material: None,
        };
        let vertices = batch.vertices();
        assert_eq!(vertices[1].pick_id, [1, 9]);
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 40);
    }
}
