//! Raw tessellation buffers
//!
//! These are the per-element buffers a kernel emits for one item. The view
//! layer merges them into draw batches; nothing here knows about picking.

use serde::{Deserialize, Serialize};

use crate::traits::ItemType;

/// Triangulated geometry of a single face
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceBuffer {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (empty when the kernel did not provide any)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices into `positions` (empty = non-indexed triangle list)
    pub indices: Vec<u32>,
    /// Kernel-side owner of this face (shell/body index)
    pub owner: u32,
    /// Index of the face within its item
    pub index: u32,
    /// Kernel name hint
    pub name: String,
}

impl FaceBuffer {
    /// Number of indices this face contributes to a merged batch
    pub fn index_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len()
        } else {
            self.indices.len()
        }
    }
}

/// Polyline geometry of a single edge or curve segment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeBuffer {
    /// Polyline points, in order along the edge
    pub positions: Vec<[f32; 3]>,
    /// Kernel-side owner of this edge
    pub owner: u32,
    /// Index of the edge within its item
    pub index: u32,
    /// Kernel name hint
    pub name: String,
}

/// A single indexed triangle mesh (surfaces, planar regions)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshBuffer {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Everything a kernel emits for one item at one tessellation tolerance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ItemBuffers {
    /// A solid: one buffer per face and per edge
    Solid {
        faces: Vec<FaceBuffer>,
        edges: Vec<EdgeBuffer>,
    },
    /// A space curve: one buffer per segment plus its control points
    Curve {
        segments: Vec<EdgeBuffer>,
        control_points: Vec<[f32; 3]>,
    },
    /// A free-form surface
    Surface(MeshBuffer),
    /// A planar region
    Region(MeshBuffer),
}

impl ItemBuffers {
    /// The item type these buffers describe
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemBuffers::Solid { .. } => ItemType::Solid,
            ItemBuffers::Curve { .. } => ItemType::Curve,
            ItemBuffers::Surface(_) => ItemType::Surface,
            ItemBuffers::Region(_) => ItemType::Region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_count_non_indexed() {
        let face = FaceBuffer {
            positions: vec![[0.0; 3]; 6],
            ..Default::default()
        };
        assert_eq!(face.index_count(), 6);
    }

    #[test]
    fn test_item_type() {
        let buffers = ItemBuffers::Region(MeshBuffer::default());
        assert_eq!(buffers.item_type(), ItemType::Region);
    }
}
