//! View-model builders
//!
//! Builders turn per-element kernel buffers into merged, pick-tagged batches
//! and the topology items that address them. Every builder is deterministic:
//! the same buffers always produce the same ranges and pick ids.

use std::collections::HashSet;
use std::sync::Arc;

use facet_kernel::{EdgeBuffer, FaceBuffer, ItemBuffers, ItemType, MeshBuffer};
use thiserror::Error;
use tracing::debug;

use crate::batch::{
    BatchRef, LineBatch, MeshBatch, PointBatch, compute_vertex_normals, polyline_to_segments,
};
use crate::group::GeometryGroup;
use crate::handle::Handle;
use crate::identity::{
    Identity, IdentityError, ItemKind, PickId, SimpleName, TopologyKind, try_encode, try_encode_item,
};
use crate::materials::{MaterialDatabase, MaterialRef};
use crate::view::item::{Curve3D, ItemRef, Region, SceneItem, SolidLevel, Surface};
use crate::view::topology::{CurveGroup, FaceGroup, TopologyItem};

/// Errors raised while building the view model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Identity does not fit in a pick id
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Two elements of one group share an index
    #[error("Duplicate topology identity {0}")]
    DuplicateIdentity(Identity),

    /// A triangle references a vertex that does not exist
    #[error("{element}: index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        /// Element being built
        element: String,
        /// Offending index
        index: u32,
        /// Vertices available
        vertex_count: usize,
    },

    /// Levels of one item disagree on its type
    #[error("{found:?} level in a {expected:?} item")]
    MismatchedLevels {
        /// Type of the first level
        expected: ItemType,
        /// Type of the offending level
        found: ItemType,
    },

    /// An item needs at least one level
    #[error("Item has no levels")]
    NoLevels,
}

/// Merge triangles into `batch`, returning the index range they occupy
fn append_triangles(
    batch: &mut MeshBatch,
    element: impl FnOnce() -> String,
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    indices: &[u32],
    pick_id: PickId,
) -> Result<GeometryGroup, BuildError> {
    let vertex_count = positions.len();
    let local: Vec<u32> = if indices.is_empty() {
        (0..vertex_count as u32).collect()
    } else {
        indices.to_vec()
    };
    if let Some(&index) = local.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(BuildError::IndexOutOfBounds {
            element: element(),
            index,
            vertex_count,
        });
    }

    let base = batch.positions.len() as u32;
    let group = GeometryGroup::new(batch.indices.len() as u32, local.len() as u32);

    batch.positions.extend_from_slice(positions);
    if normals.len() == vertex_count {
        batch.normals.extend_from_slice(normals);
    } else {
        batch.normals.extend(compute_vertex_normals(positions, &local));
    }
    batch.pick_ids.extend(std::iter::repeat_n(pick_id, vertex_count));
    batch.indices.extend(local.iter().map(|i| i + base));
    batch.groups.push(group);

    Ok(group)
}

/// Builds the merged face mesh of one solid level
pub struct FaceGroupBuilder {
    parent: SimpleName,
    material: MaterialRef,
    faces: Vec<FaceBuffer>,
}

impl FaceGroupBuilder {
    /// Start a group for the item named `parent`
    pub fn new(parent: SimpleName, material: MaterialRef) -> Self {
        Self {
            parent,
            material,
            faces: Vec::new(),
        }
    }

    /// Queue one face
    pub fn add(&mut self, face: FaceBuffer) -> &mut Self {
        self.faces.push(face);
        self
    }

    /// Merge the queued faces
    pub fn build(self) -> Result<Handle<FaceGroup>, BuildError> {
        let mut batch = MeshBatch::empty(self.material);
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.faces.len());

        for face in self.faces {
            let identity = Identity::new(TopologyKind::Face, self.parent, face.index);
            let pick_id = try_encode(identity.kind, identity.parent, identity.index)?;
            if !seen.insert(face.index) {
                return Err(BuildError::DuplicateIdentity(identity));
            }
            let group = append_triangles(
                &mut batch,
                || identity.name(),
                &face.positions,
                &face.normals,
                &face.indices,
                pick_id,
            )?;
            entries.push((identity, group, face.name, face.owner));
        }

        debug!(
            parent = self.parent,
            faces = entries.len(),
            triangles = batch.triangle_count(),
            "Built face group"
        );

        let batch = Arc::new(batch);
        let faces = entries
            .into_iter()
            .map(|(identity, group, name, owner)| {
                Handle::new(TopologyItem::new(
                    identity,
                    group,
                    name,
                    owner,
                    BatchRef::Mesh(batch.clone()),
                ))
            })
            .collect();
        Ok(Handle::new(FaceGroup::new(batch, faces)))
    }
}

/// Builds the merged line batch of solid edges or curve segments
pub struct CurveGroupBuilder {
    kind: TopologyKind,
    parent: SimpleName,
    material: MaterialRef,
    occluded_material: Option<MaterialRef>,
    lines: Vec<EdgeBuffer>,
}

impl CurveGroupBuilder {
    /// Builder for the edges of a solid
    pub fn for_edges(parent: SimpleName, materials: &MaterialDatabase) -> Self {
        Self::new(TopologyKind::Edge, parent, materials)
    }

    /// Builder for the segments of a space curve
    pub fn for_segments(parent: SimpleName, materials: &MaterialDatabase) -> Self {
        Self::new(TopologyKind::CurveSegment, parent, materials)
    }

    fn new(kind: TopologyKind, parent: SimpleName, materials: &MaterialDatabase) -> Self {
        Self {
            kind,
            parent,
            material: materials.line(),
            occluded_material: Some(materials.occluded_line()),
            lines: Vec::new(),
        }
    }

    /// Queue one edge or segment polyline
    pub fn add(&mut self, line: EdgeBuffer) -> &mut Self {
        self.lines.push(line);
        self
    }

    /// Merge the queued lines
    pub fn build(self) -> Result<Handle<CurveGroup>, BuildError> {
        let mut batch = LineBatch::empty(self.material, self.occluded_material);
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.lines.len());

        for line in self.lines {
            let identity = Identity::new(self.kind, self.parent, line.index);
            let pick_id = try_encode(identity.kind, identity.parent, identity.index)?;
            if !seen.insert(line.index) {
                return Err(BuildError::DuplicateIdentity(identity));
            }

            let segments = polyline_to_segments(&line.positions);
            let group = GeometryGroup::new(batch.positions.len() as u32, segments.len() as u32);
            batch
                .pick_ids
                .extend(std::iter::repeat_n(pick_id, segments.len()));
            batch.positions.extend(segments);
            batch.groups.push(group);
            entries.push((identity, group, line.name, line.owner));
        }

        debug!(
            parent = self.parent,
            kind = self.kind.prefix(),
            items = entries.len(),
            segments = batch.segment_count(),
            "Built curve group"
        );

        let batch = Arc::new(batch);
        let items = entries
            .into_iter()
            .map(|(identity, group, name, owner)| {
                Handle::new(TopologyItem::new(
                    identity,
                    group,
                    name,
                    owner,
                    BatchRef::Lines(batch.clone()),
                ))
            })
            .collect();
        Ok(Handle::new(CurveGroup::new(batch, items)))
    }
}

/// Control point batches for space curves
pub struct ControlPointGroup;

impl ControlPointGroup {
    /// Tag each point with its control-point pick id
    pub fn build(
        parent: SimpleName,
        points: &[[f32; 3]],
        material: MaterialRef,
    ) -> Result<Arc<PointBatch>, BuildError> {
        let pick_ids = (0..points.len() as u32)
            .map(|i| try_encode(TopologyKind::ControlPoint, parent, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(PointBatch {
            positions: points.to_vec(),
            pick_ids,
            material,
        }))
    }
}

/// Assembles a solid from per-level edge and face groups
pub struct SolidBuilder {
    item: ItemRef,
}

impl SolidBuilder {
    /// Start an empty solid
    pub fn new(simple_name: SimpleName) -> Self {
        Self {
            item: Handle::new(SceneItem::empty(ItemKind::Solid, simple_name)),
        }
    }

    /// Append a level; add coarse levels before fine ones
    pub fn add(
        &mut self,
        edges: Handle<CurveGroup>,
        faces: Handle<FaceGroup>,
        distance: f32,
    ) -> &mut Self {
        if let Some(solid) = self.item.as_solid() {
            solid
                .lod()
                .add_level(Handle::new(SolidLevel::new(edges, faces)), distance);
        }
        self
    }

    /// Finish the solid and wire up topology back-references
    pub fn build(self) -> ItemRef {
        SceneItem::attach(&self.item);
        self.item
    }
}

/// Assembles a curve instance from per-level curve bodies
pub struct CurveInstanceBuilder {
    item: ItemRef,
}

impl CurveInstanceBuilder {
    /// Start an empty curve instance
    pub fn new(simple_name: SimpleName) -> Self {
        Self {
            item: Handle::new(SceneItem::empty(ItemKind::Curve, simple_name)),
        }
    }

    /// Append a level; add coarse levels before fine ones
    pub fn add(&mut self, curve: Handle<Curve3D>, distance: f32) -> &mut Self {
        if let Some(instance) = self.item.as_curve() {
            instance.lod().add_level(curve, distance);
        }
        self
    }

    /// Finish the instance and wire up back-references
    pub fn build(self) -> ItemRef {
        SceneItem::attach(&self.item);
        self.item
    }
}

fn uniform_mesh(
    kind: ItemKind,
    simple_name: SimpleName,
    mesh: &MeshBuffer,
    material: &MaterialRef,
) -> Result<Arc<MeshBatch>, BuildError> {
    let pick_id = try_encode_item(kind, simple_name)?;
    let mut batch = MeshBatch::empty(material.clone());
    append_triangles(
        &mut batch,
        || format!("{},{}", kind.prefix(), simple_name),
        &mesh.positions,
        &mesh.normals,
        &mesh.indices,
        pick_id,
    )?;
    Ok(Arc::new(batch))
}

/// Assembles a surface instance from per-level meshes
pub struct SurfaceInstanceBuilder {
    simple_name: SimpleName,
    material: MaterialRef,
    levels: Vec<(MeshBuffer, f32)>,
}

impl SurfaceInstanceBuilder {
    /// Start an empty surface instance
    pub fn new(simple_name: SimpleName, material: MaterialRef) -> Self {
        Self {
            simple_name,
            material,
            levels: Vec::new(),
        }
    }

    /// Append a level; add coarse levels before fine ones
    pub fn add(&mut self, mesh: MeshBuffer, distance: f32) -> &mut Self {
        self.levels.push((mesh, distance));
        self
    }

    /// Finish the instance
    pub fn build(self) -> Result<ItemRef, BuildError> {
        let item = Handle::new(SceneItem::empty(ItemKind::Surface, self.simple_name));
        if let Some(instance) = item.as_surface() {
            for (mesh, distance) in &self.levels {
                let batch = uniform_mesh(ItemKind::Surface, self.simple_name, mesh, &self.material)?;
                instance
                    .lod()
                    .add_level(Surface::build(self.simple_name, batch), *distance);
            }
        }
        Ok(item)
    }
}

/// Assembles a planar region instance from per-level meshes
pub struct RegionInstanceBuilder {
    simple_name: SimpleName,
    material: MaterialRef,
    levels: Vec<(MeshBuffer, f32)>,
}

impl RegionInstanceBuilder {
    /// Start an empty region instance
    pub fn new(simple_name: SimpleName, material: MaterialRef) -> Self {
        Self {
            simple_name,
            material,
            levels: Vec::new(),
        }
    }

    /// Append a level; add coarse levels before fine ones
    pub fn add(&mut self, mesh: MeshBuffer, distance: f32) -> &mut Self {
        self.levels.push((mesh, distance));
        self
    }

    /// Finish the instance
    pub fn build(self) -> Result<ItemRef, BuildError> {
        let item = Handle::new(SceneItem::empty(ItemKind::Region, self.simple_name));
        if let Some(instance) = item.as_region() {
            for (mesh, distance) in &self.levels {
                let batch = uniform_mesh(ItemKind::Region, self.simple_name, mesh, &self.material)?;
                instance
                    .lod()
                    .add_level(Region::build(self.simple_name, batch), *distance);
            }
        }
        Ok(item)
    }
}

/// Build the scene item for one kernel item from its per-level buffers
///
/// `levels` pairs each tessellation with the camera distance it is shown
/// from, coarsest first.
pub fn build_item(
    simple_name: SimpleName,
    levels: Vec<(ItemBuffers, f32)>,
    materials: &MaterialDatabase,
) -> Result<ItemRef, BuildError> {
    let expected = levels
        .first()
        .map(|(buffers, _)| buffers.item_type())
        .ok_or(BuildError::NoLevels)?;
    let mismatch = |found: &ItemBuffers| BuildError::MismatchedLevels {
        expected,
        found: found.item_type(),
    };

    let item = match expected {
        ItemType::Solid => {
            let mut builder = SolidBuilder::new(simple_name);
            for (buffers, distance) in levels {
                let (faces, edges) = match buffers {
                    ItemBuffers::Solid { faces, edges } => (faces, edges),
                    other => return Err(mismatch(&other)),
                };
                let mut face_builder = FaceGroupBuilder::new(simple_name, materials.face());
                for face in faces {
                    face_builder.add(face);
                }
                let mut edge_builder = CurveGroupBuilder::for_edges(simple_name, materials);
                for edge in edges {
                    edge_builder.add(edge);
                }
                builder.add(edge_builder.build()?, face_builder.build()?, distance);
            }
            builder.build()
        }
        ItemType::Curve => {
            let mut builder = CurveInstanceBuilder::new(simple_name);
            for (buffers, distance) in levels {
                let (segments, control_points) = match buffers {
                    ItemBuffers::Curve {
                        segments,
                        control_points,
                    } => (segments, control_points),
                    other => return Err(mismatch(&other)),
                };
                let mut segment_builder = CurveGroupBuilder::for_segments(simple_name, materials);
                for segment in segments {
                    segment_builder.add(segment);
                }
                let points = ControlPointGroup::build(
                    simple_name,
                    &control_points,
                    materials.control_point(),
                )?;
                builder.add(
                    Curve3D::build(simple_name, segment_builder.build()?, points),
                    distance,
                );
            }
            builder.build()
        }
        ItemType::Surface => {
            let mut builder = SurfaceInstanceBuilder::new(simple_name, materials.surface());
            for (buffers, distance) in levels {
                let mesh = match buffers {
                    ItemBuffers::Surface(mesh) => mesh,
                    other => return Err(mismatch(&other)),
                };
                builder.add(mesh, distance);
            }
            builder.build()?
        }
        ItemType::Region => {
            let mut builder = RegionInstanceBuilder::new(simple_name, materials.region());
            for (buffers, distance) in levels {
                let mesh = match buffers {
                    ItemBuffers::Region(mesh) => mesh,
                    other => return Err(mismatch(&other)),
                };
                builder.add(mesh, distance);
            }
            builder.build()?
        }
    };

    debug!(
        simple_name,
        kind = item.kind().prefix(),
        levels = item.level_count(),
        "Built scene item"
    );
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{PickTarget, decode};
    use crate::view::Disposable;

    fn face(index: u32, vertices: usize) -> FaceBuffer {
        FaceBuffer {
            positions: (0..vertices).map(|i| [i as f32, 0.0, 0.0]).collect(),
            index,
            name: format!("f{index}"),
            ..Default::default()
        }
    }

    fn edge(index: u32, points: usize) -> EdgeBuffer {
        EdgeBuffer {
            positions: (0..points).map(|i| [i as f32, 1.0, 0.0]).collect(),
            index,
            ..Default::default()
        }
    }

    #[test]
    fn test_face_group_ranges() {
        let materials = MaterialDatabase::default();
        let mut builder = FaceGroupBuilder::new(7, materials.face());
        builder.add(face(0, 3)).add(face(1, 6));
        let group = builder.build().unwrap();

        let faces = group.faces();
        assert_eq!(faces[0].group(), GeometryGroup::new(0, 3));
        assert_eq!(faces[1].group(), GeometryGroup::new(3, 6));
        assert_eq!(faces[1].simple_name(), "face,7,1");
        assert_eq!(faces[1].name(), "f1");

        let batch = group.batch();
        assert_eq!(batch.vertex_count(), 9);
        assert_eq!(batch.normals.len(), 9);
        assert_eq!(batch.indices[3], 3);
        assert_eq!(batch.pick_ids[3], faces[1].pick_id());
        assert_eq!(
            decode(faces[1].pick_id()),
            Some(PickTarget::Topology(faces[1].identity()))
        );
    }

    #[test]
    fn test_empty_groups() {
        let materials = MaterialDatabase::default();
        let faces = FaceGroupBuilder::new(1, materials.face()).build().unwrap();
        assert!(faces.is_empty());
        assert!(faces.batch().is_empty());

        let edges = CurveGroupBuilder::for_edges(1, &materials).build().unwrap();
        assert!(edges.is_empty());
        assert!(edges.batch().is_empty());
    }

    #[test]
    fn test_identities_unique_across_faces_and_edges() {
        let materials = MaterialDatabase::default();
        let faces: Vec<_> = (0..20).map(|i| face(i, 3)).collect();
        let edges: Vec<_> = (0..30).map(|i| edge(i, 2)).collect();
        let item = build_item(
            9,
            vec![(ItemBuffers::Solid { faces, edges }, 0.0)],
            &materials,
        )
        .unwrap();

        let topology = item.topology();
        assert_eq!(topology.len(), 50);
        let ids: HashSet<_> = topology.iter().map(|t| t.pick_id()).collect();
        let names: HashSet<_> = topology.iter().map(|t| t.simple_name()).collect();
        assert_eq!(ids.len(), 50);
        assert_eq!(names.len(), 50);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let materials = MaterialDatabase::default();
        let mut builder = FaceGroupBuilder::new(1, materials.face());
        builder.add(face(2, 3)).add(face(2, 3));
        assert!(matches!(
            builder.build(),
            Err(BuildError::DuplicateIdentity(_))
        ));
    }

    #[test]
    fn test_bad_index_rejected() {
        let materials = MaterialDatabase::default();
        let mut builder = FaceGroupBuilder::new(1, materials.face());
        builder.add(FaceBuffer {
            indices: vec![0, 1, 5],
            ..face(0, 3)
        });
        assert!(matches!(
            builder.build(),
            Err(BuildError::IndexOutOfBounds { index: 5, .. })
        ));
    }

    #[test]
    fn test_out_of_range_parent() {
        let materials = MaterialDatabase::default();
        let mut builder = FaceGroupBuilder::new(u32::MAX, materials.face());
        builder.add(face(0, 3));
        assert!(matches!(builder.build(), Err(BuildError::Identity(_))));
    }

    #[test]
    fn test_curve_item_control_points() {
        let materials = MaterialDatabase::default();
        let buffers = ItemBuffers::Curve {
            segments: vec![edge(0, 2), edge(1, 2)],
            control_points: vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        };
        let item = build_item(4, vec![(buffers, 0.0)], &materials).unwrap();
        let curve = item.as_curve().unwrap().underlying().unwrap();

        let points = curve.control_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].simple_name(), "control-point,4,2");
        assert_eq!(points[2].position(), Some([2.0, 0.0, 0.0]));
        assert!(Handle::ptr_eq(&points[0].parent_item().unwrap(), &item));
        assert!(curve.make_point(3).is_none());

        // derived on demand, never stored
        assert!(!Handle::ptr_eq(&points[0], &curve.control_points()[0]));
    }

    #[test]
    fn test_befragment_clears_points() {
        let materials = MaterialDatabase::default();
        let make = |name| {
            let buffers = ItemBuffers::Curve {
                segments: vec![edge(0, 3)],
                control_points: vec![[0.0; 3], [2.0, 0.0, 0.0]],
            };
            build_item(name, vec![(buffers, 0.0)], &materials).unwrap()
        };
        let ancestor = make(1);
        let fragment = make(2);
        let curve = fragment.as_curve().unwrap().underlying().unwrap();

        curve.befragment(0.25, 0.75, &ancestor);
        assert!(curve.is_fragment());
        assert!(curve.control_points().is_empty());
        let info = curve.fragment_info().unwrap();
        assert!(Handle::ptr_eq(&info.untrimmed_ancestor, &ancestor));
        assert_eq!(info.stop, 0.75);
    }

    #[test]
    fn test_clone_maps_fragment_ancestor() {
        use crate::clone::{CloneRegistry, DeepClone};

        let materials = MaterialDatabase::default();
        let make = |name| {
            let buffers = ItemBuffers::Curve {
                segments: vec![edge(0, 2)],
                control_points: Vec::new(),
            };
            build_item(name, vec![(buffers, 0.0)], &materials).unwrap()
        };
        let ancestor = make(1);
        let fragment = make(2);
        fragment
            .as_curve()
            .unwrap()
            .underlying()
            .unwrap()
            .befragment(0.0, 0.5, &ancestor);

        let mut registry = CloneRegistry::new();
        let copies = vec![ancestor.clone(), fragment.clone()]
            .deep_clone(&mut registry)
            .unwrap();
        let info = copies[1]
            .as_curve()
            .unwrap()
            .underlying()
            .unwrap()
            .fragment_info()
            .unwrap();
        assert!(Handle::ptr_eq(&info.untrimmed_ancestor, &copies[0]));
    }

    #[test]
    fn test_mismatched_levels() {
        let materials = MaterialDatabase::default();
        let levels = vec![
            (ItemBuffers::Region(MeshBuffer::default()), 10.0),
            (ItemBuffers::Surface(MeshBuffer::default()), 0.0),
        ];
        assert_eq!(
            build_item(1, levels, &materials).err(),
            Some(BuildError::MismatchedLevels {
                expected: ItemType::Region,
                found: ItemType::Surface
            })
        );
        assert_eq!(
            build_item(1, Vec::new(), &materials).err(),
            Some(BuildError::NoLevels)
        );
    }

    #[test]
    fn test_dispose_curve() {
        let materials = MaterialDatabase::default();
        let buffers = ItemBuffers::Curve {
            segments: vec![edge(0, 2)],
            control_points: vec![[0.0; 3]],
        };
        let item = build_item(3, vec![(buffers, 0.0)], &materials).unwrap();
        item.dispose();
        let curve = item.as_curve().unwrap().underlying().unwrap();
        assert!(curve.segments().is_empty());
        assert!(curve.points().is_empty());
    }
}
