//! Topology items and the groups that own them

use std::cell::{Cell, RefCell};
use std::rc::Weak;
use std::sync::Arc;

use crate::batch::{BatchRef, LineBatch, MeshBatch};
use crate::clone::{CloneNode, CloneRegistry, CloneResult, DeepClone, remap_weak};
use crate::group::{GeometryGroup, compact};
use crate::handle::Handle;
use crate::identity::{Identity, PickId, TopologyKind};
use crate::view::Disposable;
use crate::view::item::{ItemRef, SceneItem};

/// Shared handle to a topology item
pub type TopologyRef = Handle<TopologyItem>;

/// Renderable mirror of one face, edge, curve segment or control point
pub struct TopologyItem {
    identity: Identity,
    group: GeometryGroup,
    name: String,
    owner: u32,
    batch: BatchRef,
    parent: RefCell<Weak<SceneItem>>,
}

impl TopologyItem {
    pub(crate) fn new(
        identity: Identity,
        group: GeometryGroup,
        name: String,
        owner: u32,
        batch: BatchRef,
    ) -> Self {
        Self {
            identity,
            group,
            name,
            owner,
            batch,
            parent: RefCell::new(Weak::new()),
        }
    }

    /// Identity within the owning scene item
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Topology kind
    pub fn kind(&self) -> TopologyKind {
        self.identity.kind
    }

    /// Index within the owning scene item
    pub fn index(&self) -> u32 {
        self.identity.index
    }

    /// Stable name, e.g. `face,12,3`
    pub fn simple_name(&self) -> String {
        self.identity.name()
    }

    /// Kernel name hint
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kernel-side owner (shell/body index)
    pub fn owner(&self) -> u32 {
        self.owner
    }

    /// Range of the shared batch this item draws
    pub fn group(&self) -> GeometryGroup {
        self.group
    }

    /// Shared batch this item draws from
    pub fn batch(&self) -> &BatchRef {
        &self.batch
    }

    /// Pick id written for this item
    pub fn pick_id(&self) -> PickId {
        self.identity.pick_id()
    }

    /// Owning scene item, if it is still alive
    pub fn parent_item(&self) -> Option<ItemRef> {
        Handle::upgrade(&self.parent.borrow())
    }

    pub(crate) fn set_parent(&self, parent: Weak<SceneItem>) {
        *self.parent.borrow_mut() = parent;
    }

    /// Mesh drawing just this face, for snapping onto it
    ///
    /// `None` for anything that is not a face.
    pub fn snap_batch(&self) -> Option<MeshBatch> {
        match (&self.batch, self.identity.kind) {
            (BatchRef::Mesh(batch), TopologyKind::Face) => Some(batch.restricted_to(&self.group)),
            _ => None,
        }
    }

    /// Position of a control point
    pub fn position(&self) -> Option<[f32; 3]> {
        match &self.batch {
            BatchRef::Points(points) => points.positions.get(self.group.start as usize).copied(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for TopologyItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyItem")
            .field("identity", &self.identity)
            .field("group", &self.group)
            .field("name", &self.name)
            .finish()
    }
}

impl CloneNode for TopologyItem {
    fn shallow_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(TopologyItem::new(
            self.identity,
            self.group,
            self.name.clone(),
            self.owner,
            self.batch.clone(),
        ))
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        let parent = source.parent.borrow().clone();
        target.set_parent(remap_weak(&parent, registry)?);
        Ok(())
    }
}

/// Faces of one solid level, drawn as one merged mesh
pub struct FaceGroup {
    batch: Arc<MeshBatch>,
    faces: RefCell<Vec<TopologyRef>>,
    disposed: Cell<bool>,
}

impl FaceGroup {
    pub(crate) fn new(batch: Arc<MeshBatch>, faces: Vec<TopologyRef>) -> Self {
        Self {
            batch,
            faces: RefCell::new(faces),
            disposed: Cell::new(false),
        }
    }

    /// The merged mesh
    pub fn batch(&self) -> &Arc<MeshBatch> {
        &self.batch
    }

    /// Faces, in build order
    pub fn faces(&self) -> Vec<TopologyRef> {
        self.faces.borrow().clone()
    }

    /// Face by position
    pub fn get(&self, i: usize) -> Option<TopologyRef> {
        self.faces.borrow().get(i).cloned()
    }

    /// Number of faces
    pub fn len(&self) -> usize {
        self.faces.borrow().len()
    }

    /// Check if the group has no faces
    pub fn is_empty(&self) -> bool {
        self.faces.borrow().is_empty()
    }

    /// Whether [`Disposable::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn set_parent(&self, parent: &Weak<SceneItem>) {
        for face in self.faces.borrow().iter() {
            face.set_parent(parent.clone());
        }
    }
}

impl Disposable for FaceGroup {
    fn dispose(&self) {
        self.faces.borrow_mut().clear();
        self.disposed.set(true);
    }
}

impl CloneNode for FaceGroup {
    fn shallow_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(FaceGroup::new(self.batch.clone(), Vec::new()))
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        let faces = source.faces().deep_clone(registry)?;
        *target.faces.borrow_mut() = faces;
        Ok(())
    }
}

/// Edges of a solid level or segments of a curve, drawn as one line batch
pub struct CurveGroup {
    batch: Arc<LineBatch>,
    items: RefCell<Vec<TopologyRef>>,
    disposed: Cell<bool>,
}

impl CurveGroup {
    pub(crate) fn new(batch: Arc<LineBatch>, items: Vec<TopologyRef>) -> Self {
        Self {
            batch,
            items: RefCell::new(items),
            disposed: Cell::new(false),
        }
    }

    /// The merged line batch
    pub fn batch(&self) -> &Arc<LineBatch> {
        &self.batch
    }

    /// Edges or segments, in build order
    pub fn items(&self) -> Vec<TopologyRef> {
        self.items.borrow().clone()
    }

    /// Edge or segment by position
    pub fn get(&self, i: usize) -> Option<TopologyRef> {
        self.items.borrow().get(i).cloned()
    }

    /// Number of edges or segments
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Check if the group has no items
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Whether [`Disposable::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Line batch containing only `edges`, in the given order
    ///
    /// Used to highlight a subset of edges without redrawing the whole group.
    /// Adjacent ranges are merged, so a run of edges is one draw range.
    pub fn slice(&self, edges: &[TopologyRef]) -> LineBatch {
        let size: usize = edges.iter().map(|e| e.group().count as usize).sum();
        let mut positions = Vec::with_capacity(size);
        let mut pick_ids = Vec::with_capacity(size);
        let mut groups = Vec::with_capacity(edges.len());

        for edge in edges {
            let group = edge.group();
            let start = (group.start as usize).min(self.batch.positions.len());
            let end = (group.end() as usize).min(self.batch.positions.len());
            groups.push(GeometryGroup::new(positions.len() as u32, (end - start) as u32));
            positions.extend_from_slice(&self.batch.positions[start..end]);
            pick_ids.extend_from_slice(&self.batch.pick_ids[start..end]);
        }

        LineBatch {
            positions,
            pick_ids,
            groups: compact(&groups),
            material: self.batch.material.clone(),
            occluded_material: self.batch.occluded_material.clone(),
        }
    }

    pub(crate) fn set_parent(&self, parent: &Weak<SceneItem>) {
        for item in self.items.borrow().iter() {
            item.set_parent(parent.clone());
        }
    }
}

impl Disposable for CurveGroup {
    fn dispose(&self) {
        self.items.borrow_mut().clear();
        self.disposed.set(true);
    }
}

impl CloneNode for CurveGroup {
    fn shallow_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(CurveGroup::new(self.batch.clone(), Vec::new()))
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        let items = source.items().deep_clone(registry)?;
        *target.items.borrow_mut() = items;
        Ok(())
    }
}
