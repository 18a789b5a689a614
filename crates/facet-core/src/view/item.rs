//! Scene items and their levels of detail

use std::cell::{Cell, RefCell};
use std::rc::Weak;
use std::sync::Arc;

use crate::batch::{BatchRef, MeshBatch, PointBatch};
use crate::clone::{CloneError, CloneNode, CloneRegistry, CloneResult, DeepClone, remap_weak};
use crate::group::GeometryGroup;
use crate::handle::Handle;
use crate::identity::{Identity, ItemKind, SimpleName, TopologyKind};
use crate::view::Disposable;
use crate::view::topology::{CurveGroup, FaceGroup, TopologyItem, TopologyRef};

/// Shared handle to a scene item
pub type ItemRef = Handle<SceneItem>;

/// Identity and display state shared by every scene item
#[derive(Debug)]
pub struct ItemMeta {
    simple_name: SimpleName,
    visible: Cell<bool>,
    disposed: Cell<bool>,
}

impl ItemMeta {
    /// Create metadata for a freshly built item
    pub fn new(simple_name: SimpleName) -> Self {
        Self {
            simple_name,
            visible: Cell::new(true),
            disposed: Cell::new(false),
        }
    }

    /// Kernel-assigned name
    pub fn simple_name(&self) -> SimpleName {
        self.simple_name
    }

    fn copy(&self) -> Self {
        Self {
            simple_name: self.simple_name,
            visible: Cell::new(self.visible.get()),
            disposed: Cell::new(self.disposed.get()),
        }
    }
}

/// One level of detail
pub struct LodLevel<L> {
    /// Camera distance from which this level is used
    pub distance: f32,
    /// Level contents
    pub object: Handle<L>,
}

impl<L> Clone for LodLevel<L> {
    fn clone(&self) -> Self {
        Self {
            distance: self.distance,
            object: self.object.clone(),
        }
    }
}

/// Levels of detail, coarsest first; the last level is the default
pub struct Lod<L> {
    levels: RefCell<Vec<LodLevel<L>>>,
}

impl<L> Default for Lod<L> {
    fn default() -> Self {
        Self {
            levels: RefCell::new(Vec::new()),
        }
    }
}

impl<L> Lod<L> {
    pub(crate) fn add_level(&self, object: Handle<L>, distance: f32) {
        self.levels.borrow_mut().push(LodLevel { distance, object });
    }

    /// All levels, coarsest first
    pub fn levels(&self) -> Vec<LodLevel<L>> {
        self.levels.borrow().clone()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.borrow().len()
    }

    /// Check if there are no levels
    pub fn is_empty(&self) -> bool {
        self.levels.borrow().is_empty()
    }

    /// Highest-detail level
    pub fn default_level(&self) -> Option<Handle<L>> {
        self.levels.borrow().last().map(|l| l.object.clone())
    }

    /// Level to draw at camera `distance`
    ///
    /// The level with the largest threshold not above `distance` wins; ties
    /// go to the finer level.
    pub fn level_for_distance(&self, distance: f32) -> Option<Handle<L>> {
        let levels = self.levels.borrow();
        let mut best: Option<&LodLevel<L>> = None;
        for level in levels.iter() {
            if level.distance <= distance && best.is_none_or(|b| level.distance >= b.distance) {
                best = Some(level);
            }
        }
        best.or(levels.last()).map(|l| l.object.clone())
    }
}

impl<L: CloneNode> Lod<L> {
    fn clone_into(&self, target: &Lod<L>, registry: &mut CloneRegistry) -> CloneResult<()> {
        for level in self.levels() {
            let object = level.object.deep_clone(registry)?;
            target.add_level(object, level.distance);
        }
        Ok(())
    }
}

/// Edges and faces of one solid level
pub struct SolidLevel {
    edges: RefCell<Handle<CurveGroup>>,
    faces: RefCell<Handle<FaceGroup>>,
}

impl SolidLevel {
    /// Pair an edge group with a face group
    pub fn new(edges: Handle<CurveGroup>, faces: Handle<FaceGroup>) -> Self {
        Self {
            edges: RefCell::new(edges),
            faces: RefCell::new(faces),
        }
    }

    /// Edge group
    pub fn edges(&self) -> Handle<CurveGroup> {
        self.edges.borrow().clone()
    }

    /// Face group
    pub fn faces(&self) -> Handle<FaceGroup> {
        self.faces.borrow().clone()
    }
}

impl CloneNode for SolidLevel {
    // Placeholders share the source batches; the registered group clones
    // replace them in `clone_children`.
    fn shallow_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(SolidLevel::new(
            Handle::new(self.edges().shallow_clone(registry)?),
            Handle::new(self.faces().shallow_clone(registry)?),
        ))
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        let edges = source.edges().deep_clone(registry)?;
        *target.edges.borrow_mut() = edges;
        let faces = source.faces().deep_clone(registry)?;
        *target.faces.borrow_mut() = faces;
        Ok(())
    }
}

/// Marks a curve as a trimmed piece of another curve
#[derive(Debug, Clone)]
pub struct FragmentInfo {
    /// Start parameter on the ancestor
    pub start: f64,
    /// Stop parameter on the ancestor
    pub stop: f64,
    /// The untrimmed curve this fragment was cut from
    pub untrimmed_ancestor: ItemRef,
}

impl DeepClone for FragmentInfo {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(FragmentInfo {
            start: self.start,
            stop: self.stop,
            untrimmed_ancestor: self.untrimmed_ancestor.deep_clone(registry)?,
        })
    }
}

/// Body of a space curve: segments plus control points
pub struct Curve3D {
    simple_name: SimpleName,
    segments: RefCell<Handle<CurveGroup>>,
    points: RefCell<Arc<PointBatch>>,
    fragment: RefCell<Option<FragmentInfo>>,
    parent: RefCell<Weak<SceneItem>>,
}

impl Curve3D {
    /// Assemble a curve body
    pub fn build(
        simple_name: SimpleName,
        segments: Handle<CurveGroup>,
        points: Arc<PointBatch>,
    ) -> Handle<Curve3D> {
        Handle::new(Curve3D {
            simple_name,
            segments: RefCell::new(segments),
            points: RefCell::new(points),
            fragment: RefCell::new(None),
            parent: RefCell::new(Weak::new()),
        })
    }

    /// Segment group
    pub fn segments(&self) -> Handle<CurveGroup> {
        self.segments.borrow().clone()
    }

    /// Control point batch
    pub fn points(&self) -> Arc<PointBatch> {
        self.points.borrow().clone()
    }

    /// Owning curve instance, if it is still alive
    pub fn parent_item(&self) -> Option<ItemRef> {
        Handle::upgrade(&self.parent.borrow())
    }

    /// Fresh control point items, one per point sample
    ///
    /// These are derived on every call and never stored.
    pub fn control_points(&self) -> Vec<TopologyRef> {
        (0..self.points.borrow().len())
            .filter_map(|i| self.make_point(i as u32))
            .collect()
    }

    /// Control point item for the point at `index`
    pub fn make_point(&self, index: u32) -> Option<TopologyRef> {
        let points = self.points();
        if index as usize >= points.len() {
            return None;
        }
        let point = TopologyItem::new(
            Identity::new(TopologyKind::ControlPoint, self.simple_name, index),
            GeometryGroup::new(index, 1),
            String::new(),
            0,
            BatchRef::Points(points),
        );
        point.set_parent(self.parent.borrow().clone());
        Some(Handle::new(point))
    }

    /// Mark this curve as a trimmed fragment of `ancestor`
    ///
    /// Fragments have no control points.
    pub fn befragment(&self, start: f64, stop: f64, ancestor: &ItemRef) {
        *self.fragment.borrow_mut() = Some(FragmentInfo {
            start,
            stop,
            untrimmed_ancestor: ancestor.clone(),
        });
        self.clear_points();
    }

    /// Fragment info, if this curve is a fragment
    pub fn fragment_info(&self) -> Option<FragmentInfo> {
        self.fragment.borrow().clone()
    }

    /// Whether this curve is a trimmed fragment
    pub fn is_fragment(&self) -> bool {
        self.fragment.borrow().is_some()
    }

    fn clear_points(&self) {
        let material = self.points.borrow().material.clone();
        *self.points.borrow_mut() = Arc::new(PointBatch::empty(material));
    }

    pub(crate) fn set_parent(&self, parent: &Weak<SceneItem>) {
        *self.parent.borrow_mut() = parent.clone();
        self.segments().set_parent(parent);
    }
}

impl Disposable for Curve3D {
    fn dispose(&self) {
        self.segments().dispose();
        self.clear_points();
    }
}

impl CloneNode for Curve3D {
    fn shallow_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(Curve3D {
            simple_name: self.simple_name,
            segments: RefCell::new(Handle::new(self.segments().shallow_clone(registry)?)),
            points: RefCell::new(self.points()),
            fragment: RefCell::new(None),
            parent: RefCell::new(Weak::new()),
        })
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        let segments = source.segments().deep_clone(registry)?;
        *target.segments.borrow_mut() = segments;
        let fragment = source.fragment_info().deep_clone(registry)?;
        *target.fragment.borrow_mut() = fragment;
        let parent = source.parent.borrow().clone();
        *target.parent.borrow_mut() = remap_weak(&parent, registry)?;
        Ok(())
    }
}

/// Body of a surface instance
pub struct Surface {
    simple_name: SimpleName,
    batch: Arc<MeshBatch>,
}

/// Body of a planar region instance
pub struct Region {
    simple_name: SimpleName,
    batch: Arc<MeshBatch>,
}

macro_rules! mesh_body {
    ($ty:ident) => {
        impl $ty {
            /// Wrap a tessellated mesh
            pub fn build(simple_name: SimpleName, batch: Arc<MeshBatch>) -> Handle<$ty> {
                Handle::new($ty { simple_name, batch })
            }

            /// The mesh
            pub fn batch(&self) -> &Arc<MeshBatch> {
                &self.batch
            }

            /// Name of the owning item
            pub fn simple_name(&self) -> SimpleName {
                self.simple_name
            }
        }

        impl CloneNode for $ty {
            fn shallow_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
                Ok($ty {
                    simple_name: self.simple_name,
                    batch: self.batch.clone(),
                })
            }

            fn clone_children(
                _source: &Handle<Self>,
                _target: &Handle<Self>,
                _registry: &mut CloneRegistry,
            ) -> CloneResult<()> {
                Ok(())
            }
        }
    };
}

mesh_body!(Surface);
mesh_body!(Region);

/// A B-rep solid
pub struct Solid {
    meta: ItemMeta,
    lod: Lod<SolidLevel>,
}

impl Solid {
    /// Edge group of the default level
    pub fn edges(&self) -> Option<Handle<CurveGroup>> {
        self.lod.default_level().map(|l| l.edges())
    }

    /// Face group of the default level
    pub fn faces(&self) -> Option<Handle<FaceGroup>> {
        self.lod.default_level().map(|l| l.faces())
    }

    /// Edges across every level
    pub fn all_edges(&self) -> Vec<TopologyRef> {
        self.lod
            .levels()
            .iter()
            .flat_map(|l| l.object.edges().items())
            .collect()
    }

    /// Faces across every level
    pub fn all_faces(&self) -> Vec<TopologyRef> {
        self.lod
            .levels()
            .iter()
            .flat_map(|l| l.object.faces().faces())
            .collect()
    }

    /// Faces to draw the selection outline with; empty when hidden
    pub fn outline(&self) -> Vec<TopologyRef> {
        if !self.meta.visible.get() {
            return Vec::new();
        }
        self.faces().map(|f| f.faces()).unwrap_or_default()
    }

    /// Levels of detail
    pub fn lod(&self) -> &Lod<SolidLevel> {
        &self.lod
    }
}

/// A space curve
pub struct CurveInstance {
    meta: ItemMeta,
    lod: Lod<Curve3D>,
}

impl CurveInstance {
    /// Curve body of the default level
    pub fn underlying(&self) -> Option<Handle<Curve3D>> {
        self.lod.default_level()
    }

    /// Levels of detail
    pub fn lod(&self) -> &Lod<Curve3D> {
        &self.lod
    }
}

/// A free-form surface
pub struct SurfaceInstance {
    meta: ItemMeta,
    lod: Lod<Surface>,
}

impl SurfaceInstance {
    /// Surface body of the default level
    pub fn underlying(&self) -> Option<Handle<Surface>> {
        self.lod.default_level()
    }

    /// Levels of detail
    pub fn lod(&self) -> &Lod<Surface> {
        &self.lod
    }
}

/// A planar region
pub struct RegionInstance {
    meta: ItemMeta,
    lod: Lod<Region>,
}

impl RegionInstance {
    /// Region body of the default level
    pub fn underlying(&self) -> Option<Handle<Region>> {
        self.lod.default_level()
    }

    /// Levels of detail
    pub fn lod(&self) -> &Lod<Region> {
        &self.lod
    }
}

/// Renderable mirror of one kernel item
pub enum SceneItem {
    /// B-rep solid
    Solid(Solid),
    /// Space curve
    Curve(CurveInstance),
    /// Surface
    Surface(SurfaceInstance),
    /// Planar region
    Region(RegionInstance),
}

impl SceneItem {
    pub(crate) fn empty(kind: ItemKind, simple_name: SimpleName) -> Self {
        let meta = ItemMeta::new(simple_name);
        match kind {
            ItemKind::Solid => SceneItem::Solid(Solid {
                meta,
                lod: Lod::default(),
            }),
            ItemKind::Curve => SceneItem::Curve(CurveInstance {
                meta,
                lod: Lod::default(),
            }),
            ItemKind::Surface => SceneItem::Surface(SurfaceInstance {
                meta,
                lod: Lod::default(),
            }),
            ItemKind::Region => SceneItem::Region(RegionInstance {
                meta,
                lod: Lod::default(),
            }),
        }
    }

    /// Item kind
    pub fn kind(&self) -> ItemKind {
        match self {
            SceneItem::Solid(_) => ItemKind::Solid,
            SceneItem::Curve(_) => ItemKind::Curve,
            SceneItem::Surface(_) => ItemKind::Surface,
            SceneItem::Region(_) => ItemKind::Region,
        }
    }

    /// Identity and display state
    pub fn meta(&self) -> &ItemMeta {
        match self {
            SceneItem::Solid(s) => &s.meta,
            SceneItem::Curve(c) => &c.meta,
            SceneItem::Surface(s) => &s.meta,
            SceneItem::Region(r) => &r.meta,
        }
    }

    /// Kernel-assigned name
    pub fn simple_name(&self) -> SimpleName {
        self.meta().simple_name
    }

    /// Whether the item is drawn
    pub fn is_visible(&self) -> bool {
        self.meta().visible.get()
    }

    /// Show or hide the item
    pub fn set_visible(&self, visible: bool) {
        self.meta().visible.set(visible);
    }

    /// Whether [`Disposable::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.meta().disposed.get()
    }

    /// Number of levels of detail
    pub fn level_count(&self) -> usize {
        match self {
            SceneItem::Solid(s) => s.lod.len(),
            SceneItem::Curve(c) => c.lod.len(),
            SceneItem::Surface(s) => s.lod.len(),
            SceneItem::Region(r) => r.lod.len(),
        }
    }

    /// Solid view, if this is a solid
    pub fn as_solid(&self) -> Option<&Solid> {
        match self {
            SceneItem::Solid(s) => Some(s),
            _ => None,
        }
    }

    /// Curve view, if this is a curve
    pub fn as_curve(&self) -> Option<&CurveInstance> {
        match self {
            SceneItem::Curve(c) => Some(c),
            _ => None,
        }
    }

    /// Surface view, if this is a surface
    pub fn as_surface(&self) -> Option<&SurfaceInstance> {
        match self {
            SceneItem::Surface(s) => Some(s),
            _ => None,
        }
    }

    /// Region view, if this is a region
    pub fn as_region(&self) -> Option<&RegionInstance> {
        match self {
            SceneItem::Region(r) => Some(r),
            _ => None,
        }
    }

    /// Every topology item across all levels
    ///
    /// Control points are not included since they are derived on demand.
    pub fn topology(&self) -> Vec<TopologyRef> {
        match self {
            SceneItem::Solid(s) => {
                let mut items = s.all_faces();
                items.extend(s.all_edges());
                items
            }
            SceneItem::Curve(c) => c
                .lod
                .levels()
                .iter()
                .flat_map(|l| l.object.segments().items())
                .collect(),
            SceneItem::Surface(_) | SceneItem::Region(_) => Vec::new(),
        }
    }

    /// Point every topology item of every level back at `this`
    pub(crate) fn attach(this: &ItemRef) {
        let parent = this.downgrade();
        match &**this {
            SceneItem::Solid(s) => {
                for level in s.lod.levels() {
                    level.object.edges().set_parent(&parent);
                    level.object.faces().set_parent(&parent);
                }
            }
            SceneItem::Curve(c) => {
                for level in c.lod.levels() {
                    level.object.set_parent(&parent);
                }
            }
            SceneItem::Surface(_) | SceneItem::Region(_) => {}
        }
    }
}

impl std::fmt::Debug for SceneItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneItem")
            .field("kind", &self.kind())
            .field("simple_name", &self.simple_name())
            .field("levels", &self.level_count())
            .finish()
    }
}

impl Disposable for SceneItem {
    fn dispose(&self) {
        match self {
            SceneItem::Solid(s) => {
                for level in s.lod.levels() {
                    level.object.edges().dispose();
                    level.object.faces().dispose();
                }
            }
            SceneItem::Curve(c) => {
                for level in c.lod.levels() {
                    level.object.dispose();
                }
            }
            SceneItem::Surface(_) | SceneItem::Region(_) => {}
        }
        self.meta().disposed.set(true);
    }
}

impl CloneNode for SceneItem {
    fn shallow_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
        let meta = self.meta().copy();
        Ok(match self {
            SceneItem::Solid(_) => SceneItem::Solid(Solid {
                meta,
                lod: Lod::default(),
            }),
            SceneItem::Curve(_) => SceneItem::Curve(CurveInstance {
                meta,
                lod: Lod::default(),
            }),
            SceneItem::Surface(_) => SceneItem::Surface(SurfaceInstance {
                meta,
                lod: Lod::default(),
            }),
            SceneItem::Region(_) => SceneItem::Region(RegionInstance {
                meta,
                lod: Lod::default(),
            }),
        })
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        match (&**source, &**target) {
            (SceneItem::Solid(s), SceneItem::Solid(t)) => s.lod.clone_into(&t.lod, registry),
            (SceneItem::Curve(s), SceneItem::Curve(t)) => s.lod.clone_into(&t.lod, registry),
            (SceneItem::Surface(s), SceneItem::Surface(t)) => s.lod.clone_into(&t.lod, registry),
            (SceneItem::Region(s), SceneItem::Region(t)) => s.lod.clone_into(&t.lod, registry),
            _ => Err(CloneError::RegistryMismatch {
                expected: "scene item of the same kind",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialDatabase;
    use crate::view::builder::{CurveGroupBuilder, FaceGroupBuilder, SolidBuilder};
    use facet_kernel::{EdgeBuffer, FaceBuffer};

    fn triangle(index: u32) -> FaceBuffer {
        FaceBuffer {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            index,
            ..Default::default()
        }
    }

    fn segment(index: u32) -> EdgeBuffer {
        EdgeBuffer {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            index,
            ..Default::default()
        }
    }

    /// Solid with a coarse level (1 face, 1 edge) and a fine level (2 faces, 3 edges)
    fn two_level_solid(name: SimpleName) -> ItemRef {
        let materials = MaterialDatabase::default();
        let mut solid = SolidBuilder::new(name);
        for (distance, faces, edges) in [(50.0, 1, 1), (0.0, 2, 3)] {
            let mut fb = FaceGroupBuilder::new(name, materials.face());
            for i in 0..faces {
                fb.add(triangle(i));
            }
            let mut eb = CurveGroupBuilder::for_edges(name, &materials);
            for i in 0..edges {
                eb.add(segment(i));
            }
            solid.add(eb.build().unwrap(), fb.build().unwrap(), distance);
        }
        solid.build()
    }

    #[test]
    fn test_default_level_is_last() {
        let item = two_level_solid(1);
        let solid = item.as_solid().unwrap();
        assert_eq!(solid.faces().unwrap().len(), 2);
        assert_eq!(solid.edges().unwrap().len(), 3);
        assert_eq!(solid.all_faces().len(), 3);
        assert_eq!(solid.all_edges().len(), 4);
    }

    #[test]
    fn test_outline_empty_when_hidden() {
        let item = two_level_solid(1);
        assert_eq!(item.as_solid().unwrap().outline().len(), 2);
        item.set_visible(false);
        assert!(item.as_solid().unwrap().outline().is_empty());
    }

    #[test]
    fn test_level_for_distance() {
        let item = two_level_solid(1);
        let lod = item.as_solid().unwrap().lod();
        let far = lod.level_for_distance(100.0).unwrap();
        let near = lod.level_for_distance(1.0).unwrap();
        assert_eq!(far.faces().len(), 1);
        assert_eq!(near.faces().len(), 2);
    }

    #[test]
    fn test_topology_points_at_item() {
        let item = two_level_solid(4);
        for topo in item.topology() {
            let parent = topo.parent_item().unwrap();
            assert!(Handle::ptr_eq(&parent, &item));
        }
    }

    #[test]
    fn test_clone_solid() {
        let item = two_level_solid(4);
        let mut registry = CloneRegistry::new();
        let copy = item.deep_clone(&mut registry).unwrap();

        assert!(!Handle::ptr_eq(&item, &copy));
        assert_eq!(copy.simple_name(), 4);
        assert_eq!(copy.level_count(), 2);

        let original_faces = item.as_solid().unwrap().all_faces();
        let copied_faces = copy.as_solid().unwrap().all_faces();
        assert_eq!(original_faces.len(), copied_faces.len());
        for (a, b) in original_faces.iter().zip(&copied_faces) {
            assert_eq!(a.identity(), b.identity());
            assert!(!Handle::ptr_eq(a, b));
            assert!(a.batch().ptr_eq(b.batch()));
            let parent = b.parent_item().unwrap();
            assert!(Handle::ptr_eq(&parent, &copy));
        }
    }

    #[test]
    fn test_clone_solid_level_groups_registered() {
        let item = two_level_solid(4);
        let faces = item.as_solid().unwrap().faces().unwrap();
        let edges = item.as_solid().unwrap().edges().unwrap();
        let mut registry = CloneRegistry::new();
        let copy = item.deep_clone(&mut registry).unwrap();

        let copied_faces = copy.as_solid().unwrap().faces().unwrap();
        let copied_edges = copy.as_solid().unwrap().edges().unwrap();
        let registered_faces: Handle<FaceGroup> = registry.lookup(faces.addr()).unwrap().unwrap();
        let registered_edges: Handle<CurveGroup> = registry.lookup(edges.addr()).unwrap().unwrap();
        assert!(Handle::ptr_eq(&copied_faces, &registered_faces));
        assert!(Handle::ptr_eq(&copied_edges, &registered_edges));
        assert_eq!(copied_faces.len(), 2);
        assert_eq!(copied_edges.len(), 3);
    }

    #[test]
    fn test_clone_preserves_visibility() {
        let item = two_level_solid(4);
        item.set_visible(false);
        let copy = item.deep_clone(&mut CloneRegistry::new()).unwrap();
        assert!(!copy.is_visible());
    }

    #[test]
    fn test_dispose_solid() {
        let item = two_level_solid(2);
        item.dispose();
        assert!(item.is_disposed());
        assert!(item.topology().is_empty());
    }
}
