//! Geometry database
//!
//! Owns every committed item: the kernel item, its scene mirror, and the
//! index from topology identity back to the mirrored face or edge.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use facet_core::{
    BuildError, CloneRegistry, CloneResult, DeepClone, Disposable, Handle, Identity, ItemRef,
    LodConfig, MaterialDatabase, PickId, PickTarget, Scene, SceneItem, SimpleName, TopologyRef,
    build_item, decode,
};
use facet_kernel::{GeometryKernel, KernelError, KernelItem};
use thiserror::Error;
use tracing::{debug, info};

use crate::memento::GeometryMemento;
use crate::signals::EditorSignals;

/// Errors raised by the geometry database
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    #[error("Stale reference to item {0}")]
    StaleReference(SimpleName),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Topology identity → topology item of the default level
#[derive(Debug, Clone, Default)]
pub struct TopologyIndex {
    items: HashMap<Identity, TopologyRef>,
}

impl TopologyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the default-level faces, edges and curve segments of `item`
    pub fn insert_item(&mut self, item: &SceneItem) {
        for topology in default_topology(item) {
            self.items.insert(topology.identity(), topology);
        }
    }

    /// Drop every entry owned by the item named `parent`
    pub fn evict(&mut self, parent: SimpleName) -> usize {
        let before = self.items.len();
        self.items.retain(|identity, _| identity.parent != parent);
        before - self.items.len()
    }

    /// Topology item with the given identity
    pub fn get(&self, identity: &Identity) -> Option<TopologyRef> {
        self.items.get(identity).cloned()
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl DeepClone for TopologyIndex {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(Self {
            items: self.items.deep_clone(registry)?,
        })
    }
}

fn default_topology(item: &SceneItem) -> Vec<TopologyRef> {
    match item {
        SceneItem::Solid(solid) => {
            let mut items = solid.faces().map(|f| f.faces()).unwrap_or_default();
            items.extend(solid.edges().map(|e| e.items()).unwrap_or_default());
            items
        }
        SceneItem::Curve(curve) => curve
            .underlying()
            .map(|c| c.segments().items())
            .unwrap_or_default(),
        SceneItem::Surface(_) | SceneItem::Region(_) => Vec::new(),
    }
}

/// What a pick id resolved to
#[derive(Debug, Clone)]
pub enum Picked {
    /// A face, edge or curve segment
    Topology(TopologyRef),
    /// A whole item
    Item(ItemRef),
}

/// Store of committed geometry
pub struct GeometryDatabase {
    kernel: Arc<dyn GeometryKernel>,
    materials: Rc<MaterialDatabase>,
    signals: Rc<EditorSignals>,
    lod: Vec<LodConfig>,
    next_name: Cell<SimpleName>,
    free_names: RefCell<Vec<SimpleName>>,
    draw_model: RefCell<HashSet<ItemRef>>,
    geometry_model: RefCell<HashMap<SimpleName, KernelItem>>,
    scene: Handle<Scene>,
    topology: RefCell<TopologyIndex>,
    temporaries: RefCell<HashSet<ItemRef>>,
}

impl GeometryDatabase {
    /// Create an empty database
    ///
    /// # Arguments
    /// * `kernel` - Kernel used to tessellate items
    /// * `materials` - Materials for the built view model
    /// * `signals` - Signals raised on add and remove
    /// * `lod` - Tessellation levels, coarsest first
    pub fn new(
        kernel: Arc<dyn GeometryKernel>,
        materials: Rc<MaterialDatabase>,
        signals: Rc<EditorSignals>,
        lod: Vec<LodConfig>,
    ) -> Self {
        Self {
            kernel,
            materials,
            signals,
            lod,
            next_name: Cell::new(1),
            free_names: RefCell::new(Vec::new()),
            draw_model: RefCell::new(HashSet::new()),
            geometry_model: RefCell::new(HashMap::new()),
            scene: Scene::new(),
            topology: RefCell::new(TopologyIndex::new()),
            temporaries: RefCell::new(HashSet::new()),
        }
    }

    /// The kernel items are created with
    pub fn kernel(&self) -> &Arc<dyn GeometryKernel> {
        &self.kernel
    }

    /// The scene committed items are drawn in
    pub fn scene(&self) -> &Handle<Scene> {
        &self.scene
    }

    fn allocate_name(&self) -> SimpleName {
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        name
    }

    async fn build(&self, simple_name: SimpleName, model: &KernelItem) -> DatabaseResult<ItemRef> {
        let mut levels = Vec::with_capacity(self.lod.len());
        for level in &self.lod {
            let buffers = self.kernel.tessellate(model, level.tolerance).await?;
            levels.push((buffers, level.distance));
        }
        let item = build_item(simple_name, levels, &self.materials)?;
        debug!(simple_name, levels = item.level_count(), "Built view model");
        Ok(item)
    }

    /// Commit a kernel item and build its view model
    pub async fn add_item(&self, model: KernelItem) -> DatabaseResult<ItemRef> {
        let simple_name = self.allocate_name();
        let item = self.build(simple_name, &model).await?;

        self.geometry_model.borrow_mut().insert(simple_name, model);
        self.draw_model.borrow_mut().insert(item.clone());
        self.scene.add_item(item.clone());
        self.topology.borrow_mut().insert_item(&item);

        info!(simple_name, kind = ?item.kind(), "Added item");
        self.signals.object_added.dispatch(&item);
        Ok(item)
    }

    /// Build a preview item that is drawn but not committed
    ///
    /// Temporaries live outside the scene, so snapshots never capture them.
    /// Their names are recycled once the preview is removed, so a long
    /// interactive session does not use up names.
    pub async fn add_temporary_item(&self, model: &KernelItem) -> DatabaseResult<ItemRef> {
        let recycled = self.free_names.borrow_mut().pop();
        let simple_name = recycled.unwrap_or_else(|| self.allocate_name());
        match self.build(simple_name, model).await {
            Ok(item) => {
                self.temporaries.borrow_mut().insert(item.clone());
                Ok(item)
            }
            Err(e) => {
                self.free_names.borrow_mut().push(simple_name);
                Err(e)
            }
        }
    }

    /// Discard a preview item; returns whether it was a temporary
    pub fn remove_temporary(&self, item: &ItemRef) -> bool {
        let removed = self.temporaries.borrow_mut().remove(item);
        if removed {
            item.dispose();
            self.free_names.borrow_mut().push(item.simple_name());
        }
        removed
    }

    /// Preview items, for drawing
    pub fn temporaries(&self) -> Vec<ItemRef> {
        self.temporaries.borrow().iter().cloned().collect()
    }

    /// Kernel item behind a committed scene item
    pub fn lookup(&self, item: &ItemRef) -> DatabaseResult<KernelItem> {
        let name = item.simple_name();
        if !self.draw_model.borrow().contains(item) {
            return Err(DatabaseError::StaleReference(name));
        }
        self.geometry_model
            .borrow()
            .get(&name)
            .cloned()
            .ok_or(DatabaseError::StaleReference(name))
    }

    /// Remove a committed item and dispose of its view model
    pub fn remove_item(&self, item: &ItemRef) -> DatabaseResult<()> {
        let name = item.simple_name();
        if !self.draw_model.borrow_mut().remove(item) {
            return Err(DatabaseError::StaleReference(name));
        }
        self.geometry_model.borrow_mut().remove(&name);
        let evicted = self.topology.borrow_mut().evict(name);
        self.scene.remove_item(item);
        item.dispose();

        info!(simple_name = name, evicted, "Removed item");
        self.signals.object_removed.dispatch(item);
        Ok(())
    }

    /// Check if `item` is committed
    pub fn contains(&self, item: &ItemRef) -> bool {
        self.draw_model.borrow().contains(item)
    }

    /// Committed items, ordered by name
    pub fn items(&self) -> Vec<ItemRef> {
        let mut items: Vec<_> = self.draw_model.borrow().iter().cloned().collect();
        items.sort_by_key(|item| item.simple_name());
        items
    }

    /// Committed item with the given name
    pub fn item_by_name(&self, name: SimpleName) -> Option<ItemRef> {
        self.draw_model
            .borrow()
            .iter()
            .find(|item| item.simple_name() == name)
            .cloned()
    }

    /// Face, edge or curve segment with the given identity
    pub fn topology_item(&self, identity: &Identity) -> Option<TopologyRef> {
        self.topology.borrow().get(identity)
    }

    /// Resolve a pick id read back from the id buffer
    pub fn resolve(&self, id: PickId) -> Option<Picked> {
        match decode(id)? {
            PickTarget::Topology(identity) => self.topology_item(&identity).map(Picked::Topology),
            PickTarget::Item { parent, .. } => self.item_by_name(parent).map(Picked::Item),
        }
    }

    /// Snapshot the database contents
    pub fn save_to_memento(&self, registry: &mut CloneRegistry) -> CloneResult<GeometryMemento> {
        Ok(GeometryMemento {
            draw_model: self.draw_model.borrow().deep_clone(registry)?,
            geometry_model: self.geometry_model.borrow().deep_clone(registry)?,
            scene: self.scene.deep_clone(registry)?,
            topology: self.topology.borrow().deep_clone(registry)?,
        })
    }

    /// Replace the database contents with a snapshot taken over by the database
    ///
    /// Items that are live now but absent from the snapshot are disposed.
    pub fn restore_from_memento(&self, memento: GeometryMemento) {
        let GeometryMemento {
            draw_model,
            geometry_model,
            scene,
            topology,
        } = memento;

        let previous = std::mem::replace(&mut *self.draw_model.borrow_mut(), draw_model);
        for item in previous {
            if !self.draw_model.borrow().contains(&item) {
                item.dispose();
            }
        }
        *self.geometry_model.borrow_mut() = geometry_model;
        self.scene.replace_children(scene.children());
        *self.topology.borrow_mut() = topology;
        debug!(items = self.draw_model.borrow().len(), "Restored geometry");
    }
}
