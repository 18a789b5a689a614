//! Snapshots of editor state
//!
//! A [`Memento`] is produced by one deep clone over the geometry database,
//! the selection and the snaps, sharing a single registry so that an item
//! selected in the snapshot is the same object as the item in the snapshot's
//! scene. Once built a memento is never mutated; restoring re-clones it.

use std::collections::{HashMap, HashSet};

use facet_core::{
    CloneRegistry, CloneResult, DeepClone, Handle, ItemRef, RefCounter, Scene, SimpleName,
    TopologyRef,
};
use facet_kernel::KernelItem;

use crate::db::TopologyIndex;
use crate::snaps::SnapRef;

/// Geometry database contents
pub struct GeometryMemento {
    /// Live scene items
    pub draw_model: HashSet<ItemRef>,
    /// Kernel item behind each scene item
    pub geometry_model: HashMap<SimpleName, KernelItem>,
    /// Scene container
    pub scene: Handle<Scene>,
    /// Topology identity index
    pub topology: TopologyIndex,
}

impl DeepClone for GeometryMemento {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(Self {
            draw_model: self.draw_model.deep_clone(registry)?,
            geometry_model: self.geometry_model.deep_clone(registry)?,
            scene: self.scene.deep_clone(registry)?,
            topology: self.topology.deep_clone(registry)?,
        })
    }
}

/// Selection contents
pub struct SelectionMemento {
    /// Selected solids
    pub solids: HashSet<ItemRef>,
    /// Items with selected faces or edges, counted per selected child
    pub children: RefCounter<ItemRef>,
    /// Selected edges
    pub edges: HashSet<TopologyRef>,
    /// Selected faces
    pub faces: HashSet<TopologyRef>,
    /// Selected curves
    pub curves: HashSet<ItemRef>,
}

impl DeepClone for SelectionMemento {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(Self {
            solids: self.solids.deep_clone(registry)?,
            children: self.children.deep_clone(registry)?,
            edges: self.edges.deep_clone(registry)?,
            faces: self.faces.deep_clone(registry)?,
            curves: self.curves.deep_clone(registry)?,
        })
    }
}

/// Active snap points; snaps are shared, never copied
pub struct SnapMemento {
    /// Begin points
    pub beg_points: HashSet<SnapRef>,
    /// Midpoints
    pub mid_points: HashSet<SnapRef>,
    /// Snaps derived from each curve item
    pub curve_snaps: HashMap<SimpleName, Vec<SnapRef>>,
}

impl DeepClone for SnapMemento {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(Self {
            beg_points: self.beg_points.deep_clone(registry)?,
            mid_points: self.mid_points.deep_clone(registry)?,
            curve_snaps: self.curve_snaps.deep_clone(registry)?,
        })
    }
}

/// Complete editor snapshot
pub struct Memento {
    /// Geometry database
    pub db: GeometryMemento,
    /// Selection
    pub selection: SelectionMemento,
    /// Snaps
    pub snaps: SnapMemento,
}

impl DeepClone for Memento {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        // Database first so the selection resolves to items of the cloned scene
        Ok(Self {
            db: self.db.deep_clone(registry)?,
            selection: self.selection.deep_clone(registry)?,
            snaps: self.snaps.deep_clone(registry)?,
        })
    }
}

/// Something that can be put back into the state a memento describes
pub trait RestoreFromMemento {
    /// Restore from `memento`, leaving the memento itself untouched
    fn restore_from_memento(&self, memento: &Memento) -> CloneResult<()>;
}

/// Something that can snapshot itself and be restored later
pub trait Originator: RestoreFromMemento {
    /// Take a snapshot of the current state
    fn save_to_memento(&self) -> CloneResult<Memento>;
}
