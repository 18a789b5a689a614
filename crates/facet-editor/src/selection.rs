//! Selection state
//!
//! Whole items (solids, curves) and topology items (faces, edges) are
//! selected independently. An item with selected faces or edges is tracked
//! in a reference-counted set so it can be highlighted as "partially
//! selected" until its last child is deselected.

use std::cell::RefCell;
use std::collections::HashSet;

use facet_core::{
    CloneRegistry, CloneResult, DeepClone, Handle, ItemKind, ItemRef, RefCounter, TopologyKind,
    TopologyRef,
};

use crate::memento::SelectionMemento;

/// Current selection
#[derive(Debug, Default)]
pub struct Selection {
    solids: RefCell<HashSet<ItemRef>>,
    children: RefCell<RefCounter<ItemRef>>,
    edges: RefCell<HashSet<TopologyRef>>,
    faces: RefCell<HashSet<TopologyRef>>,
    curves: RefCell<HashSet<ItemRef>>,
}

impl Selection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a solid or curve
    ///
    /// Returns `false` if the item was already selected or is of a kind that
    /// is not selected as a whole.
    pub fn select_item(&self, item: &ItemRef) -> bool {
        match item.kind() {
            ItemKind::Solid => self.solids.borrow_mut().insert(item.clone()),
            ItemKind::Curve => self.curves.borrow_mut().insert(item.clone()),
            ItemKind::Surface | ItemKind::Region => false,
        }
    }

    /// Deselect a solid or curve
    pub fn deselect_item(&self, item: &ItemRef) -> bool {
        match item.kind() {
            ItemKind::Solid => self.solids.borrow_mut().remove(item),
            ItemKind::Curve => self.curves.borrow_mut().remove(item),
            ItemKind::Surface | ItemKind::Region => false,
        }
    }

    /// Select a face or edge
    ///
    /// Returns `false` if it was already selected, is some other kind of
    /// topology, or no longer has a parent item.
    pub fn select_topology(&self, topology: &TopologyRef) -> bool {
        let Some(parent) = topology.parent_item() else {
            return false;
        };
        let inserted = match topology.kind() {
            TopologyKind::Face => self.faces.borrow_mut().insert(topology.clone()),
            TopologyKind::Edge => self.edges.borrow_mut().insert(topology.clone()),
            TopologyKind::CurveSegment | TopologyKind::ControlPoint => false,
        };
        if inserted {
            self.children.borrow_mut().incr(parent);
        }
        inserted
    }

    /// Deselect a face or edge
    pub fn deselect_topology(&self, topology: &TopologyRef) -> bool {
        let removed = match topology.kind() {
            TopologyKind::Face => self.faces.borrow_mut().remove(topology),
            TopologyKind::Edge => self.edges.borrow_mut().remove(topology),
            TopologyKind::CurveSegment | TopologyKind::ControlPoint => false,
        };
        if removed && let Some(parent) = topology.parent_item() {
            self.children.borrow_mut().decr(&parent);
        }
        removed
    }

    /// Drop everything selected on or under `item`
    pub fn forget_item(&self, item: &ItemRef) {
        self.solids.borrow_mut().remove(item);
        self.curves.borrow_mut().remove(item);
        let owned_by = |t: &TopologyRef| {
            t.parent_item()
                .is_some_and(|parent| Handle::ptr_eq(&parent, item))
        };
        self.faces.borrow_mut().retain(|t| !owned_by(t));
        self.edges.borrow_mut().retain(|t| !owned_by(t));
        self.children.borrow_mut().delete(item);
    }

    /// Deselect everything
    pub fn clear(&self) {
        self.solids.borrow_mut().clear();
        self.children.borrow_mut().clear();
        self.edges.borrow_mut().clear();
        self.faces.borrow_mut().clear();
        self.curves.borrow_mut().clear();
    }

    /// Check if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.solids.borrow().is_empty()
            && self.curves.borrow().is_empty()
            && self.faces.borrow().is_empty()
            && self.edges.borrow().is_empty()
    }

    /// Selected solids
    pub fn solids(&self) -> Vec<ItemRef> {
        self.solids.borrow().iter().cloned().collect()
    }

    /// Selected curves
    pub fn curves(&self) -> Vec<ItemRef> {
        self.curves.borrow().iter().cloned().collect()
    }

    /// Selected faces
    pub fn faces(&self) -> Vec<TopologyRef> {
        self.faces.borrow().iter().cloned().collect()
    }

    /// Selected edges
    pub fn edges(&self) -> Vec<TopologyRef> {
        self.edges.borrow().iter().cloned().collect()
    }

    /// Number of selected faces and edges under `item`
    pub fn selected_children(&self, item: &ItemRef) -> usize {
        self.children.borrow().count(item)
    }

    /// Snapshot the selection
    pub fn save_to_memento(&self, registry: &mut CloneRegistry) -> CloneResult<SelectionMemento> {
        Ok(SelectionMemento {
            solids: self.solids.borrow().deep_clone(registry)?,
            children: self.children.borrow().deep_clone(registry)?,
            edges: self.edges.borrow().deep_clone(registry)?,
            faces: self.faces.borrow().deep_clone(registry)?,
            curves: self.curves.borrow().deep_clone(registry)?,
        })
    }

    /// Replace the selection with a snapshot
    pub fn restore_from_memento(&self, memento: SelectionMemento) {
        *self.solids.borrow_mut() = memento.solids;
        *self.children.borrow_mut() = memento.children;
        *self.edges.borrow_mut() = memento.edges;
        *self.faces.borrow_mut() = memento.faces;
        *self.curves.borrow_mut() = memento.curves;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_core::{MaterialDatabase, build_item};
    use facet_kernel::{EdgeBuffer, FaceBuffer, ItemBuffers};

    fn solid(name: u32) -> ItemRef {
        let faces = (0..2)
            .map(|index| FaceBuffer {
                positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                index,
                ..Default::default()
            })
            .collect();
        let edges = vec![EdgeBuffer {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            ..Default::default()
        }];
        build_item(
            name,
            vec![(ItemBuffers::Solid { faces, edges }, 0.0)],
            &MaterialDatabase::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_children_are_ref_counted() {
        let selection = Selection::new();
        let item = solid(1);
        let solid = item.as_solid().unwrap();
        let faces = solid.faces().unwrap().faces();
        let edge = solid.edges().unwrap().get(0).unwrap();

        assert!(selection.select_topology(&faces[0]));
        assert!(selection.select_topology(&faces[1]));
        assert!(!selection.select_topology(&faces[1]));
        assert!(selection.select_topology(&edge));
        assert_eq!(selection.selected_children(&item), 3);

        assert!(selection.deselect_topology(&faces[0]));
        assert!(selection.deselect_topology(&edge));
        assert_eq!(selection.selected_children(&item), 1);
        assert!(selection.deselect_topology(&faces[1]));
        assert_eq!(selection.selected_children(&item), 0);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_forget_item() {
        let selection = Selection::new();
        let a = solid(1);
        let b = solid(2);
        selection.select_item(&a);
        selection.select_topology(&a.as_solid().unwrap().faces().unwrap().faces()[0]);
        selection.select_topology(&b.as_solid().unwrap().faces().unwrap().faces()[0]);

        selection.forget_item(&a);
        assert!(selection.solids().is_empty());
        assert_eq!(selection.faces().len(), 1);
        assert_eq!(selection.selected_children(&a), 0);
        assert_eq!(selection.selected_children(&b), 1);
    }

    #[test]
    fn test_snapshot_maps_children_to_cloned_parents() {
        let selection = Selection::new();
        let item = solid(4);
        let face = item.as_solid().unwrap().faces().unwrap().faces()[0].clone();
        selection.select_item(&item);
        selection.select_topology(&face);

        let mut registry = CloneRegistry::new();
        let memento = selection.save_to_memento(&mut registry).unwrap();

        let cloned_item = memento.solids.iter().next().unwrap().clone();
        let cloned_face = memento.faces.iter().next().unwrap().clone();
        assert!(!Handle::ptr_eq(&cloned_item, &item));
        assert!(Handle::ptr_eq(&cloned_face.parent_item().unwrap(), &cloned_item));
        assert_eq!(memento.children.count(&cloned_item), 1);
        assert_eq!(memento.children.count(&item), 0);
    }
}
