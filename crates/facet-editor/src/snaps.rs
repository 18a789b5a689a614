//! Snap points
//!
//! Snaps are immutable once created and shared by reference; snapshots hold
//! the same [`SnapRef`]s as the live manager.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use facet_core::{CloneRegistry, CloneResult, DeepClone, ItemRef, SceneItem, SimpleName};
use glam::Vec3;

use crate::memento::SnapMemento;

/// A point the cursor can snap to
#[derive(Debug, Clone, PartialEq)]
pub struct Snap {
    /// Display name
    pub name: String,
    /// World position
    pub position: Vec3,
}

/// Shared handle to a [`Snap`], compared by identity
#[derive(Debug, Clone)]
pub struct SnapRef(Rc<Snap>);

impl SnapRef {
    /// Wrap a snap
    pub fn new(snap: Snap) -> Self {
        Self(Rc::new(snap))
    }
}

impl Deref for SnapRef {
    type Target = Snap;

    fn deref(&self) -> &Snap {
        &self.0
    }
}

impl PartialEq for SnapRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SnapRef {}

impl Hash for SnapRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl DeepClone for SnapRef {
    fn deep_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(self.clone())
    }
}

/// Active snap points
#[derive(Debug, Default)]
pub struct SnapManager {
    beg_points: RefCell<HashSet<SnapRef>>,
    mid_points: RefCell<HashSet<SnapRef>>,
    // Snaps derived from each curve item, dropped with the item
    curve_snaps: RefCell<HashMap<SimpleName, Vec<SnapRef>>>,
}

impl SnapManager {
    /// Create a manager with no snaps
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a begin/end point snap
    pub fn add_begin_point(&self, name: impl Into<String>, position: Vec3) -> SnapRef {
        let snap = SnapRef::new(Snap {
            name: name.into(),
            position,
        });
        self.beg_points.borrow_mut().insert(snap.clone());
        snap
    }

    /// Add a midpoint snap
    pub fn add_mid_point(&self, name: impl Into<String>, position: Vec3) -> SnapRef {
        let snap = SnapRef::new(Snap {
            name: name.into(),
            position,
        });
        self.mid_points.borrow_mut().insert(snap.clone());
        snap
    }

    /// Add end and midpoint snaps for every segment of a curve
    ///
    /// Returns the number of snaps added; items that are not curves add none.
    pub fn add_curve_snaps(&self, item: &ItemRef) -> usize {
        let Some(curve) = (match &**item {
            SceneItem::Curve(instance) => instance.underlying(),
            _ => None,
        }) else {
            return 0;
        };

        let segments = curve.segments();
        let positions = &segments.batch().positions;
        let mut added = Vec::new();
        for segment in segments.items() {
            let group = segment.group();
            if group.is_empty() {
                continue;
            }
            let (Some(first), Some(last)) = (
                positions.get(group.start as usize),
                positions.get(group.end() as usize - 1),
            ) else {
                continue;
            };
            let (first, last) = (Vec3::from(*first), Vec3::from(*last));
            added.push(self.add_begin_point(format!("{}:begin", segment.simple_name()), first));
            added.push(self.add_begin_point(format!("{}:end", segment.simple_name()), last));
            added.push(self.add_mid_point(
                format!("{}:middle", segment.simple_name()),
                first.lerp(last, 0.5),
            ));
        }

        let count = added.len();
        self.curve_snaps
            .borrow_mut()
            .entry(item.simple_name())
            .or_default()
            .extend(added);
        count
    }

    /// Drop the snaps [`add_curve_snaps`](Self::add_curve_snaps) derived from `item`
    ///
    /// Returns the number of snaps removed.
    pub fn remove_curve_snaps(&self, item: &ItemRef) -> usize {
        let Some(snaps) = self.curve_snaps.borrow_mut().remove(&item.simple_name()) else {
            return 0;
        };
        snaps.iter().filter(|snap| self.remove(snap)).count()
    }

    /// Remove a snap; returns whether it was active
    pub fn remove(&self, snap: &SnapRef) -> bool {
        let beg = self.beg_points.borrow_mut().remove(snap);
        let mid = self.mid_points.borrow_mut().remove(snap);
        beg || mid
    }

    /// Remove every snap
    pub fn clear(&self) {
        self.beg_points.borrow_mut().clear();
        self.mid_points.borrow_mut().clear();
        self.curve_snaps.borrow_mut().clear();
    }

    /// Begin/end point snaps
    pub fn beg_points(&self) -> Vec<SnapRef> {
        self.beg_points.borrow().iter().cloned().collect()
    }

    /// Midpoint snaps
    pub fn mid_points(&self) -> Vec<SnapRef> {
        self.mid_points.borrow().iter().cloned().collect()
    }

    /// Total number of snaps
    pub fn len(&self) -> usize {
        self.beg_points.borrow().len() + self.mid_points.borrow().len()
    }

    /// Check if there are no snaps
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the active snaps
    pub fn save_to_memento(&self, registry: &mut CloneRegistry) -> CloneResult<SnapMemento> {
        Ok(SnapMemento {
            beg_points: self.beg_points.borrow().deep_clone(registry)?,
            mid_points: self.mid_points.borrow().deep_clone(registry)?,
            curve_snaps: self.curve_snaps.borrow().deep_clone(registry)?,
        })
    }

    /// Replace the active snaps with a snapshot
    pub fn restore_from_memento(&self, memento: SnapMemento) {
        *self.beg_points.borrow_mut() = memento.beg_points;
        *self.mid_points.borrow_mut() = memento.mid_points;
        *self.curve_snaps.borrow_mut() = memento.curve_snaps;
    }
}
