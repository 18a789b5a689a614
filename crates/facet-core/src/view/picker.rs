//! GPU picking passes
//!
//! A [`Picker`] lists what to draw into the id buffer for one object. The
//! renderer owns the actual pipelines; this only says which batch, on which
//! layer, in which order, and which ids to write.

use crate::batch::BatchRef;
use crate::identity::{ItemKind, PickId, encode_item};
use crate::view::item::{Curve3D, Region, SceneItem, Solid, Surface};
use crate::view::{Layers, Pickable, render_order};

/// Which ids a pass writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickIds {
    /// Use the batch's per-vertex pick ids
    PerVertex,
    /// Write the same id for every fragment
    Uniform(PickId),
}

/// One draw into the id buffer
#[derive(Debug, Clone)]
pub struct PickerPass {
    /// Batch to draw
    pub source: BatchRef,
    /// Layer the pass is drawn on
    pub layer: Layers,
    /// Draw order
    pub render_order: i32,
    /// Ids to write
    pub ids: PickIds,
    /// Whether the pass is depth tested (false for X-ray)
    pub depth_test: bool,
}

/// All passes needed to make one object pickable
#[derive(Debug, Clone, Default)]
pub struct Picker {
    /// Passes, in submission order
    pub passes: Vec<PickerPass>,
}

impl Picker {
    /// Check if there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    fn push(&mut self, source: BatchRef, layer: Layers, render_order: i32, ids: PickIds, x_ray: bool) {
        self.passes.push(PickerPass {
            source,
            layer,
            render_order,
            ids,
            depth_test: !x_ray,
        });
    }
}

impl Pickable for Solid {
    fn picker(&self, x_ray: bool) -> Picker {
        let mut picker = Picker::default();
        if let Some(faces) = self.faces() {
            picker.push(
                BatchRef::Mesh(faces.batch().clone()),
                Layers::Face,
                render_order::FACE,
                PickIds::PerVertex,
                x_ray,
            );
        }
        if let Some(edges) = self.edges() {
            picker.push(
                BatchRef::Lines(edges.batch().clone()),
                Layers::CurveEdge,
                render_order::CURVE_EDGE,
                PickIds::PerVertex,
                x_ray,
            );
        }
        picker
    }
}

impl Pickable for Curve3D {
    fn picker(&self, x_ray: bool) -> Picker {
        let mut picker = Picker::default();
        let id = match self.parent_item() {
            Some(parent) => encode_item(ItemKind::Curve, parent.simple_name()),
            None => PickId::NONE,
        };
        picker.push(
            BatchRef::Lines(self.segments().batch().clone()),
            Layers::Curve,
            render_order::CURVE_SEGMENT,
            PickIds::Uniform(id),
            x_ray,
        );
        let points = self.points();
        if !points.is_empty() {
            picker.push(
                BatchRef::Points(points),
                Layers::ControlPoint,
                render_order::CURVE_SEGMENT,
                PickIds::PerVertex,
                x_ray,
            );
        }
        picker
    }
}

impl Pickable for Surface {
    fn picker(&self, x_ray: bool) -> Picker {
        let mut picker = Picker::default();
        picker.push(
            BatchRef::Mesh(self.batch().clone()),
            Layers::Surface,
            render_order::FACE,
            PickIds::Uniform(encode_item(ItemKind::Surface, self.simple_name())),
            x_ray,
        );
        picker
    }
}

impl Pickable for Region {
    fn picker(&self, x_ray: bool) -> Picker {
        let mut picker = Picker::default();
        picker.push(
            BatchRef::Mesh(self.batch().clone()),
            Layers::Region,
            render_order::FACE,
            PickIds::Uniform(encode_item(ItemKind::Region, self.simple_name())),
            x_ray,
        );
        picker
    }
}

impl Pickable for SceneItem {
    fn picker(&self, x_ray: bool) -> Picker {
        match self {
            SceneItem::Solid(s) => s.picker(x_ray),
            SceneItem::Curve(c) => c.underlying().map(|u| u.picker(x_ray)).unwrap_or_default(),
            SceneItem::Surface(s) => s.underlying().map(|u| u.picker(x_ray)).unwrap_or_default(),
            SceneItem::Region(r) => r.underlying().map(|u| u.picker(x_ray)).unwrap_or_default(),
        }
    }
}
