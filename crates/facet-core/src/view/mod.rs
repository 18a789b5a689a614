//! Renderable mirror of the kernel's B-rep topology
//!
//! The object graph looks like:
//!
//! ```text
//! Solid          -> Lod -> SolidLevel -> FaceGroup  -> Face*
//!                                    \-> CurveGroup -> Edge*
//! CurveInstance  -> Lod -> Curve3D    -> CurveGroup -> CurveSegment*
//!                                    \-> PointBatch (control points)
//! SurfaceInstance -> Lod -> Surface
//! RegionInstance  -> Lod -> Region
//! ```
//!
//! Topology items hold a weak back-reference to their scene item. Everything
//! below a scene item is owned through [`Handle`](crate::Handle)s, and draw
//! data through `Arc`-shared batches.

pub mod builder;
pub mod item;
pub mod picker;
pub mod scene;
pub mod topology;

pub use builder::{
    BuildError, ControlPointGroup, CurveGroupBuilder, CurveInstanceBuilder, FaceGroupBuilder,
    RegionInstanceBuilder, SolidBuilder, SurfaceInstanceBuilder, build_item,
};
pub use item::{
    Curve3D, CurveInstance, FragmentInfo, ItemMeta, ItemRef, Lod, LodLevel, Region,
    RegionInstance, SceneItem, Solid, SolidLevel, Surface, SurfaceInstance,
};
pub use picker::{PickIds, Picker, PickerPass};
pub use scene::{AxesHelper, ForeignNode, Scene, SceneNode};
pub use topology::{CurveGroup, FaceGroup, TopologyItem, TopologyRef};

use serde::{Deserialize, Serialize};

/// Render layers, used to filter what the picking and X-ray passes draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layers {
    /// Everything by default
    Default,
    /// Screen-space overlays
    Overlay,
    /// Viewport navigation gizmo
    ViewportGizmo,
    /// Object manipulation gizmos
    ObjectGizmo,
    /// Lines drawn through occluding geometry
    XRay,
    /// Trimmed curve fragments
    CurveFragment,
    /// Trimmed curve fragments, X-ray pass
    CurveFragmentXRay,
    /// Solids
    Solid,
    /// Curves
    Curve,
    /// Planar regions
    Region,
    /// Surfaces
    Surface,
    /// Curve control points
    ControlPoint,
    /// Solid faces
    Face,
    /// Solid edges
    CurveEdge,
    /// Never pickable
    Unselectable,
}

/// Draw order of topology batches; higher draws later
pub mod render_order {
    /// Solid faces, surfaces, regions
    pub const FACE: i32 = 10;
    /// Solid edges
    pub const CURVE_EDGE: i32 = 20;
    /// Curve segments
    pub const CURVE_SEGMENT: i32 = 20;
    /// Snap indicators near the cursor
    pub const SNAP_NEARBY_INDICATOR: i32 = 40;
}

/// Something that can be drawn into the pick buffer
pub trait Pickable {
    /// Describe the passes that write this object's pick ids
    ///
    /// `x_ray` requests the variant drawn without depth testing.
    fn picker(&self, x_ray: bool) -> Picker;
}

/// Something that holds draw resources to release
pub trait Disposable {
    /// Release draw resources; the object must not be drawn afterwards
    fn dispose(&self);
}
