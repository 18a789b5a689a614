//! View Model and Snapshot Engine
//!
//! This crate provides:
//! - Identity encoding of topology items into names and pick ids
//! - Merged draw batches and the ranges that address them
//! - Builders that mirror kernel tessellations into a pickable scene
//! - The deep-clone registry used to snapshot the scene for undo
//! - Materials and editor configuration

pub mod batch;
pub mod clone;
pub mod config;
pub mod group;
pub mod handle;
pub mod identity;
pub mod materials;
pub mod refcount;
pub mod view;

// Re-exports for convenience
pub use batch::{BatchRef, FaceVertex, LineBatch, LineVertex, MeshBatch, PointBatch};
pub use clone::{CloneError, CloneNode, CloneRegistry, CloneResult, DeepClone, remap_weak};
pub use config::{ConfigError, EditorConfig, HistoryConfig, LodConfig};
pub use group::{GeometryGroup, compact};
pub use handle::Handle;
pub use identity::{
    Identity, IdentityError, ItemKind, PickId, PickTarget, SimpleName, TopologyKind, decode,
    encode, encode_item, try_encode, try_encode_item,
};
pub use materials::{MaterialDatabase, MaterialDef, MaterialPalette, MaterialRef};
pub use refcount::RefCounter;
pub use view::{
    AxesHelper, BuildError, Disposable, ForeignNode, ItemRef, Layers, Pickable, Picker, Scene,
    SceneItem, SceneNode, TopologyItem, TopologyRef, build_item,
};
