//! Geometry kernel trait definitions
//!
//! These traits define the interface that all geometry kernels must implement.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffers::ItemBuffers;

/// Type of a top-level kernel item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    /// Closed or open B-rep solid
    Solid,
    /// Space curve
    Curve,
    /// Free-form surface
    Surface,
    /// Planar region
    Region,
}

/// Error type for kernel operations
#[derive(Debug, Clone, Error)]
pub enum KernelError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Foreign item: {0}")]
    ForeignItem(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Opaque handle to an item owned by the kernel
///
/// Handles are immutable values: kernel operations return new handles rather
/// than mutating existing ones, so cloning a handle only bumps a refcount.
#[derive(Clone)]
pub struct KernelItem {
    item_type: ItemType,
    data: Arc<dyn Any + Send + Sync>,
}

impl KernelItem {
    /// Wrap kernel-specific data in a handle
    pub fn new<T: Any + Send + Sync>(item_type: ItemType, data: T) -> Self {
        Self {
            item_type,
            data: Arc::new(data),
        }
    }

    /// Get the item type
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Downcast to the kernel's own representation
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Check whether two handles refer to the same kernel item
    pub fn ptr_eq(a: &KernelItem, b: &KernelItem) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }
}

impl fmt::Debug for KernelItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelItem")
            .field("item_type", &self.item_type)
            .field("data", &Arc::as_ptr(&self.data))
            .finish()
    }
}

/// The main geometry kernel trait
///
/// Implementations of this trait perform the actual modeling math. The editor
/// only ever creates items, transforms them, and asks for tessellations.
#[async_trait]
pub trait GeometryKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Create a sphere solid
    async fn create_sphere(&self, center: Vec3, radius: f32) -> KernelResult<KernelItem>;

    /// Create an axis-aligned box solid
    async fn create_box(&self, center: Vec3, size: Vec3) -> KernelResult<KernelItem>;

    /// Create a polyline space curve
    ///
    /// # Arguments
    /// * `points` - Control points, in order
    /// * `closed` - Whether the last point connects back to the first
    async fn create_polyline(&self, points: &[Vec3], closed: bool) -> KernelResult<KernelItem>;

    /// Create a planar region bounded by a convex outline
    async fn create_region(&self, outline: &[Vec3]) -> KernelResult<KernelItem>;

    /// Create a bilinear surface patch through four corners
    async fn create_surface(&self, corners: [Vec3; 4]) -> KernelResult<KernelItem>;

    /// Duplicate an item with an affine transform applied
    async fn transform(&self, item: &KernelItem, matrix: Mat4) -> KernelResult<KernelItem>;

    /// Tessellate an item into per-element buffers
    ///
    /// # Arguments
    /// * `item` - The item to tessellate
    /// * `tolerance` - Chord tolerance (lower = more triangles)
    async fn tessellate(&self, item: &KernelItem, tolerance: f32) -> KernelResult<ItemBuffers>;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> KernelResult<T> {
        Err(KernelError::KernelNotAvailable(
            "No geometry kernel available".into(),
        ))
    }
}

#[async_trait]
impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn create_sphere(&self, _center: Vec3, _radius: f32) -> KernelResult<KernelItem> {
        Self::unavailable()
    }

    async fn create_box(&self, _center: Vec3, _size: Vec3) -> KernelResult<KernelItem> {
        Self::unavailable()
    }

    async fn create_polyline(&self, _points: &[Vec3], _closed: bool) -> KernelResult<KernelItem> {
        Self::unavailable()
    }

    async fn create_region(&self, _outline: &[Vec3]) -> KernelResult<KernelItem> {
        Self::unavailable()
    }

    async fn create_surface(&self, _corners: [Vec3; 4]) -> KernelResult<KernelItem> {
        Self::unavailable()
    }

    async fn transform(&self, _item: &KernelItem, _matrix: Mat4) -> KernelResult<KernelItem> {
        Self::unavailable()
    }

    async fn tessellate(&self, _item: &KernelItem, _tolerance: f32) -> KernelResult<ItemBuffers> {
        Self::unavailable()
    }
}

/// Get the default kernel
pub fn default_kernel() -> Arc<dyn GeometryKernel> {
    Arc::new(crate::primitive::PrimitiveKernel::new())
}
