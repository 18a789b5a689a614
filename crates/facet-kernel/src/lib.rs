//! Geometry Kernel Abstraction
//!
//! This crate provides:
//! - The [`GeometryKernel`] trait the editor drives to create and tessellate items
//! - Opaque [`KernelItem`] handles owned by the kernel
//! - Raw per-element buffers emitted by tessellation
//! - [`PrimitiveKernel`], a deterministic reference kernel, and [`NullKernel`]

pub mod buffers;
pub mod primitive;
pub mod traits;

// Re-exports for convenience
pub use buffers::{EdgeBuffer, FaceBuffer, ItemBuffers, MeshBuffer};
pub use primitive::PrimitiveKernel;
pub use traits::{
    GeometryKernel, ItemType, KernelError, KernelItem, KernelResult, NullKernel, default_kernel,
};
