//! Editing commands built on [`Factory`](crate::factory::Factory)

mod mirror;
mod sphere;

pub use mirror::{MirrorCommand, MirrorFactory, MirrorParams, symmetry};
pub use sphere::{SphereCommand, SphereFactory, SphereParams};
