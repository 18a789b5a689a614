//! Deep-clone engine
//!
//! Snapshots of the scene graph are produced by [`DeepClone`]. A single
//! [`CloneRegistry`] is threaded through one snapshot operation and maps each
//! source node to its clone, so a node reachable along several paths is cloned
//! once, and back-references resolve to the clone of their target instead of
//! recursing forever.
//!
//! Node types opt in through [`CloneNode`]; the blanket impl for
//! [`Handle`] does the lookup/register dance:
//!
//! 1. return the registered clone if the source was already visited
//! 2. otherwise build a shallow clone and register it
//! 3. then clone children into it
//!
//! Step 2 happens before step 3, which is what makes cycles terminate.

use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Weak;

use facet_kernel::KernelItem;
use thiserror::Error;

use crate::handle::Handle;
use crate::identity::{Identity, ItemKind, TopologyKind};
use crate::materials::MaterialRef;
use crate::refcount::RefCounter;

/// Errors raised while cloning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloneError {
    /// Value kind the engine does not know how to clone
    #[error("Unsupported deep clone: {0}")]
    Unsupported(String),

    /// A registry entry holds a clone of a different type than requested
    #[error("Registry type mismatch: expected {expected}")]
    RegistryMismatch {
        /// Requested type
        expected: &'static str,
    },
}

/// Result type for clone operations
pub type CloneResult<T> = Result<T, CloneError>;

/// Source identity → clone map, scoped to one clone operation
#[derive(Default)]
pub struct CloneRegistry {
    clones: HashMap<usize, Box<dyn Any>>,
}

impl CloneRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone previously registered for the node at `source`
    pub fn lookup<T: Clone + 'static>(&self, source: usize) -> CloneResult<Option<T>> {
        match self.clones.get(&source) {
            None => Ok(None),
            Some(entry) => entry
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or(CloneError::RegistryMismatch {
                    expected: type_name::<T>(),
                }),
        }
    }

    /// Record the clone of the node at `source`
    pub fn register<T: 'static>(&mut self, source: usize, clone: T) {
        self.clones.insert(source, Box::new(clone));
    }

    /// Number of registered clones
    pub fn len(&self) -> usize {
        self.clones.len()
    }

    /// Check if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}

/// Deep, sharing-preserving clone
pub trait DeepClone: Sized {
    /// Clone `self`, consulting and updating `registry`
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self>;
}

/// A scene graph node reachable through a [`Handle`]
pub trait CloneNode: Sized + 'static {
    /// Copy of the node without the children that may point back at it
    ///
    /// May clone owned components that never reference this node.
    fn shallow_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self>;

    /// Clone the children of `source` into `target`, which is already registered
    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()>;
}

impl<T: CloneNode> DeepClone for Handle<T> {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        if let Some(existing) = registry.lookup::<Handle<T>>(self.addr())? {
            return Ok(existing);
        }
        let target = Handle::new(self.shallow_clone(registry)?);
        registry.register(self.addr(), target.clone());
        T::clone_children(self, &target, registry)?;
        Ok(target)
    }
}

/// Map a back-reference to the clone of its target
///
/// Dangling references stay dangling.
pub fn remap_weak<T: CloneNode>(
    weak: &Weak<T>,
    registry: &mut CloneRegistry,
) -> CloneResult<Weak<T>> {
    match Handle::upgrade(weak) {
        Some(source) => Ok(source.deep_clone(registry)?.downgrade()),
        None => Ok(Weak::new()),
    }
}

macro_rules! impl_deep_clone_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeepClone for $ty {
                fn deep_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
                    Ok(self.clone())
                }
            }
        )*
    };
}

impl_deep_clone_by_value!(
    bool,
    u32,
    u64,
    usize,
    i32,
    i64,
    f32,
    f64,
    String,
    Identity,
    TopologyKind,
    ItemKind,
    KernelItem,
    MaterialRef,
);

impl<T: DeepClone> DeepClone for Vec<T> {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        self.iter().map(|v| v.deep_clone(registry)).collect()
    }
}

impl<T: DeepClone> DeepClone for Option<T> {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        self.as_ref().map(|v| v.deep_clone(registry)).transpose()
    }
}

impl<T: DeepClone + Eq + Hash> DeepClone for HashSet<T> {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        self.iter().map(|v| v.deep_clone(registry)).collect()
    }
}

impl<K: DeepClone + Eq + Hash, V: DeepClone> DeepClone for HashMap<K, V> {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        self.iter()
            .map(|(k, v)| Ok((k.deep_clone(registry)?, v.deep_clone(registry)?)))
            .collect()
    }
}

impl<K: DeepClone + Eq + Hash> DeepClone for RefCounter<K> {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        let counts = self
            .iter()
            .map(|(k, &count)| Ok((k.deep_clone(registry)?, count)))
            .collect::<CloneResult<Vec<_>>>()?;
        Ok(RefCounter::from_counts(counts))
    }
}
