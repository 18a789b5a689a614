//! Shared, identity-compared handles to scene graph nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Reference-counted handle whose equality and hash follow object identity.
///
/// Two handles are equal only if they point at the same allocation, which is
/// what selection sets and the clone registry need.
pub struct Handle<T>(Rc<T>);

impl<T> Handle<T> {
    /// Allocate a new node.
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Whether two handles point at the same node.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Non-owning reference to the node.
    pub fn downgrade(&self) -> Weak<T> {
        Rc::downgrade(&self.0)
    }

    /// Upgrade a non-owning reference back into a handle.
    pub fn upgrade(weak: &Weak<T>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// Number of strong references to the node.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Address of the allocation, used as the node's identity.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_equality() {
        let a = Handle::new(1);
        let b = Handle::new(1);
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);

        let set: HashSet<_> = [a.clone(), a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_weak_round_trip() {
        let a = Handle::new("node");
        let weak = a.downgrade();
        assert!(Handle::ptr_eq(&Handle::upgrade(&weak).unwrap(), &a));
        drop(a);
        assert!(Handle::upgrade(&weak).is_none());
    }
}
