//! Editor signals
//!
//! Synchronous, fire-and-forget notifications. Listeners run in connection
//! order on the dispatching call stack.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use facet_core::ItemRef;

/// Handle returned by [`Signal::connect`], used to disconnect
pub type ConnectionId = u64;

type Listener<T> = Rc<dyn Fn(&T)>;

/// A list of listeners for one event
pub struct Signal<T = ()> {
    listeners: RefCell<Vec<(ConnectionId, Listener<T>)>>,
    next_id: Cell<ConnectionId>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<T> Signal<T> {
    /// Create a signal with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn connect(&self, listener: impl Fn(&T) + 'static) -> ConnectionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was connected
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(i, _)| *i != id);
        listeners.len() != before
    }

    /// Call every listener with `value`
    pub fn dispatch(&self, value: &T) {
        // Copy out so listeners may connect or disconnect while we run
        let call_list: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in call_list {
            listener(value);
        }
    }

    /// Number of connected listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Signal<()> {
    /// Dispatch a signal that carries no payload
    pub fn emit(&self) {
        self.dispatch(&());
    }
}

/// All signals the editor raises
#[derive(Default)]
pub struct EditorSignals {
    /// A factory is about to run an update
    pub factory_updated: Signal,
    /// A factory has been committed
    pub factory_committed: Signal,
    /// The undo or redo stack changed
    pub history_changed: Signal,
    /// An item entered the geometry database
    pub object_added: Signal<ItemRef>,
    /// An item left the geometry database
    pub object_removed: Signal<ItemRef>,
}

impl EditorSignals {
    /// Create a signal set with no listeners
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_in_order() {
        let signal: Signal<u32> = Signal::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = log.clone();
        signal.connect(move |v| a.borrow_mut().push(("a", *v)));
        let b = log.clone();
        signal.connect(move |v| b.borrow_mut().push(("b", *v)));

        signal.dispatch(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_disconnect() {
        let signal: Signal = Signal::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = signal.connect(move |_| c.set(c.get() + 1));

        signal.emit();
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit();

        assert_eq!(count.get(), 1);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_connect_during_dispatch() {
        let signal: Rc<Signal> = Rc::new(Signal::new());
        let inner = signal.clone();
        signal.connect(move |_| {
            inner.connect(|_| {});
        });

        signal.emit();
        assert_eq!(signal.listener_count(), 2);
    }
}
