//! Facet Editor
//!
//! Command lifecycle, geometry database and undo history on top of the
//! facet view model.

pub mod commands;
pub mod db;
pub mod editor;
pub mod factory;
pub mod history;
pub mod memento;
pub mod selection;
pub mod signals;
pub mod snaps;

// Re-exports for convenience
pub use db::{DatabaseError, DatabaseResult, GeometryDatabase, Picked, TopologyIndex};
pub use editor::{Editor, EditorError, EditorOriginator, EditorResult};
pub use factory::{
    Command, Factory, FactoryContext, FactoryError, FactoryResult, FactoryState,
    TransactionOutcome,
};
pub use history::{History, HistoryEntry};
pub use memento::{
    GeometryMemento, Memento, Originator, RestoreFromMemento, SelectionMemento, SnapMemento,
};
pub use selection::Selection;
pub use signals::{ConnectionId, EditorSignals, Signal};
pub use snaps::{Snap, SnapManager, SnapRef};
