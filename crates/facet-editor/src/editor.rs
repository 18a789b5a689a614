//! Editor shell
//!
//! Wires the database, selection, snaps and history together and runs
//! commands so that every commit gets an undo entry.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use facet_core::{
    CloneError, CloneRegistry, CloneResult, DeepClone, EditorConfig, ItemRef, MaterialDatabase,
};
use facet_kernel::GeometryKernel;
use thiserror::Error;
use tracing::info;

use crate::db::GeometryDatabase;
use crate::factory::{Command, Factory, FactoryContext, FactoryError};
use crate::history::History;
use crate::memento::{Memento, Originator, RestoreFromMemento};
use crate::selection::Selection;
use crate::signals::EditorSignals;
use crate::snaps::SnapManager;

/// Errors raised by the editor shell
#[derive(Debug, Clone, Error)]
pub enum EditorError {
    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error("Snapshot failed: {0}")]
    Clone(#[from] CloneError),
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

/// Snapshots and restores the database, selection and snaps together
pub struct EditorOriginator {
    db: Rc<GeometryDatabase>,
    selection: Rc<Selection>,
    snaps: Rc<SnapManager>,
}

impl EditorOriginator {
    /// Originator over the given state
    pub fn new(db: Rc<GeometryDatabase>, selection: Rc<Selection>, snaps: Rc<SnapManager>) -> Self {
        Self {
            db,
            selection,
            snaps,
        }
    }
}

impl Originator for EditorOriginator {
    fn save_to_memento(&self) -> CloneResult<Memento> {
        // One registry, database first, so selected items are scene items
        let mut registry = CloneRegistry::new();
        Ok(Memento {
            db: self.db.save_to_memento(&mut registry)?,
            selection: self.selection.save_to_memento(&mut registry)?,
            snaps: self.snaps.save_to_memento(&mut registry)?,
        })
    }
}

impl RestoreFromMemento for EditorOriginator {
    fn restore_from_memento(&self, memento: &Memento) -> CloneResult<()> {
        let Memento { db, selection, snaps } = memento.deep_clone(&mut CloneRegistry::new())?;
        self.db.restore_from_memento(db);
        self.selection.restore_from_memento(selection);
        self.snaps.restore_from_memento(snaps);
        Ok(())
    }
}

/// The editor
pub struct Editor {
    config: EditorConfig,
    signals: Rc<EditorSignals>,
    materials: Rc<MaterialDatabase>,
    db: Rc<GeometryDatabase>,
    selection: Rc<Selection>,
    snaps: Rc<SnapManager>,
    originator: EditorOriginator,
    history: RefCell<History>,
}

impl Editor {
    /// Create an editor with an empty document
    pub fn new(config: EditorConfig, kernel: Arc<dyn GeometryKernel>) -> Self {
        let signals = Rc::new(EditorSignals::new());
        let materials = Rc::new(MaterialDatabase::new(&config.materials));
        let db = Rc::new(GeometryDatabase::new(
            kernel,
            materials.clone(),
            signals.clone(),
            config.lod.clone(),
        ));
        let selection = Rc::new(Selection::new());
        let snaps = Rc::new(SnapManager::new());

        let weak_selection = Rc::downgrade(&selection);
        signals.object_removed.connect(move |item| {
            if let Some(selection) = weak_selection.upgrade() {
                selection.forget_item(item);
            }
        });
        let weak_snaps = Rc::downgrade(&snaps);
        signals.object_added.connect(move |item| {
            if let Some(snaps) = weak_snaps.upgrade() {
                snaps.add_curve_snaps(item);
            }
        });
        let weak_snaps = Rc::downgrade(&snaps);
        signals.object_removed.connect(move |item| {
            if let Some(snaps) = weak_snaps.upgrade() {
                snaps.remove_curve_snaps(item);
            }
        });

        let originator = EditorOriginator::new(db.clone(), selection.clone(), snaps.clone());
        let history = RefCell::new(History::new(config.history.max_entries, signals.clone()));

        info!(
            kernel = db.kernel().name(),
            lod_levels = config.lod.len(),
            "Editor ready"
        );

        Self {
            config,
            signals,
            materials,
            db,
            selection,
            snaps,
            originator,
            history,
        }
    }

    /// Configuration the editor was created with
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Editor signals
    pub fn signals(&self) -> &Rc<EditorSignals> {
        &self.signals
    }

    /// Materials
    pub fn materials(&self) -> &Rc<MaterialDatabase> {
        &self.materials
    }

    /// Geometry database
    pub fn db(&self) -> &Rc<GeometryDatabase> {
        &self.db
    }

    /// Current selection
    pub fn selection(&self) -> &Rc<Selection> {
        &self.selection
    }

    /// Snap points
    pub fn snaps(&self) -> &Rc<SnapManager> {
        &self.snaps
    }

    /// Snapshot/restore collaborator
    pub fn originator(&self) -> &EditorOriginator {
        &self.originator
    }

    /// Undo history
    pub fn history(&self) -> Ref<'_, History> {
        self.history.borrow()
    }

    /// Collaborators for a new factory
    pub fn context(&self) -> FactoryContext {
        FactoryContext::new(self.db.clone(), self.materials.clone(), self.signals.clone())
    }

    /// Wrap a command in a factory bound to this editor
    pub fn factory<C: Command>(&self, command: C) -> Factory<C> {
        Factory::new(self.context(), command)
    }

    /// Commit a factory and record an undo entry for it
    ///
    /// The snapshot is taken first; if it fails the factory is left untouched.
    pub async fn execute<C: Command>(&self, factory: &mut Factory<C>) -> EditorResult<Vec<ItemRef>> {
        let before = self.originator.save_to_memento()?;
        let label = factory.command().name().to_string();
        let items = factory.commit().await?;

        let mut history = self.history.borrow_mut();
        history.record(label, before);
        history.clear_redo();
        Ok(items)
    }

    /// Undo the last change; `false` if there was none
    pub fn undo(&self) -> EditorResult<bool> {
        Ok(self.history.borrow_mut().undo(&self.originator)?)
    }

    /// Redo the last undone change; `false` if there was none
    pub fn redo(&self) -> EditorResult<bool> {
        Ok(self.history.borrow_mut().redo(&self.originator)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use facet_core::{ForeignNode, Handle, SceneNode};
    use facet_kernel::PrimitiveKernel;
    use glam::Vec3;

    use crate::commands::{MirrorCommand, SphereCommand};
    use crate::db::DatabaseError;

    fn editor() -> Editor {
        Editor::new(EditorConfig::default(), Arc::new(PrimitiveKernel::new()))
    }

    fn block<F: std::future::Future>(f: F) -> F::Output {
        pollster::block_on(f)
    }

    fn add_sphere(editor: &Editor, radius: f32) -> ItemRef {
        let mut factory = editor.factory(SphereCommand::new(Vec3::ZERO, radius));
        block(factory.update()).unwrap();
        block(editor.execute(&mut factory)).unwrap().remove(0)
    }

    fn add_curve(editor: &Editor) -> ItemRef {
        let points = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)];
        let model = block(editor.db().kernel().create_polyline(&points, false)).unwrap();
        block(editor.db().add_item(model)).unwrap()
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let editor = editor();
        let sphere = add_sphere(&editor, 1.0);
        assert_eq!(editor.db().items().len(), 1);

        assert!(editor.undo().unwrap());
        assert!(editor.db().items().is_empty());
        assert!(editor.db().scene().is_empty());
        assert!(!editor.history().can_undo());

        assert!(editor.redo().unwrap());
        let items = editor.db().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].simple_name(), sphere.simple_name());
        assert!(editor.db().lookup(&items[0]).is_ok());

        assert!(editor.undo().unwrap());
        assert!(editor.db().items().is_empty());
        assert!(editor.redo().unwrap());
        assert_eq!(editor.db().items().len(), 1);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let editor = editor();
        let changed = Rc::new(Cell::new(0));
        let c = changed.clone();
        editor.signals().history_changed.connect(move |_| c.set(c.get() + 1));

        assert!(!editor.undo().unwrap());
        assert!(!editor.redo().unwrap());
        assert_eq!(changed.get(), 0);
        assert!(editor.db().items().is_empty());
    }

    #[test]
    fn test_history_changed_signal() {
        let editor = editor();
        let changed = Rc::new(Cell::new(0));
        let c = changed.clone();
        editor.signals().history_changed.connect(move |_| c.set(c.get() + 1));

        add_sphere(&editor, 1.0);
        editor.undo().unwrap();
        editor.redo().unwrap();
        assert_eq!(changed.get(), 2);
    }

    #[test]
    fn test_undo_mirror_restores_original() {
        let editor = editor();
        let curve = add_curve(&editor);
        editor.selection().select_item(&curve);

        let mut factory = editor.factory(MirrorCommand::new(curve.clone(), Vec3::ZERO, Vec3::Y));
        block(factory.update()).unwrap();
        let mirrored = block(editor.execute(&mut factory)).unwrap().remove(0);
        assert!(editor.selection().curves().is_empty());
        assert!(matches!(
            editor.db().lookup(&curve),
            Err(DatabaseError::StaleReference(_))
        ));

        editor.undo().unwrap();
        assert!(mirrored.is_disposed());
        let items = editor.db().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].simple_name(), curve.simple_name());

        let selected = editor.selection().curves();
        assert_eq!(selected.len(), 1);
        assert!(Handle::ptr_eq(&selected[0], &items[0]));
    }

    #[test]
    fn test_snapshot_shares_selected_faces() {
        let editor = editor();
        let sphere = add_sphere(&editor, 1.0);
        let face = sphere.as_solid().unwrap().faces().unwrap().get(0).unwrap();
        editor.selection().select_topology(&face);

        let memento = editor.originator().save_to_memento().unwrap();
        let item = memento.db.draw_model.iter().next().unwrap().clone();
        let selected = memento.selection.faces.iter().next().unwrap().clone();

        assert!(!Handle::ptr_eq(&item, &sphere));
        assert!(Handle::ptr_eq(&selected.parent_item().unwrap(), &item));
        assert!(Handle::ptr_eq(
            &memento.db.topology.get(&face.identity()).unwrap(),
            &selected
        ));
        assert_eq!(memento.selection.children.count(&item), 1);
    }

    #[test]
    fn test_restore_leaves_memento_intact() {
        let editor = editor();
        add_sphere(&editor, 1.0);
        let memento = editor.originator().save_to_memento().unwrap();
        let snapshot_item = memento.db.draw_model.iter().next().unwrap().clone();

        editor.originator().restore_from_memento(&memento).unwrap();
        editor.originator().restore_from_memento(&memento).unwrap();

        assert!(!snapshot_item.is_disposed());
        let live = editor.db().items();
        assert_eq!(live.len(), 1);
        assert!(!Handle::ptr_eq(&live[0], &snapshot_item));
    }

    #[test]
    fn test_curve_snaps_follow_history() {
        let editor = editor();
        let curve = add_curve(&editor);
        assert_eq!(editor.snaps().len(), 6);

        let mut factory = editor.factory(SphereCommand::new(Vec3::ZERO, 1.0));
        block(editor.execute(&mut factory)).unwrap();
        editor.snaps().clear();
        editor.undo().unwrap();
        assert_eq!(editor.snaps().len(), 6);
        assert!(editor.db().item_by_name(curve.simple_name()).is_some());
    }

    #[test]
    fn test_curve_snaps_leave_with_their_item() {
        let editor = editor();
        let curve = add_curve(&editor);
        let other = add_curve(&editor);
        assert_eq!(editor.snaps().len(), 12);

        editor.db().remove_item(&curve).unwrap();
        assert_eq!(editor.snaps().len(), 6);
        let names: Vec<String> = editor
            .snaps()
            .beg_points()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert!(names.iter().all(|n| n.contains(&format!(",{},", other.simple_name()))));
    }

    #[test]
    fn test_mirrored_curve_replaces_snaps() {
        let editor = editor();
        let curve = add_curve(&editor);
        let before: Vec<_> = editor.snaps().beg_points();

        let mut factory = editor.factory(MirrorCommand::new(curve, Vec3::ZERO, Vec3::Y));
        block(editor.execute(&mut factory)).unwrap();
        assert_eq!(editor.snaps().len(), 6);
        assert!(editor.snaps().beg_points().iter().all(|s| !before.contains(s)));

        editor.undo().unwrap();
        assert_eq!(editor.snaps().len(), 6);
        assert!(editor.snaps().beg_points().iter().all(|s| before.contains(s)));
    }

    #[test]
    fn test_history_cap() {
        let mut config = EditorConfig::default();
        config.history.max_entries = Some(2);
        let editor = Editor::new(config, Arc::new(PrimitiveKernel::new()));

        for radius in [1.0, 2.0, 3.0] {
            add_sphere(&editor, radius);
        }
        assert_eq!(editor.history().undo_labels(), vec!["sphere", "sphere"]);
        assert!(editor.undo().unwrap());
        assert!(editor.undo().unwrap());
        assert!(!editor.undo().unwrap());
        assert_eq!(editor.db().items().len(), 1);
    }

    #[test]
    fn test_new_change_clears_redo() {
        let editor = editor();
        add_sphere(&editor, 1.0);
        editor.undo().unwrap();
        assert!(editor.history().can_redo());
        add_sphere(&editor, 2.0);
        assert!(!editor.history().can_redo());
    }

    #[test]
    fn test_foreign_scene_node_blocks_execute() {
        let editor = editor();
        editor.db().scene().add(SceneNode::Foreign(ForeignNode {
            type_name: "Gizmo".into(),
        }));

        let mut factory = editor.factory(SphereCommand::new(Vec3::ZERO, 1.0));
        let result = block(editor.execute(&mut factory));
        assert!(matches!(
            result,
            Err(EditorError::Clone(CloneError::Unsupported(_)))
        ));
        assert_eq!(factory.state(), crate::factory::FactoryState::None);
        assert!(editor.db().items().is_empty());
    }
}
