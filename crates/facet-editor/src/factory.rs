//! Command lifecycle
//!
//! Every editing command is driven through a [`Factory`], which owns the
//! command's parameters and enforces the state machine:
//!
//! | state     | update            | commit          | cancel          |
//! |-----------|-------------------|-----------------|-----------------|
//! | none      | updated / failed  | committed       | no-op           |
//! | updated   | updated / failed  | committed       | cancelled       |
//! | failed    | updated / failed  | error           | no-op           |
//! | committed | error             | error           | error           |
//! | cancelled | error             | error           | no-op           |

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use facet_core::{ItemRef, MaterialDatabase};
use facet_kernel::KernelError;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{DatabaseError, GeometryDatabase};
use crate::signals::EditorSignals;

/// Lifecycle state of a factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactoryState {
    /// Nothing has run yet
    #[default]
    None,
    /// Last update succeeded
    Updated,
    /// Last update failed
    Failed,
    /// Cancelled after an update
    Cancelled,
    /// Committed into the database
    Committed,
}

impl fmt::Display for FactoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FactoryState::None => "none",
            FactoryState::Updated => "updated",
            FactoryState::Failed => "failed",
            FactoryState::Cancelled => "cancelled",
            FactoryState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Errors raised by factories and commands
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    #[error("Cannot {operation} in state {state}")]
    InvalidState {
        operation: &'static str,
        state: FactoryState,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
}

/// Result type for factory operations
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Collaborators every command gets at construction
#[derive(Clone)]
pub struct FactoryContext {
    /// Geometry database
    pub db: Rc<GeometryDatabase>,
    /// Materials
    pub materials: Rc<MaterialDatabase>,
    /// Editor signals
    pub signals: Rc<EditorSignals>,
}

impl FactoryContext {
    /// Bundle the collaborators
    pub fn new(
        db: Rc<GeometryDatabase>,
        materials: Rc<MaterialDatabase>,
        signals: Rc<EditorSignals>,
    ) -> Self {
        Self {
            db,
            materials,
            signals,
        }
    }
}

/// The part of an editing command a [`Factory`] drives
///
/// Implementations hold the command's parameters as plain fields. Fields that
/// callers mutate through [`Factory::transaction`] form the
/// [`Rollback`](Command::Rollback) record.
#[async_trait(?Send)]
pub trait Command {
    /// Snapshot of the mutable parameters
    type Rollback: Clone;

    /// Name used in logs and history labels
    fn name(&self) -> &str;

    /// Recompute the preview from the current parameters
    async fn do_update(&mut self, ctx: &FactoryContext) -> FactoryResult<()>;

    /// Finalize into the database, returning the committed items
    async fn do_commit(&mut self, ctx: &FactoryContext) -> FactoryResult<Vec<ItemRef>>;

    /// Discard the preview
    fn do_cancel(&mut self, ctx: &FactoryContext);

    /// Copy of the current parameters
    fn rollback_record(&self) -> Self::Rollback;

    /// Put parameters back from a copy
    fn restore(&mut self, record: Self::Rollback);
}

/// Outcome of [`Factory::transaction`]
#[must_use]
#[derive(Debug, Clone)]
pub enum TransactionOutcome {
    /// The mutation succeeded and is now the rollback point
    Applied,
    /// The mutation failed
    RolledBack {
        /// Why it failed
        error: FactoryError,
        /// Whether a previous rollback point was restored
        restored: bool,
    },
}

impl TransactionOutcome {
    /// Check if the mutation was kept
    pub fn is_applied(&self) -> bool {
        matches!(self, TransactionOutcome::Applied)
    }
}

/// State machine around one command invocation
pub struct Factory<C: Command> {
    id: Uuid,
    state: FactoryState,
    command: C,
    ctx: FactoryContext,
    previous: Option<(C::Rollback, FactoryState)>,
}

impl<C: Command> Factory<C> {
    /// Wrap a command
    pub fn new(ctx: FactoryContext, command: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: FactoryState::None,
            command,
            ctx,
            previous: None,
        }
    }

    /// Unique id of this invocation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state
    pub fn state(&self) -> FactoryState {
        self.state
    }

    /// The wrapped command
    pub fn command(&self) -> &C {
        &self.command
    }

    /// Mutable access to the wrapped command, bypassing rollback
    pub fn command_mut(&mut self) -> &mut C {
        &mut self.command
    }

    /// Collaborators shared with the command
    pub fn context(&self) -> &FactoryContext {
        &self.ctx
    }

    fn invalid(&self, operation: &'static str) -> FactoryError {
        FactoryError::InvalidState {
            operation,
            state: self.state,
        }
    }

    /// Recompute the preview
    ///
    /// On failure the factory moves to `failed` and the error is returned; the
    /// caller may change parameters and update again.
    pub async fn update(&mut self) -> FactoryResult<()> {
        match self.state {
            FactoryState::None | FactoryState::Updated | FactoryState::Failed => {
                self.ctx.signals.factory_updated.emit();
                match self.command.do_update(&self.ctx).await {
                    Ok(()) => {
                        self.state = FactoryState::Updated;
                        debug!(command = self.command.name(), id = %self.id, "Updated");
                        Ok(())
                    }
                    Err(e) => {
                        self.state = FactoryState::Failed;
                        warn!(command = self.command.name(), id = %self.id, "Update failed: {}", e);
                        Err(e)
                    }
                }
            }
            FactoryState::Committed | FactoryState::Cancelled => Err(self.invalid("update")),
        }
    }

    /// Finalize the command
    ///
    /// The factory is `committed` from here on, even if the commit itself
    /// fails; a factory is never committed twice.
    pub async fn commit(&mut self) -> FactoryResult<Vec<ItemRef>> {
        match self.state {
            FactoryState::None | FactoryState::Updated => {
                self.state = FactoryState::Committed;
                self.ctx.signals.factory_committed.emit();
                let items = self.command.do_commit(&self.ctx).await?;
                info!(
                    command = self.command.name(),
                    id = %self.id,
                    items = items.len(),
                    "Committed"
                );
                Ok(items)
            }
            FactoryState::Failed | FactoryState::Committed | FactoryState::Cancelled => {
                Err(self.invalid("commit"))
            }
        }
    }

    /// Commit if the factory has not failed or finished yet
    pub async fn finish(&mut self) -> FactoryResult<Vec<ItemRef>> {
        match self.state {
            FactoryState::None | FactoryState::Updated => self.commit().await,
            _ => Err(self.invalid("finish")),
        }
    }

    /// Discard the preview
    pub fn cancel(&mut self) -> FactoryResult<()> {
        match self.state {
            FactoryState::Updated => {
                self.command.do_cancel(&self.ctx);
                self.state = FactoryState::Cancelled;
                debug!(command = self.command.name(), id = %self.id, "Cancelled");
                Ok(())
            }
            FactoryState::None | FactoryState::Failed | FactoryState::Cancelled => Ok(()),
            FactoryState::Committed => Err(self.invalid("cancel")),
        }
    }

    /// Mutate parameters, rolling back to the last good values on failure
    ///
    /// A successful mutation becomes the new rollback point together with the
    /// current state. A failed one is logged, not propagated; the returned
    /// outcome says what happened.
    pub fn transaction<F>(&mut self, mutate: F) -> TransactionOutcome
    where
        F: FnOnce(&mut C) -> FactoryResult<()>,
    {
        match mutate(&mut self.command) {
            Ok(()) => {
                self.previous = Some((self.command.rollback_record(), self.state));
                TransactionOutcome::Applied
            }
            Err(error) => {
                warn!(command = self.command.name(), id = %self.id, "Transaction rolled back: {}", error);
                let restored = match &self.previous {
                    Some((record, state)) => {
                        self.command.restore(record.clone());
                        self.state = *state;
                        true
                    }
                    None => false,
                };
                TransactionOutcome::RolledBack { error, restored }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;

    use facet_core::EditorConfig;
    use facet_kernel::PrimitiveKernel;

    pub(crate) fn context() -> FactoryContext {
        let materials = Rc::new(MaterialDatabase::default());
        let signals = Rc::new(EditorSignals::new());
        let db = Rc::new(GeometryDatabase::new(
            Arc::new(PrimitiveKernel::new()),
            materials.clone(),
            signals.clone(),
            EditorConfig::default().lod,
        ));
        FactoryContext::new(db, materials, signals)
    }

    #[derive(Default)]
    struct Probe {
        radius: f32,
        fail_update: bool,
        updates: u32,
        commits: u32,
        cancels: u32,
    }

    #[async_trait(?Send)]
    impl Command for Probe {
        type Rollback = f32;

        fn name(&self) -> &str {
            "probe"
        }

        async fn do_update(&mut self, _ctx: &FactoryContext) -> FactoryResult<()> {
            self.updates += 1;
            if self.fail_update {
                return Err(FactoryError::InvalidParameter("probe".into()));
            }
            Ok(())
        }

        async fn do_commit(&mut self, _ctx: &FactoryContext) -> FactoryResult<Vec<ItemRef>> {
            self.commits += 1;
            Ok(Vec::new())
        }

        fn do_cancel(&mut self, _ctx: &FactoryContext) {
            self.cancels += 1;
        }

        fn rollback_record(&self) -> f32 {
            self.radius
        }

        fn restore(&mut self, record: f32) {
            self.radius = record;
        }
    }

    fn probe() -> Factory<Probe> {
        Factory::new(context(), Probe::default())
    }

    fn block<F: std::future::Future>(f: F) -> F::Output {
        pollster::block_on(f)
    }

    #[test]
    fn test_single_commit() {
        let mut factory = probe();
        block(factory.update()).unwrap();
        block(factory.commit()).unwrap();
        assert_eq!(factory.state(), FactoryState::Committed);

        let second = block(factory.commit());
        assert!(matches!(
            second,
            Err(FactoryError::InvalidState {
                operation: "commit",
                state: FactoryState::Committed
            })
        ));
        assert!(block(factory.update()).is_err());
        assert!(factory.cancel().is_err());
        assert_eq!(factory.command().commits, 1);
    }

    #[test]
    fn test_commit_from_none() {
        let mut factory = probe();
        block(factory.commit()).unwrap();
        assert_eq!(factory.state(), FactoryState::Committed);
        assert_eq!(factory.command().updates, 0);
    }

    #[test]
    fn test_failed_update_can_retry() {
        let mut factory = probe();
        factory.command_mut().fail_update = true;
        assert!(block(factory.update()).is_err());
        assert_eq!(factory.state(), FactoryState::Failed);
        assert!(block(factory.commit()).is_err());
        assert!(factory.cancel().is_ok());
        assert_eq!(factory.state(), FactoryState::Failed);

        factory.command_mut().fail_update = false;
        block(factory.update()).unwrap();
        assert_eq!(factory.state(), FactoryState::Updated);
        assert_eq!(factory.command().updates, 2);
    }

    #[test]
    fn test_cancel() {
        let mut factory = probe();
        factory.cancel().unwrap();
        assert_eq!(factory.state(), FactoryState::None);
        assert_eq!(factory.command().cancels, 0);

        block(factory.update()).unwrap();
        factory.cancel().unwrap();
        assert_eq!(factory.state(), FactoryState::Cancelled);
        assert_eq!(factory.command().cancels, 1);

        factory.cancel().unwrap();
        assert_eq!(factory.command().cancels, 1);
        assert!(block(factory.update()).is_err());
        assert!(block(factory.finish()).is_err());
    }

    #[test]
    fn test_finish() {
        let mut factory = probe();
        block(factory.update()).unwrap();
        block(factory.finish()).unwrap();
        assert_eq!(factory.state(), FactoryState::Committed);
        assert!(block(factory.finish()).is_err());
    }

    #[test]
    fn test_signals() {
        let mut factory = probe();
        let updated = Rc::new(Cell::new(0));
        let committed = Rc::new(Cell::new(0));
        let u = updated.clone();
        factory.context().signals.factory_updated.connect(move |_| u.set(u.get() + 1));
        let c = committed.clone();
        factory.context().signals.factory_committed.connect(move |_| c.set(c.get() + 1));

        block(factory.update()).unwrap();
        block(factory.update()).unwrap();
        block(factory.commit()).unwrap();
        assert_eq!(updated.get(), 2);
        assert_eq!(committed.get(), 1);
    }

    #[test]
    fn test_transaction_rollback() {
        let mut factory = probe();
        let outcome = factory.transaction(|p| {
            p.radius = 1.0;
            Ok(())
        });
        assert!(outcome.is_applied());
        block(factory.update()).unwrap();

        let outcome = factory.transaction(|p| {
            p.radius = 99.0;
            Err(FactoryError::InvalidParameter("radius".into()))
        });
        assert!(matches!(
            outcome,
            TransactionOutcome::RolledBack { restored: true, .. }
        ));
        assert_eq!(factory.command().radius, 1.0);
        assert_eq!(factory.state(), FactoryState::None);
    }

    #[test]
    fn test_transaction_without_snapshot() {
        let mut factory = probe();
        let outcome = factory.transaction(|p| {
            p.radius = 5.0;
            Err(FactoryError::InvalidParameter("radius".into()))
        });
        assert!(matches!(
            outcome,
            TransactionOutcome::RolledBack {
                restored: false,
                ..
            }
        ));
        assert_eq!(factory.command().radius, 5.0);
    }
}
