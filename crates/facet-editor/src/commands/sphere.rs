//! Sphere creation

use async_trait::async_trait;
use facet_core::ItemRef;
use glam::Vec3;

use crate::factory::{Command, Factory, FactoryContext, FactoryError, FactoryResult};

/// Sphere parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    /// Center point
    pub center: Vec3,
    /// Radius, must be positive
    pub radius: f32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }
}

impl SphereParams {
    fn validate(&self) -> FactoryResult<()> {
        if self.radius.is_finite() && self.radius > 0.0 {
            Ok(())
        } else {
            Err(FactoryError::InvalidParameter(format!(
                "sphere radius must be positive, got {}",
                self.radius
            )))
        }
    }
}

/// Create a sphere, previewing it on every update
#[derive(Debug, Default)]
pub struct SphereCommand {
    /// Current parameters
    pub params: SphereParams,
    preview: Option<ItemRef>,
}

impl SphereCommand {
    /// Command with the given parameters
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            params: SphereParams { center, radius },
            preview: None,
        }
    }

    /// Current preview item
    pub fn preview(&self) -> Option<&ItemRef> {
        self.preview.as_ref()
    }

    fn clear_preview(&mut self, ctx: &FactoryContext) {
        if let Some(preview) = self.preview.take() {
            ctx.db.remove_temporary(&preview);
        }
    }
}

#[async_trait(?Send)]
impl Command for SphereCommand {
    type Rollback = SphereParams;

    fn name(&self) -> &str {
        "sphere"
    }

    async fn do_update(&mut self, ctx: &FactoryContext) -> FactoryResult<()> {
        self.params.validate()?;
        let model = ctx
            .db
            .kernel()
            .create_sphere(self.params.center, self.params.radius)
            .await?;
        let preview = ctx.db.add_temporary_item(&model).await?;
        self.clear_preview(ctx);
        self.preview = Some(preview);
        Ok(())
    }

    async fn do_commit(&mut self, ctx: &FactoryContext) -> FactoryResult<Vec<ItemRef>> {
        self.clear_preview(ctx);
        self.params.validate()?;
        let model = ctx
            .db
            .kernel()
            .create_sphere(self.params.center, self.params.radius)
            .await?;
        let item = ctx.db.add_item(model).await?;
        Ok(vec![item])
    }

    fn do_cancel(&mut self, ctx: &FactoryContext) {
        self.clear_preview(ctx);
    }

    fn rollback_record(&self) -> SphereParams {
        self.params
    }

    fn restore(&mut self, record: SphereParams) {
        self.params = record;
    }
}

/// Factory for [`SphereCommand`]
pub type SphereFactory = Factory<SphereCommand>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::tests::context;
    use crate::factory::{FactoryState, TransactionOutcome};

    fn block<F: std::future::Future>(f: F) -> F::Output {
        pollster::block_on(f)
    }

    #[test]
    fn test_preview_replaced_on_update() {
        let ctx = context();
        let mut factory = SphereFactory::new(ctx.clone(), SphereCommand::new(Vec3::ZERO, 1.0));

        block(factory.update()).unwrap();
        let first = factory.command().preview().cloned().unwrap();
        factory.command_mut().params.radius = 2.0;
        block(factory.update()).unwrap();
        let second = factory.command().preview().cloned().unwrap();

        assert!(first.is_disposed());
        assert!(!second.is_disposed());
        assert_eq!(ctx.db.temporaries().len(), 1);
        assert!(ctx.db.scene().is_empty());
    }

    #[test]
    fn test_commit_adds_item() {
        let ctx = context();
        let mut factory = SphereFactory::new(ctx.clone(), SphereCommand::new(Vec3::X, 0.5));
        block(factory.update()).unwrap();

        let items = block(factory.commit()).unwrap();
        assert_eq!(items.len(), 1);
        assert!(ctx.db.contains(&items[0]));
        assert!(ctx.db.temporaries().is_empty());
    }

    #[test]
    fn test_cancel_removes_preview() {
        let ctx = context();
        let mut factory = SphereFactory::new(ctx.clone(), SphereCommand::default());
        block(factory.update()).unwrap();
        let preview = factory.command().preview().cloned().unwrap();

        factory.cancel().unwrap();
        assert!(preview.is_disposed());
        assert!(ctx.db.temporaries().is_empty());
        assert!(ctx.db.items().is_empty());
    }

    #[test]
    fn test_bad_radius_fails_update() {
        let mut factory = SphereFactory::new(context(), SphereCommand::new(Vec3::ZERO, -1.0));
        assert!(matches!(
            block(factory.update()),
            Err(FactoryError::InvalidParameter(_))
        ));
        assert_eq!(factory.state(), FactoryState::Failed);
    }

    #[test]
    fn test_radius_transaction() {
        let mut factory = SphereFactory::new(context(), SphereCommand::default());
        let _ = factory.transaction(|c| {
            c.params.radius = 3.0;
            c.params.validate()
        });
        let outcome = factory.transaction(|c| {
            c.params.radius = 0.0;
            c.params.validate()
        });
        assert!(matches!(
            outcome,
            TransactionOutcome::RolledBack { restored: true, .. }
        ));
        assert_eq!(factory.command().params.radius, 3.0);
    }
}
