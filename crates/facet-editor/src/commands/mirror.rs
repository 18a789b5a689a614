//! Mirror an item across a plane

use async_trait::async_trait;
use facet_core::ItemRef;
use glam::{Mat3, Mat4, Vec3};

use crate::factory::{Command, Factory, FactoryContext, FactoryError, FactoryResult};

/// Reflection across the plane through `origin` with normal `normal`
///
/// `normal` need not be unit length but must be non-zero.
pub fn symmetry(origin: Vec3, normal: Vec3) -> Mat4 {
    let n = normal.normalize_or_zero();
    let reflect = Mat3::IDENTITY - Mat3::from_cols(n * n.x, n * n.y, n * n.z) * 2.0;
    Mat4::from_translation(origin) * Mat4::from_mat3(reflect) * Mat4::from_translation(-origin)
}

/// Mirror parameters; the item handle is shared, not copied
#[derive(Debug, Clone)]
pub struct MirrorParams {
    /// Item to mirror
    pub item: ItemRef,
    /// Point on the mirror plane
    pub origin: Vec3,
    /// Mirror plane normal
    pub normal: Vec3,
}

/// Replace an item by its mirror image
#[derive(Debug)]
pub struct MirrorCommand {
    /// Current parameters
    pub params: MirrorParams,
}

impl MirrorCommand {
    /// Mirror `item` across the plane through `origin` with `normal`
    pub fn new(item: ItemRef, origin: Vec3, normal: Vec3) -> Self {
        Self {
            params: MirrorParams {
                item,
                origin,
                normal,
            },
        }
    }

    fn validate(&self) -> FactoryResult<()> {
        if self.params.normal.length_squared() > f32::EPSILON {
            Ok(())
        } else {
            Err(FactoryError::InvalidParameter(
                "mirror normal must be non-zero".into(),
            ))
        }
    }
}

#[async_trait(?Send)]
impl Command for MirrorCommand {
    type Rollback = MirrorParams;

    fn name(&self) -> &str {
        "mirror"
    }

    async fn do_update(&mut self, ctx: &FactoryContext) -> FactoryResult<()> {
        self.validate()?;
        ctx.db.lookup(&self.params.item)?;
        Ok(())
    }

    async fn do_commit(&mut self, ctx: &FactoryContext) -> FactoryResult<Vec<ItemRef>> {
        self.validate()?;
        let MirrorParams {
            item,
            origin,
            normal,
        } = &self.params;
        let model = ctx.db.lookup(item)?;
        let mirrored = ctx
            .db
            .kernel()
            .transform(&model, symmetry(*origin, *normal))
            .await?;
        let result = ctx.db.add_item(mirrored).await?;
        ctx.db.remove_item(item)?;
        Ok(vec![result])
    }

    fn do_cancel(&mut self, _ctx: &FactoryContext) {}

    fn rollback_record(&self) -> MirrorParams {
        self.params.clone()
    }

    fn restore(&mut self, record: MirrorParams) {
        self.params = record;
    }
}

/// Factory for [`MirrorCommand`]
pub type MirrorFactory = Factory<MirrorCommand>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseError;
    use crate::factory::tests::context;
    use approx::assert_relative_eq;
    use facet_kernel::ItemBuffers;

    fn block<F: std::future::Future>(f: F) -> F::Output {
        pollster::block_on(f)
    }

    #[test]
    fn test_symmetry() {
        let m = symmetry(Vec3::X, Vec3::new(2.0, 0.0, 0.0));
        let p = m.transform_point3(Vec3::new(3.0, 2.0, 0.0));
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-6);

        let on_plane = m.transform_point3(Vec3::new(1.0, 5.0, -3.0));
        assert_relative_eq!(on_plane.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(on_plane.z, -3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_symmetry_is_involution() {
        let m = symmetry(Vec3::new(0.5, 1.0, -2.0), Vec3::new(1.0, 1.0, 0.0));
        let p = Vec3::new(3.0, -1.0, 4.0);
        let back = (m * m).transform_point3(p);
        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-5);
    }

    #[test]
    fn test_commit_replaces_item() {
        let ctx = context();
        let points = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 0.0)];
        let model = block(ctx.db.kernel().create_polyline(&points, false)).unwrap();
        let curve = block(ctx.db.add_item(model)).unwrap();

        let mut factory =
            MirrorFactory::new(ctx.clone(), MirrorCommand::new(curve.clone(), Vec3::ZERO, Vec3::X));
        block(factory.update()).unwrap();
        let items = block(factory.commit()).unwrap();

        assert!(matches!(
            ctx.db.lookup(&curve),
            Err(DatabaseError::StaleReference(_))
        ));
        assert_eq!(ctx.db.items().len(), 1);

        let mirrored = ctx.db.lookup(&items[0]).unwrap();
        match block(ctx.db.kernel().tessellate(&mirrored, 0.1)).unwrap() {
            ItemBuffers::Curve { control_points, .. } => {
                assert_relative_eq!(control_points[0][0], -1.0, epsilon = 1e-6);
                assert_relative_eq!(control_points[1][0], -2.0, epsilon = 1e-6);
                assert_relative_eq!(control_points[1][1], 1.0, epsilon = 1e-6);
            }
            other => panic!("expected curve buffers, got {:?}", other.item_type()),
        }
    }

    #[test]
    fn test_stale_item_fails_update() {
        let ctx = context();
        let model = block(ctx.db.kernel().create_box(Vec3::ZERO, Vec3::ONE)).unwrap();
        let item = block(ctx.db.add_item(model)).unwrap();
        ctx.db.remove_item(&item).unwrap();

        let mut factory = MirrorFactory::new(ctx, MirrorCommand::new(item, Vec3::ZERO, Vec3::Z));
        assert!(matches!(
            block(factory.update()),
            Err(FactoryError::Database(DatabaseError::StaleReference(_)))
        ));
    }

    #[test]
    fn test_zero_normal_rejected() {
        let ctx = context();
        let model = block(ctx.db.kernel().create_box(Vec3::ZERO, Vec3::ONE)).unwrap();
        let item = block(ctx.db.add_item(model)).unwrap();
        let mut factory = MirrorFactory::new(ctx, MirrorCommand::new(item, Vec3::ZERO, Vec3::ZERO));
        assert!(matches!(
            block(factory.commit()),
            Err(FactoryError::InvalidParameter(_))
        ));
    }
}
