//! # Block Facade
//!
//! Client API for the blocks that guard a model against destructive changes. Served at
//! a single version; the factory only admits user clients, and each method then checks
//! the session's model permissions.

pub mod api;
pub mod backend;

pub use api::BlockApi;
pub use backend::BlockBackend;

use crate::server::ModelState;
use facade_framework::{factory, Context, FacadeError, FacadeType, Registrar};
use std::sync::Arc;

pub const FACADE_NAME: &str = "Block";

pub fn register(registrar: &dyn Registrar) {
    registrar.must_register(
        FACADE_NAME,
        2,
        factory(|ctx| Ok(Box::new(new_facade(ctx)?))),
        FacadeType::of::<BlockApi>(),
    );
}

pub fn new_facade(ctx: &dyn Context) -> Result<BlockApi, FacadeError> {
    let authorizer = ctx.auth();
    if !authorizer.auth_client() {
        return Err(FacadeError::PermissionDenied);
    }

    let state = ctx.state();
    let backend = state
        .downcast_ref::<ModelState>()
        .cloned()
        .ok_or_else(|| FacadeError::internal("block api requires model state"))?;

    Ok(BlockApi::new(Arc::new(backend), authorizer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockType};
    use crate::server::test_model;
    use facade_framework::mock::{MockContext, RecordingRegistrar};
    use facade_framework::Permission;

    fn client(state: &ModelState, permissions: &[Permission]) -> MockContext {
        MockContext::new()
            .as_client()
            .with_permissions(permissions)
            .with_state(Arc::new(state.clone()))
    }

    #[test]
    fn test_register_single_version() {
        let registrar = RecordingRegistrar::new();
        register(&registrar);

        let registrations = registrar.registrations();
        assert_eq!(registrations.len(), 1);
        assert_eq!((registrations[0].name.as_str(), registrations[0].version), ("Block", 2));
        assert_eq!(
            registrations[0].facade_type.methods(),
            &["list", "switch_block_on", "switch_block_off"]
        );
    }

    #[test]
    fn test_agents_are_denied() {
        let ctx = MockContext::new()
            .as_controller()
            .with_state(Arc::new(test_model()));
        assert!(matches!(new_facade(&ctx), Err(FacadeError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_switch_on_and_off() {
        let state = test_model();
        let api = new_facade(&client(&state, &[Permission::Write])).unwrap();

        api.switch_block_on(BlockType::Remove, "no removals").await.unwrap();
        api.switch_block_on(BlockType::Destroy, "keep it").await.unwrap();
        api.switch_block_on(BlockType::Remove, "still no removals").await.unwrap();

        assert_eq!(
            api.list().await.unwrap(),
            vec![
                Block {
                    block_type: BlockType::Destroy,
                    message: "keep it".to_string(),
                },
                Block {
                    block_type: BlockType::Remove,
                    message: "still no removals".to_string(),
                },
            ]
        );

        api.switch_block_off(BlockType::Destroy).await.unwrap();
        api.switch_block_off(BlockType::Change).await.unwrap();
        assert_eq!(api.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_only_client_cannot_switch() {
        let state = test_model();
        let api = new_facade(&client(&state, &[Permission::Read])).unwrap();

        assert!(api.list().await.unwrap().is_empty());
        let err = api
            .switch_block_on(BlockType::Change, "frozen")
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[tokio::test]
    async fn test_client_without_permissions_cannot_list() {
        let api = new_facade(&client(&test_model(), &[])).unwrap();
        assert!(api.list().await.unwrap_err().is_permission_denied());
    }
}
