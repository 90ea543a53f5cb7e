//! # MigrationMaster Facade
//!
//! The controller-side API that drives a model migration. It is served at three versions,
//! and shows how a facade evolves without duplicating behaviour.
//!
//! ## Version Family
//!
//! | Version | Type | Adds |
//! |---------|------|------|
//! | 1 | [`MigrationMasterApiV1`] | - |
//! | 2 | [`MigrationMasterApiV2`] | `process_relations` |
//! | 3 | [`MigrationMasterApi`] | `minion_report_timeout` |
//!
//! Only version 3 is constructed from the [`Context`]. Older versions wrap the next newer
//! one and forward exactly the methods they had when they shipped:
//!
//! ```text
//! new_facade_v1(ctx) ── wraps ──▶ new_facade_v2(ctx) ── wraps ──▶ new_facade(ctx)
//! ```
//!
//! Every version therefore shares the same permission check and backend wiring, and a
//! client denied version 3 is denied versions 1 and 2 with the same error.
//!
//! ## Structure
//!
//! - [`backend`] - [`MigrationBackend`], the durable state the facade needs
//! - [`watcher`] - [`MigrationWatcher`], the connection-scoped phase watcher
//! - [`api`] - the three facade types

pub mod api;
pub mod backend;
pub mod watcher;

pub use api::{MigrationMasterApi, MigrationMasterApiV1, MigrationMasterApiV2};
pub use backend::MigrationBackend;
pub use watcher::MigrationWatcher;

use crate::server::ModelState;
use facade_framework::{factory, Context, FacadeError, FacadeType, Registrar};
use std::sync::Arc;

pub const FACADE_NAME: &str = "MigrationMaster";

/// Registers versions 1 to 3.
pub fn register(registrar: &dyn Registrar) {
    registrar.must_register(
        FACADE_NAME,
        1,
        factory(|ctx| Ok(Box::new(new_facade_v1(ctx)?))),
        FacadeType::of::<MigrationMasterApiV1>(),
    );
    registrar.must_register(
        FACADE_NAME,
        2,
        factory(|ctx| Ok(Box::new(new_facade_v2(ctx)?))),
        FacadeType::of::<MigrationMasterApiV2>(),
    );
    registrar.must_register(
        FACADE_NAME,
        3,
        factory(|ctx| Ok(Box::new(new_facade(ctx)?))),
        FacadeType::of::<MigrationMasterApi>(),
    );
}

pub fn new_facade_v1(ctx: &dyn Context) -> Result<MigrationMasterApiV1, FacadeError> {
    Ok(MigrationMasterApiV1::new(new_facade_v2(ctx)?))
}

pub fn new_facade_v2(ctx: &dyn Context) -> Result<MigrationMasterApiV2, FacadeError> {
    Ok(MigrationMasterApiV2::new(new_facade(ctx)?))
}

/// Builds the newest version. Only controller agents may drive a migration.
pub fn new_facade(ctx: &dyn Context) -> Result<MigrationMasterApi, FacadeError> {
    if !ctx.auth().auth_controller() {
        return Err(FacadeError::PermissionDenied);
    }

    let state = ctx.state();
    let backend = state
        .downcast_ref::<ModelState>()
        .cloned()
        .ok_or_else(|| FacadeError::internal("migration master requires model state"))?;

    Ok(MigrationMasterApi::new(
        Arc::new(backend),
        ctx.resources(),
        ctx.presence(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MigrationPhase;
    use crate::server::test_model;
    use facade_framework::mock::{MockContext, RecordingRegistrar};
    use facade_framework::Resources;
    use std::time::Duration;

    fn controller(state: &ModelState) -> MockContext {
        MockContext::new()
            .as_controller()
            .with_state(Arc::new(state.clone()))
    }

    #[test]
    fn test_register_declares_three_versions() {
        let registrar = RecordingRegistrar::new();
        register(&registrar);

        let registrations = registrar.registrations();
        let versions: Vec<u32> = registrations.iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert!(registrations.iter().all(|r| r.name == FACADE_NAME));

        let v1 = &registrations[0].facade_type;
        let v2 = &registrations[1].facade_type;
        let v3 = &registrations[2].facade_type;
        assert!(!v1.has_method("process_relations"));
        assert!(v2.has_method("process_relations"));
        assert!(!v2.has_method("minion_report_timeout"));
        assert!(v3.has_method("minion_report_timeout"));
        assert_eq!(v3.methods().len(), 10);
    }

    #[test]
    fn test_factories_produce_registered_types() {
        let registrar = RecordingRegistrar::new();
        register(&registrar);
        let ctx = controller(&test_model());

        for details in registrar.registry().list_details() {
            let facade = (details.factory)(&ctx).unwrap();
            assert!(
                details.facade_type.matches(&*facade),
                "{}({}) built the wrong type",
                details.name,
                details.version
            );
        }
    }

    #[test]
    fn test_non_controller_denied_at_every_version() {
        let state = test_model();
        let client = MockContext::new()
            .as_client()
            .with_state(Arc::new(state));

        assert!(matches!(new_facade(&client), Err(FacadeError::PermissionDenied)));
        assert!(matches!(new_facade_v2(&client), Err(FacadeError::PermissionDenied)));
        assert!(matches!(new_facade_v1(&client), Err(FacadeError::PermissionDenied)));
    }

    #[test]
    fn test_foreign_state_is_internal_error() {
        let ctx = MockContext::new().as_controller();
        let err = new_facade(&ctx).err().unwrap();
        assert!(matches!(err, FacadeError::Internal(_)));
        assert_eq!(err.to_string(), "migration master requires model state");
    }

    #[tokio::test]
    async fn test_status_without_migration_is_not_found() {
        let api = new_facade(&controller(&test_model())).unwrap();
        let err = api.migration_status().await.unwrap_err();
        assert_eq!(err.to_string(), "migration not found");
    }

    #[tokio::test]
    async fn test_set_phase_follows_transition_rules() {
        let state = test_model();
        state.start_migration("controller-b");
        let api = new_facade_v1(&controller(&state)).unwrap();

        api.set_phase(MigrationPhase::Quiesce).await.unwrap();
        let err = api.set_phase(MigrationPhase::Validation).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "not supported: illegal phase change: QUIESCE -> VALIDATION"
        );
        api.set_phase(MigrationPhase::Abort).await.unwrap();

        let status = api.migration_status().await.unwrap();
        assert_eq!(status.phase, MigrationPhase::Abort);
        assert_eq!(status.target_controller, "controller-b");
    }

    #[tokio::test]
    async fn test_prechecks_require_connected_agents() {
        let state = test_model();
        state.add_agent("machine-0");
        state.add_agent("machine-1");
        state.start_migration("controller-b");

        let partial = controller(&state).with_connected(&["machine-0"]);
        let err = new_facade(&partial).unwrap().prechecks().await.unwrap_err();
        assert_eq!(err.to_string(), "not supported: agents not connected: machine-1");

        let all = controller(&state).with_connected(&["machine-0", "machine-1"]);
        new_facade(&all).unwrap().prechecks().await.unwrap();
    }

    #[tokio::test]
    async fn test_minion_reports_tally() {
        let state = test_model();
        for tag in ["machine-0", "machine-1", "machine-2"] {
            state.add_agent(tag);
        }
        let migration_id = state.start_migration("controller-b");
        let api = new_facade_v2(&controller(&state)).unwrap();
        api.set_phase(MigrationPhase::Quiesce).await.unwrap();

        state.report_minion("machine-0", true);
        state.report_minion("machine-2", false);

        let reports = api.minion_reports().await.unwrap();
        assert_eq!(reports.migration_id, migration_id);
        assert_eq!(reports.phase, Some(MigrationPhase::Quiesce));
        assert_eq!(reports.success_count, 1);
        assert_eq!(reports.unknown, vec!["machine-1"]);
        assert_eq!(reports.failed, vec!["machine-2"]);
    }

    #[tokio::test]
    async fn test_watch_registers_connection_resource() {
        let state = test_model();
        state.start_migration("controller-b");
        let ctx = controller(&state);
        let api = new_facade(&ctx).unwrap();

        let id = api.watch();
        let resource = ctx.resources().get(&id).unwrap();
        assert_eq!(resource.kind(), "migration-watcher");

        let watcher = resource.downcast_ref::<MigrationWatcher>().unwrap();
        assert_eq!(watcher.next().await, Some(MigrationPhase::None));
        api.set_phase(MigrationPhase::Quiesce).await.unwrap();
        assert_eq!(watcher.next().await, Some(MigrationPhase::Quiesce));

        ctx.resources().stop(&id);
        assert_eq!(watcher.next().await, None);
        assert_eq!(ctx.mock_resources().count(), 0);
    }

    #[tokio::test]
    async fn test_newest_version_only_extras() {
        let state = test_model();
        state.set_minion_report_timeout(Duration::from_secs(90));
        state.start_migration("controller-b");
        let api = new_facade(&controller(&state)).unwrap();

        assert_eq!(api.minion_report_timeout(), Duration::from_secs(90));
        api.process_relations("prod").await.unwrap();
        assert_eq!(state.processed_relations().as_deref(), Some("prod"));
    }
}
