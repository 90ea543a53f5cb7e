use super::backend::MigrationBackend;
use super::watcher::MigrationWatcher;
use crate::model::{MigrationPhase, MigrationStatus, MinionReports, ModelInfo, SerializedModel};
use facade_framework::{describe_facade, FacadeError, Presence, Resources};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// `MigrationMaster` version 3, the newest surface. All behaviour lives here.
pub struct MigrationMasterApi {
    backend: Arc<dyn MigrationBackend>,
    resources: Arc<dyn Resources>,
    presence: Arc<dyn Presence>,
}

describe_facade!(MigrationMasterApi => [
    watch,
    migration_status,
    model_info,
    set_phase,
    set_status_message,
    prechecks,
    export,
    process_relations,
    minion_reports,
    minion_report_timeout,
]);

impl MigrationMasterApi {
    /// Authorization is the caller's job; see [`super::new_facade`].
    pub fn new(
        backend: Arc<dyn MigrationBackend>,
        resources: Arc<dyn Resources>,
        presence: Arc<dyn Presence>,
    ) -> Self {
        Self {
            backend,
            resources,
            presence,
        }
    }

    /// Starts watching the migration phase and returns the watcher's resource id.
    #[instrument(skip(self))]
    pub fn watch(&self) -> String {
        let watcher = MigrationWatcher::new(self.backend.watch_phase());
        let id = self.resources.register(Arc::new(watcher));
        debug!(watcher_id = %id, "Registered migration watcher");
        id
    }

    #[instrument(skip(self))]
    pub async fn migration_status(&self) -> Result<MigrationStatus, FacadeError> {
        self.backend.migration().await
    }

    #[instrument(skip(self))]
    pub async fn model_info(&self) -> Result<ModelInfo, FacadeError> {
        self.backend.model_info().await
    }

    /// Moves the active migration to `phase`, rejecting illegal transitions.
    #[instrument(skip(self))]
    pub async fn set_phase(&self, phase: MigrationPhase) -> Result<(), FacadeError> {
        let previous = self
            .backend
            .set_phase(phase)
            .await
            .inspect_err(|err| warn!(%phase, %err, "Rejected phase change"))?;
        info!(%previous, %phase, "Migration phase changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_status_message(&self, message: &str) -> Result<(), FacadeError> {
        self.backend.set_status_message(message).await
    }

    /// Checks the model is fit to migrate: a migration is active and every agent is
    /// connected.
    #[instrument(skip(self))]
    pub async fn prechecks(&self) -> Result<(), FacadeError> {
        self.backend.migration().await?;

        let missing: Vec<String> = self
            .backend
            .agent_tags()
            .await?
            .into_iter()
            .filter(|tag| !self.presence.is_connected(tag))
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "Prechecks failed");
            return Err(FacadeError::NotSupported(format!(
                "agents not connected: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn export(&self) -> Result<SerializedModel, FacadeError> {
        let model = self.backend.export().await?;
        info!(bytes = model.bytes.len(), charms = model.charms.len(), "Exported model");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn process_relations(&self, controller_alias: &str) -> Result<(), FacadeError> {
        self.backend.process_relations(controller_alias).await
    }

    /// Report tally for the active migration's current phase.
    #[instrument(skip(self))]
    pub async fn minion_reports(&self) -> Result<MinionReports, FacadeError> {
        let status = self.backend.migration().await?;
        let (succeeded, failed) = self.backend.minion_reports().await?;

        let unknown = self
            .backend
            .agent_tags()
            .await?
            .into_iter()
            .filter(|tag| !succeeded.contains(tag) && !failed.contains(tag))
            .collect();

        Ok(MinionReports {
            migration_id: status.migration_id,
            phase: Some(status.phase),
            success_count: succeeded.len(),
            unknown,
            failed,
        })
    }

    pub fn minion_report_timeout(&self) -> Duration {
        self.backend.minion_report_timeout()
    }
}

/// `MigrationMaster` version 2: version 3 without `minion_report_timeout`.
pub struct MigrationMasterApiV2 {
    api: MigrationMasterApi,
}

describe_facade!(MigrationMasterApiV2 => [
    watch,
    migration_status,
    model_info,
    set_phase,
    set_status_message,
    prechecks,
    export,
    process_relations,
    minion_reports,
]);

impl MigrationMasterApiV2 {
    pub fn new(api: MigrationMasterApi) -> Self {
        Self { api }
    }

    pub fn watch(&self) -> String {
        self.api.watch()
    }

    pub async fn migration_status(&self) -> Result<MigrationStatus, FacadeError> {
        self.api.migration_status().await
    }

    pub async fn model_info(&self) -> Result<ModelInfo, FacadeError> {
        self.api.model_info().await
    }

    pub async fn set_phase(&self, phase: MigrationPhase) -> Result<(), FacadeError> {
        self.api.set_phase(phase).await
    }

    pub async fn set_status_message(&self, message: &str) -> Result<(), FacadeError> {
        self.api.set_status_message(message).await
    }

    pub async fn prechecks(&self) -> Result<(), FacadeError> {
        self.api.prechecks().await
    }

    pub async fn export(&self) -> Result<SerializedModel, FacadeError> {
        self.api.export().await
    }

    pub async fn process_relations(&self, controller_alias: &str) -> Result<(), FacadeError> {
        self.api.process_relations(controller_alias).await
    }

    pub async fn minion_reports(&self) -> Result<MinionReports, FacadeError> {
        self.api.minion_reports().await
    }
}

/// `MigrationMaster` version 1: version 2 without `process_relations`.
pub struct MigrationMasterApiV1 {
    v2: MigrationMasterApiV2,
}

describe_facade!(MigrationMasterApiV1 => [
    watch,
    migration_status,
    model_info,
    set_phase,
    set_status_message,
    prechecks,
    export,
    minion_reports,
]);

impl MigrationMasterApiV1 {
    pub fn new(v2: MigrationMasterApiV2) -> Self {
        Self { v2 }
    }

    pub fn watch(&self) -> String {
        self.v2.watch()
    }

    pub async fn migration_status(&self) -> Result<MigrationStatus, FacadeError> {
        self.v2.migration_status().await
    }

    pub async fn model_info(&self) -> Result<ModelInfo, FacadeError> {
        self.v2.model_info().await
    }

    pub async fn set_phase(&self, phase: MigrationPhase) -> Result<(), FacadeError> {
        self.v2.set_phase(phase).await
    }

    pub async fn set_status_message(&self, message: &str) -> Result<(), FacadeError> {
        self.v2.set_status_message(message).await
    }

    pub async fn prechecks(&self) -> Result<(), FacadeError> {
        self.v2.prechecks().await
    }

    pub async fn export(&self) -> Result<SerializedModel, FacadeError> {
        self.v2.export().await
    }

    pub async fn minion_reports(&self) -> Result<MinionReports, FacadeError> {
        self.v2.minion_reports().await
    }
}
