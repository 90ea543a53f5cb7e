//! Durable state the migration master facades need.
//!
//! The server's model state implements this; unit tests can plug in anything else.

use crate::model::{MigrationPhase, MigrationStatus, ModelInfo, SerializedModel};
use async_trait::async_trait;
use facade_framework::FacadeError;
use std::time::Duration;
use tokio::sync::watch;

#[async_trait]
pub trait MigrationBackend: Send + Sync {
    async fn model_info(&self) -> Result<ModelInfo, FacadeError>;

    /// The active migration; [`FacadeError::NotFound`] when there is none.
    async fn migration(&self) -> Result<MigrationStatus, FacadeError>;

    /// Moves the migration to `phase` and returns the phase it replaced. The transition
    /// is checked and applied atomically; an illegal one fails with
    /// [`FacadeError::NotSupported`] and changes nothing.
    async fn set_phase(&self, phase: MigrationPhase) -> Result<MigrationPhase, FacadeError>;

    async fn set_status_message(&self, message: &str) -> Result<(), FacadeError>;

    /// Tags of every agent in the model, sorted.
    async fn agent_tags(&self) -> Result<Vec<String>, FacadeError>;

    /// `(succeeded, failed)` agent tags for the current phase.
    async fn minion_reports(&self) -> Result<(Vec<String>, Vec<String>), FacadeError>;

    async fn export(&self) -> Result<SerializedModel, FacadeError>;

    async fn process_relations(&self, controller_alias: &str) -> Result<(), FacadeError>;

    fn minion_report_timeout(&self) -> Duration;

    /// Phase changes, starting from the current phase.
    fn watch_phase(&self) -> watch::Receiver<MigrationPhase>;
}
