use crate::block::BlockBackend;
use crate::migration_master::MigrationBackend;
use crate::model::{Block, BlockType, MigrationPhase, MigrationStatus, ModelInfo, SerializedModel};
use async_trait::async_trait;
use facade_framework::{FacadeError, StateAccess};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

const DEFAULT_MINION_REPORT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// In-memory durable state of one model.
///
/// Cheap to clone; clones share the same model. The phase is mirrored into a
/// `watch` channel so migration watchers see every change.
#[derive(Clone)]
pub struct ModelState {
    inner: Arc<Inner>,
}

struct Inner {
    info: ModelInfo,
    data: Mutex<ModelData>,
    phase: watch::Sender<MigrationPhase>,
}

#[derive(Default)]
struct ModelData {
    agents: BTreeSet<String>,
    charms: BTreeSet<String>,
    blocks: BTreeMap<BlockType, String>,
    migration: Option<Migration>,
    attempts: u32,
    minion_report_timeout: Option<Duration>,
}

struct Migration {
    status: MigrationStatus,
    /// Reports for the current phase only; agent tag to success.
    reports: BTreeMap<String, bool>,
    processed_relations: Option<String>,
}

/// Document produced by [`MigrationBackend::export`].
#[derive(Serialize)]
struct ExportDocument<'a> {
    model: &'a ModelInfo,
    agents: &'a BTreeSet<String>,
    charms: &'a BTreeSet<String>,
    blocks: &'a BTreeMap<BlockType, String>,
}

impl ModelState {
    pub fn new(info: ModelInfo) -> Self {
        let (phase, _) = watch::channel(MigrationPhase::None);
        Self {
            inner: Arc::new(Inner {
                info,
                data: Mutex::new(ModelData::default()),
                phase,
            }),
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.inner.info
    }

    pub fn add_agent(&self, tag: impl Into<String>) {
        self.inner.data.lock().agents.insert(tag.into());
    }

    pub fn add_charm(&self, url: impl Into<String>) {
        self.inner.data.lock().charms.insert(url.into());
    }

    pub fn set_minion_report_timeout(&self, timeout: Duration) {
        self.inner.data.lock().minion_report_timeout = Some(timeout);
    }

    /// Starts a new migration attempt towards `target_controller` and returns its id,
    /// `<model uuid>:<attempt>`. Replaces any previous migration.
    pub fn start_migration(&self, target_controller: &str) -> String {
        let mut data = self.inner.data.lock();
        data.attempts += 1;
        let migration_id = format!("{}:{}", self.inner.info.uuid, data.attempts - 1);
        data.migration = Some(Migration {
            status: MigrationStatus {
                migration_id: migration_id.clone(),
                phase: MigrationPhase::None,
                target_controller: target_controller.to_string(),
                status_message: String::new(),
            },
            reports: BTreeMap::new(),
            processed_relations: None,
        });
        drop(data);

        self.inner.phase.send_replace(MigrationPhase::None);
        info!(%migration_id, target_controller, "Migration started");
        migration_id
    }

    /// Records an agent's report for the current phase. Ignored without a migration.
    pub fn report_minion(&self, tag: &str, success: bool) {
        if let Some(migration) = self.inner.data.lock().migration.as_mut() {
            migration.reports.insert(tag.to_string(), success);
            debug!(tag, success, phase = %migration.status.phase, "Minion report");
        }
    }

    /// Controller alias the relations were last processed for.
    pub fn processed_relations(&self) -> Option<String> {
        self.inner
            .data
            .lock()
            .migration
            .as_ref()
            .and_then(|m| m.processed_relations.clone())
    }

    pub fn phase(&self) -> MigrationPhase {
        *self.inner.phase.borrow()
    }

    fn with_migration<T>(
        &self,
        f: impl FnOnce(&mut Migration) -> T,
    ) -> Result<T, FacadeError> {
        let mut data = self.inner.data.lock();
        data.migration
            .as_mut()
            .map(f)
            .ok_or_else(|| FacadeError::NotFound("migration".to_string()))
    }
}

impl StateAccess for ModelState {
    fn model_uuid(&self) -> &str {
        &self.inner.info.uuid
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl MigrationBackend for ModelState {
    async fn model_info(&self) -> Result<ModelInfo, FacadeError> {
        Ok(self.inner.info.clone())
    }

    async fn migration(&self) -> Result<MigrationStatus, FacadeError> {
        self.with_migration(|m| m.status.clone())
    }

    async fn set_phase(&self, phase: MigrationPhase) -> Result<MigrationPhase, FacadeError> {
        self.with_migration(|m| {
            let current = m.status.phase;
            if !current.can_transition_to(phase) {
                return Err(FacadeError::NotSupported(format!(
                    "illegal phase change: {current} -> {phase}"
                )));
            }
            m.status.phase = phase;
            m.reports.clear();
            self.inner.phase.send_replace(phase);
            Ok(current)
        })?
    }

    async fn set_status_message(&self, message: &str) -> Result<(), FacadeError> {
        self.with_migration(|m| m.status.status_message = message.to_string())
    }

    async fn agent_tags(&self) -> Result<Vec<String>, FacadeError> {
        Ok(self.inner.data.lock().agents.iter().cloned().collect())
    }

    async fn minion_reports(&self) -> Result<(Vec<String>, Vec<String>), FacadeError> {
        self.with_migration(|m| {
            let (succeeded, failed): (Vec<_>, Vec<_>) =
                m.reports.iter().partition(|(_, success)| **success);
            (
                succeeded.into_iter().map(|(tag, _)| tag.clone()).collect(),
                failed.into_iter().map(|(tag, _)| tag.clone()).collect(),
            )
        })
    }

    async fn export(&self) -> Result<SerializedModel, FacadeError> {
        let data = self.inner.data.lock();
        let document = ExportDocument {
            model: &self.inner.info,
            agents: &data.agents,
            charms: &data.charms,
            blocks: &data.blocks,
        };
        let bytes = serde_json::to_vec(&document).map_err(FacadeError::internal)?;
        Ok(SerializedModel {
            bytes,
            charms: data.charms.iter().cloned().collect(),
        })
    }

    async fn process_relations(&self, controller_alias: &str) -> Result<(), FacadeError> {
        self.with_migration(|m| m.processed_relations = Some(controller_alias.to_string()))
    }

    fn minion_report_timeout(&self) -> Duration {
        self.inner
            .data
            .lock()
            .minion_report_timeout
            .unwrap_or(DEFAULT_MINION_REPORT_TIMEOUT)
    }

    fn watch_phase(&self) -> watch::Receiver<MigrationPhase> {
        self.inner.phase.subscribe()
    }
}

#[async_trait]
impl BlockBackend for ModelState {
    async fn blocks(&self) -> Result<Vec<Block>, FacadeError> {
        Ok(self
            .inner
            .data
            .lock()
            .blocks
            .iter()
            .map(|(block_type, message)| Block {
                block_type: *block_type,
                message: message.clone(),
            })
            .collect())
    }

    async fn switch_on(&self, block_type: BlockType, message: &str) -> Result<(), FacadeError> {
        self.inner
            .data
            .lock()
            .blocks
            .insert(block_type, message.to_string());
        Ok(())
    }

    async fn switch_off(&self, block_type: BlockType) -> Result<bool, FacadeError> {
        Ok(self.inner.data.lock().blocks.remove(&block_type).is_some())
    }
}
