use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Phases a model migration moves through, in order.
///
/// Forward transitions follow the declaration order. Any phase before `SuccessCommit` may
/// also move to `Abort`, and `Abort` may only move to `AbortDone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationPhase {
    None,
    Quiesce,
    Import,
    ProcessRelations,
    Validation,
    SuccessCommit,
    LogTransfer,
    Reap,
    Done,
    Abort,
    AbortDone,
}

impl MigrationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, MigrationPhase::Done | MigrationPhase::AbortDone)
    }

    pub fn can_transition_to(self, next: MigrationPhase) -> bool {
        use MigrationPhase as P;
        match (self, next) {
            (P::Abort, P::AbortDone) => true,
            (P::Abort | P::Done | P::AbortDone, _) => false,
            (current, P::Abort) => current < P::SuccessCommit,
            (current, next) => next != P::AbortDone && next as u8 == current as u8 + 1,
        }
    }
}

impl Display for MigrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MigrationPhase::None => "NONE",
            MigrationPhase::Quiesce => "QUIESCE",
            MigrationPhase::Import => "IMPORT",
            MigrationPhase::ProcessRelations => "PROCESSRELATIONS",
            MigrationPhase::Validation => "VALIDATION",
            MigrationPhase::SuccessCommit => "SUCCESS",
            MigrationPhase::LogTransfer => "LOGTRANSFER",
            MigrationPhase::Reap => "REAP",
            MigrationPhase::Done => "DONE",
            MigrationPhase::Abort => "ABORT",
            MigrationPhase::AbortDone => "ABORTDONE",
        };
        f.write_str(name)
    }
}

/// Static description of the model being served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub uuid: String,
    pub name: String,
    pub owner_tag: String,
    pub agent_version: String,
}

/// Snapshot of the model's active migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub migration_id: String,
    pub phase: MigrationPhase,
    pub target_controller: String,
    pub status_message: String,
}

/// Which agents have confirmed the current phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinionReports {
    pub migration_id: String,
    pub phase: Option<MigrationPhase>,
    pub success_count: usize,
    /// Agents that have not reported for this phase yet.
    pub unknown: Vec<String>,
    pub failed: Vec<String>,
}

/// The exported model, ready to ship to the target controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedModel {
    pub bytes: Vec<u8>,
    pub charms: Vec<String>,
}
