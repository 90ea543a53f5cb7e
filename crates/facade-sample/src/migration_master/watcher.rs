use crate::model::MigrationPhase;
use facade_framework::Resource;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::debug;

/// Connection-scoped watcher over the model's migration phase.
///
/// The first [`next`](Self::next) returns the current phase immediately; later calls wait
/// for a change. Once stopped, or once the state goes away, `next` returns `None`.
pub struct MigrationWatcher {
    changes: Mutex<watch::Receiver<MigrationPhase>>,
    stopped: watch::Sender<bool>,
    primed: AtomicBool,
}

impl MigrationWatcher {
    pub fn new(changes: watch::Receiver<MigrationPhase>) -> Self {
        Self {
            changes: Mutex::new(changes),
            stopped: watch::Sender::new(false),
            primed: AtomicBool::new(false),
        }
    }

    pub async fn next(&self) -> Option<MigrationPhase> {
        let mut stopped = self.stopped.subscribe();
        if *stopped.borrow() {
            return None;
        }

        let mut changes = self.changes.lock().await;
        if !self.primed.swap(true, Ordering::SeqCst) {
            return Some(*changes.borrow_and_update());
        }

        tokio::select! {
            changed = changes.changed() => match changed {
                Ok(()) => Some(*changes.borrow_and_update()),
                Err(_) => None,
            },
            _ = stopped.wait_for(|stopped| *stopped) => None,
        }
    }
}

impl Resource for MigrationWatcher {
    fn kind(&self) -> &'static str {
        "migration-watcher"
    }

    fn stop(&self) {
        debug!("Stopping migration watcher");
        self.stopped.send_replace(true);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
