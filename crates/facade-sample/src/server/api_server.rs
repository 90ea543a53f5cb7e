use super::config::ServerConfig;
use super::context::{PresenceRecorder, RequestContext, ResourceStore, Session};
use super::router::{DispatchError, Router};
use super::state::ModelState;
use crate::model::ModelInfo;
use crate::{block, migration_master};
use facade_framework::{Description, Facade, Registrar, Registry};
use std::any::Any;
use std::sync::Arc;
use tracing::{info, warn};

/// Registers every service module this server ships.
pub fn register_all(registrar: &dyn Registrar) {
    block::register(registrar);
    migration_master::register(registrar);
}

/// Owns the registry and the model, and hands out connections.
pub struct ApiServer {
    registry: Arc<Registry>,
    router: Router,
    state: ModelState,
    presence: Arc<PresenceRecorder>,
}

impl ApiServer {
    pub fn new(config: &ServerConfig) -> Self {
        let registry = Arc::new(Registry::new());
        register_all(registry.as_ref());
        disable(&registry, config);

        let state = ModelState::new(ModelInfo {
            uuid: config.model_uuid.clone(),
            name: config.model_name.clone(),
            owner_tag: config.owner_tag.clone(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
        });
        info!(
            model = %config.model_uuid,
            facades = registry.len(),
            "API server ready"
        );

        Self {
            router: Router::new(Arc::clone(&registry)),
            registry,
            state,
            presence: Arc::new(PresenceRecorder::new()),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn presence(&self) -> &Arc<PresenceRecorder> {
        &self.presence
    }

    /// Every served facade and its versions, sorted; what clients see at login.
    pub fn list_facades(&self) -> Vec<Description> {
        self.registry.list()
    }

    /// Opens a connection for an authenticated session. Agent sessions are recorded as
    /// present until the connection is dropped.
    pub fn connect(&self, session: Session) -> Connection {
        if session.is_agent() {
            self.presence.connect(&session.tag);
        }
        info!(tag = %session.tag, role = ?session.role, "Connection opened");
        Connection {
            session: Arc::new(session),
            router: self.router.clone(),
            state: self.state.clone(),
            resources: Arc::new(ResourceStore::new()),
            presence: Arc::clone(&self.presence),
        }
    }
}

/// Discards every registered key the configuration disables.
fn disable(registry: &Registry, config: &ServerConfig) {
    let registered: Vec<(String, u32)> = registry
        .list()
        .into_iter()
        .flat_map(|Description { name, versions }| {
            versions.into_iter().map(move |v| (name.clone(), v))
        })
        .collect();

    for (name, version) in &registered {
        if config.is_disabled(name, *version) {
            registry.discard(name, *version);
        }
    }
    for facade in &config.disabled_facades {
        if !registered.iter().any(|(name, version)| facade.matches(name, *version)) {
            warn!(facade = %facade, "Disabled facade is not registered");
        }
    }
}

/// One client connection: a session plus the resources it has accumulated.
///
/// Dropping the connection stops every resource it registered.
pub struct Connection {
    session: Arc<Session>,
    router: Router,
    state: ModelState,
    resources: Arc<ResourceStore>,
    presence: Arc<PresenceRecorder>,
}

impl Connection {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn resources(&self) -> &Arc<ResourceStore> {
        &self.resources
    }

    /// A fresh construction context for one request addressed at object `id`.
    pub fn context(&self, id: &str) -> RequestContext {
        RequestContext::new(
            id,
            Arc::clone(&self.session),
            self.state.clone(),
            Arc::clone(&self.resources),
            Arc::clone(&self.presence),
        )
    }

    pub fn dispatch(
        &self,
        name: &str,
        version: u32,
        id: &str,
    ) -> Result<Box<dyn Facade>, DispatchError> {
        self.router.dispatch(name, version, &self.context(id))
    }

    /// [`dispatch`](Self::dispatch) followed by a downcast to the facade type the caller
    /// expects at this version.
    pub fn facade<T: Any>(&self, name: &str, version: u32) -> Result<Box<T>, DispatchError> {
        self.dispatch(name, version, "")?
            .downcast::<T>()
            .map_err(|_| DispatchError::TypeMismatch {
                name: name.to_string(),
                version,
                expected: std::any::type_name::<T>(),
            })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.resources.stop_all();
        if self.session.is_agent() {
            self.presence.disconnect(&self.session.tag);
        }
        info!(tag = %self.session.tag, "Connection closed");
    }
}
