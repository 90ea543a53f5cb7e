//! Concrete capabilities behind the [`Context`] a factory receives.

use super::state::ModelState;
use facade_framework::{
    Authorizer, Context, Permission, Presence, Resource, Resources, StateAccess,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// What kind of entity authenticated the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Client,
    Controller,
    MachineAgent,
}

/// An authenticated connection's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub tag: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Session {
    pub fn client(tag: impl Into<String>, permissions: &[Permission]) -> Self {
        Self {
            tag: tag.into(),
            role: Role::Client,
            permissions: permissions.to_vec(),
        }
    }

    /// Controllers carry every permission on the models they host.
    pub fn controller(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: Role::Controller,
            permissions: vec![Permission::Read, Permission::Write, Permission::Admin],
        }
    }

    pub fn machine_agent(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: Role::MachineAgent,
            permissions: Vec::new(),
        }
    }

    /// Agents, unlike user clients, are tracked for presence.
    pub fn is_agent(&self) -> bool {
        self.role != Role::Client
    }
}

impl Authorizer for Session {
    fn auth_tag(&self) -> &str {
        &self.tag
    }

    fn auth_client(&self) -> bool {
        self.role == Role::Client
    }

    fn auth_controller(&self) -> bool {
        self.role == Role::Controller
    }

    fn auth_machine_agent(&self) -> bool {
        self.role == Role::MachineAgent
    }

    fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Per-connection resource store. Ids are `"1"`, `"2"`, ... and never reused.
#[derive(Default)]
pub struct ResourceStore {
    next_id: Mutex<u64>,
    resources: RwLock<BTreeMap<String, Arc<dyn Resource>>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops every resource and empties the store.
    pub fn stop_all(&self) {
        let drained = std::mem::take(&mut *self.resources.write());
        for (id, resource) in drained {
            debug!(%id, kind = resource.kind(), "Stopping resource");
            resource.stop();
        }
    }
}

impl Resources for ResourceStore {
    fn register(&self, resource: Arc<dyn Resource>) -> String {
        let id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            next_id.to_string()
        };
        debug!(%id, kind = resource.kind(), "Registered resource");
        self.resources.write().insert(id.clone(), resource);
        id
    }

    fn get(&self, id: &str) -> Option<Arc<dyn Resource>> {
        self.resources.read().get(id).cloned()
    }

    fn stop(&self, id: &str) {
        let removed = self.resources.write().remove(id);
        if let Some(resource) = removed {
            debug!(%id, kind = resource.kind(), "Stopping resource");
            resource.stop();
        }
    }

    fn count(&self) -> usize {
        self.resources.read().len()
    }
}

/// Tracks which agents hold a live connection.
///
/// An agent may hold several connections at once; it stays present until the last
/// one is closed.
#[derive(Default)]
pub struct PresenceRecorder {
    connections: RwLock<BTreeMap<String, usize>>,
}

impl PresenceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, agent_tag: &str) {
        *self
            .connections
            .write()
            .entry(agent_tag.to_string())
            .or_insert(0) += 1;
    }

    pub fn disconnect(&self, agent_tag: &str) {
        let mut connections = self.connections.write();
        if let Some(count) = connections.get_mut(agent_tag) {
            *count -= 1;
            if *count == 0 {
                connections.remove(agent_tag);
            }
        }
    }
}

impl Presence for PresenceRecorder {
    fn is_connected(&self, agent_tag: &str) -> bool {
        self.connections.read().contains_key(agent_tag)
    }

    fn connected(&self) -> Vec<String> {
        self.connections.read().keys().cloned().collect()
    }
}

/// The [`Context`] built for each request.
pub struct RequestContext {
    id: String,
    session: Arc<Session>,
    state: ModelState,
    resources: Arc<ResourceStore>,
    presence: Arc<PresenceRecorder>,
}

impl RequestContext {
    pub fn new(
        id: impl Into<String>,
        session: Arc<Session>,
        state: ModelState,
        resources: Arc<ResourceStore>,
        presence: Arc<PresenceRecorder>,
    ) -> Self {
        Self {
            id: id.into(),
            session,
            state,
            resources,
            presence,
        }
    }
}

impl Context for RequestContext {
    fn id(&self) -> &str {
        &self.id
    }

    fn auth(&self) -> Arc<dyn Authorizer> {
        self.session.clone()
    }

    fn state(&self) -> Arc<dyn StateAccess> {
        Arc::new(self.state.clone())
    }

    fn resources(&self) -> Arc<dyn Resources> {
        self.resources.clone()
    }

    fn presence(&self) -> Arc<dyn Presence> {
        self.presence.clone()
    }
}
