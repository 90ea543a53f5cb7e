//! # Mock Context & Testing Guide
//!
//! Factories need a [`Context`] and service modules need a [`Registrar`]. The server's real
//! implementations drag in sessions, durable state and connection bookkeeping; the doubles
//! here are in-memory and configured with a fluent builder so a test states only what it
//! cares about.
//!
//! ## When to use what
//!
//! | Double | Use it to |
//! |--------|-----------|
//! | [`MockContext`] | invoke a factory directly, choosing the caller's role, permissions, state and connected agents |
//! | [`RecordingRegistrar`] | run a service module's `register` function and assert which keys and method surfaces it declared |
//! | a real [`Registry`](crate::Registry) | test lookup, discard and enumeration behaviour |
//!
//! ## Example
//!
//! ```rust
//! use facade_framework::mock::MockContext;
//! use facade_framework::{factory, FacadeError};
//!
//! let admin_only = factory(|ctx| {
//!     if !ctx.auth().auth_controller() {
//!         return Err(FacadeError::PermissionDenied);
//!     }
//!     Ok(Box::new("allowed"))
//! });
//!
//! assert!(admin_only(&MockContext::new().as_client()).is_err());
//! assert!(admin_only(&MockContext::new().as_controller()).is_ok());
//! ```
//!
//! Downstream crates that keep their own concrete state type plug it in with
//! [`MockContext::with_state`]; factories then downcast it exactly as in production.

use crate::context::{
    Authorizer, Context, Permission, Presence, Resource, Resources, StateAccess,
};
use crate::facade::{FacadeType, Factory};
use crate::registry::{Registrar, Registry};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Role the mock session authenticates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRole {
    Anonymous,
    Client,
    Controller,
    MachineAgent,
}

/// Authorizer with a fixed role and permission set.
#[derive(Debug, Clone)]
pub struct MockAuthorizer {
    tag: String,
    role: MockRole,
    permissions: Vec<Permission>,
}

impl Authorizer for MockAuthorizer {
    fn auth_tag(&self) -> &str {
        &self.tag
    }

    fn auth_client(&self) -> bool {
        self.role == MockRole::Client
    }

    fn auth_controller(&self) -> bool {
        self.role == MockRole::Controller
    }

    fn auth_machine_agent(&self) -> bool {
        self.role == MockRole::MachineAgent
    }

    fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// State with nothing but a model uuid.
#[derive(Debug, Clone)]
pub struct MockState {
    model_uuid: String,
}

impl MockState {
    pub fn new(model_uuid: impl Into<String>) -> Self {
        Self {
            model_uuid: model_uuid.into(),
        }
    }
}

impl StateAccess for MockState {
    fn model_uuid(&self) -> &str {
        &self.model_uuid
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory resource store; ids are `"1"`, `"2"`, ... in registration order.
#[derive(Default)]
pub struct MockResources {
    inner: Mutex<(u64, BTreeMap<String, Arc<dyn Resource>>)>,
}

impl Resources for MockResources {
    fn register(&self, resource: Arc<dyn Resource>) -> String {
        let mut inner = self.inner.lock();
        inner.0 += 1;
        let id = inner.0.to_string();
        inner.1.insert(id.clone(), resource);
        id
    }

    fn get(&self, id: &str) -> Option<Arc<dyn Resource>> {
        self.inner.lock().1.get(id).cloned()
    }

    fn stop(&self, id: &str) {
        let removed = self.inner.lock().1.remove(id);
        if let Some(resource) = removed {
            resource.stop();
        }
    }

    fn count(&self) -> usize {
        self.inner.lock().1.len()
    }
}

/// Presence with a fixed set of connected agents.
#[derive(Debug, Clone, Default)]
pub struct MockPresence {
    connected: Vec<String>,
}

impl Presence for MockPresence {
    fn is_connected(&self, agent_tag: &str) -> bool {
        self.connected.iter().any(|tag| tag == agent_tag)
    }

    fn connected(&self) -> Vec<String> {
        let mut connected = self.connected.clone();
        connected.sort();
        connected
    }
}

/// A [`Context`] whose every capability is an in-memory double.
///
/// Defaults: anonymous caller, no permissions, model uuid `"deadbeef"`, nobody connected.
pub struct MockContext {
    id: String,
    auth: MockAuthorizer,
    state: Arc<dyn StateAccess>,
    resources: Arc<MockResources>,
    presence: MockPresence,
}

impl Default for MockContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContext {
    pub fn new() -> Self {
        Self {
            id: String::new(),
            auth: MockAuthorizer {
                tag: "user-anonymous".to_string(),
                role: MockRole::Anonymous,
                permissions: Vec::new(),
            },
            state: Arc::new(MockState::new("deadbeef")),
            resources: Arc::new(MockResources::default()),
            presence: MockPresence::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_role(mut self, role: MockRole, tag: impl Into<String>) -> Self {
        self.auth.role = role;
        self.auth.tag = tag.into();
        self
    }

    /// Shorthand for a `user-admin` client session.
    pub fn as_client(self) -> Self {
        self.with_role(MockRole::Client, "user-admin")
    }

    /// Shorthand for a `controller-0` agent session.
    pub fn as_controller(self) -> Self {
        self.with_role(MockRole::Controller, "controller-0")
    }

    pub fn with_permissions(mut self, permissions: &[Permission]) -> Self {
        self.auth.permissions = permissions.to_vec();
        self
    }

    pub fn with_state(mut self, state: Arc<dyn StateAccess>) -> Self {
        self.state = state;
        self
    }

    pub fn with_connected(mut self, agents: &[&str]) -> Self {
        self.presence.connected = agents.iter().map(|a| a.to_string()).collect();
        self
    }

    /// The concrete resource store, for asserting what a facade registered.
    pub fn mock_resources(&self) -> Arc<MockResources> {
        Arc::clone(&self.resources)
    }
}

impl Context for MockContext {
    fn id(&self) -> &str {
        &self.id
    }

    fn auth(&self) -> Arc<dyn Authorizer> {
        Arc::new(self.auth.clone())
    }

    fn state(&self) -> Arc<dyn StateAccess> {
        Arc::clone(&self.state)
    }

    fn resources(&self) -> Arc<dyn Resources> {
        self.resources.clone()
    }

    fn presence(&self) -> Arc<dyn Presence> {
        Arc::new(self.presence.clone())
    }
}

/// One call observed by a [`RecordingRegistrar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub version: u32,
    pub facade_type: FacadeType,
}

/// A [`Registrar`] that records every call and backs them with a real [`Registry`], so
/// duplicate registrations still panic.
#[derive(Default)]
pub struct RecordingRegistrar {
    registry: Registry,
    calls: Mutex<Vec<Registration>>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations in call order.
    pub fn registrations(&self) -> Vec<Registration> {
        self.calls.lock().clone()
    }

    /// The registry the calls were applied to.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Registrar for RecordingRegistrar {
    fn must_register(&self, name: &str, version: u32, factory: Factory, facade_type: FacadeType) {
        self.registry
            .must_register(name, version, factory, facade_type);
        self.calls.lock().push(Registration {
            name: name.to_string(),
            version,
            facade_type,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::factory;

    struct Watcher;

    impl Resource for Watcher {
        fn kind(&self) -> &'static str {
            "watcher"
        }

        fn stop(&self) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_mock_context_roles() {
        let ctx = MockContext::new();
        assert!(!ctx.auth().auth_client());
        assert!(!ctx.auth().auth_controller());

        let ctx = MockContext::new().as_controller();
        assert!(ctx.auth().auth_controller());
        assert_eq!(ctx.auth().auth_tag(), "controller-0");

        let ctx = MockContext::new()
            .as_client()
            .with_permissions(&[Permission::Read]);
        assert!(ctx.auth().has_permission(Permission::Read));
        assert!(!ctx.auth().has_permission(Permission::Admin));
    }

    #[test]
    fn test_mock_resources_register_and_stop() {
        let ctx = MockContext::new();
        let id = ctx.resources().register(Arc::new(Watcher));
        assert_eq!(id, "1");
        assert_eq!(ctx.resources().get(&id).map(|r| r.kind()), Some("watcher"));

        ctx.resources().stop(&id);
        ctx.resources().stop("unknown");
        assert_eq!(ctx.mock_resources().count(), 0);
    }

    #[test]
    fn test_mock_presence_sorted() {
        let ctx = MockContext::new().with_connected(&["machine-1", "machine-0"]);
        assert!(ctx.presence().is_connected("machine-0"));
        assert!(!ctx.presence().is_connected("machine-2"));
        assert_eq!(ctx.presence().connected(), vec!["machine-0", "machine-1"]);
    }

    #[test]
    fn test_recording_registrar_records_in_order() {
        let registrar = RecordingRegistrar::new();
        let t = FacadeType::with_methods::<u8>(&[]);
        registrar.must_register("b", 1, factory(|_| Ok(Box::new(1u8))), t);
        registrar.must_register("a", 2, factory(|_| Ok(Box::new(2u8))), t);

        let names: Vec<_> = registrar
            .registrations()
            .into_iter()
            .map(|r| (r.name, r.version))
            .collect();
        assert_eq!(names, vec![("b".to_string(), 1), ("a".to_string(), 2)]);
        assert_eq!(registrar.registry().len(), 2);
    }
}
