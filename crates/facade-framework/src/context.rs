//! # Construction Context
//!
//! Every [`Factory`](crate::Factory) receives a `&dyn Context` built fresh for the request
//! by the server. It is a capability bundle:
//!
//! | Accessor | Capability |
//! |----------|------------|
//! | [`Context::auth`] | who is calling and what they may do |
//! | [`Context::state`] | durable model state |
//! | [`Context::resources`] | handles that must outlive a single call (watchers, result sets) |
//! | [`Context::presence`] | which remote agents are currently connected |
//!
//! The registry never looks inside a context. Service modules do, and they are responsible
//! for refusing to build a facade when [`Context::auth`] says the session may not use it.
//!
//! Accessors hand out `Arc`s so a facade can keep what it needs after the factory returns.

use std::any::Any;
use std::sync::Arc;

/// Per-request capability bundle passed to every factory.
pub trait Context: Send + Sync {
    /// Object id the request addressed; empty when the facade is not id-scoped.
    fn id(&self) -> &str;

    fn auth(&self) -> Arc<dyn Authorizer>;

    fn state(&self) -> Arc<dyn StateAccess>;

    fn resources(&self) -> Arc<dyn Resources>;

    fn presence(&self) -> Arc<dyn Presence>;
}

/// Fine-grained permissions a session may hold on the current model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

/// Authorization view of the session that made the request.
pub trait Authorizer: Send + Sync {
    /// Tag of the authenticated entity, e.g. `user-admin` or `machine-0`.
    fn auth_tag(&self) -> &str;

    /// The caller is a user client.
    fn auth_client(&self) -> bool;

    /// The caller is a controller agent.
    fn auth_controller(&self) -> bool;

    fn auth_machine_agent(&self) -> bool;

    fn has_permission(&self, permission: Permission) -> bool;
}

/// Durable state the server exposes to service modules.
///
/// Service modules recover the concrete backend with `downcast_ref` on `dyn StateAccess`.
pub trait StateAccess: Any + Send + Sync {
    fn model_uuid(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

impl dyn StateAccess {
    pub fn downcast_ref<T: StateAccess>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A long-lived handle owned by the connection rather than a single call.
pub trait Resource: Any + Send + Sync {
    /// Short kind used in logs, e.g. `"watcher"`.
    fn kind(&self) -> &'static str;

    /// Releases whatever the resource holds. Called at most once by the owner.
    fn stop(&self);

    fn as_any(&self) -> &dyn Any;
}

impl dyn Resource {
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Connection-scoped store of [`Resource`]s.
pub trait Resources: Send + Sync {
    /// Stores the resource and returns the id clients use to refer to it.
    fn register(&self, resource: Arc<dyn Resource>) -> String;

    fn get(&self, id: &str) -> Option<Arc<dyn Resource>>;

    /// Stops and removes the resource. Unknown ids are ignored.
    fn stop(&self, id: &str);

    fn count(&self) -> usize;
}

/// Liveness of remote agents.
pub trait Presence: Send + Sync {
    fn is_connected(&self, agent_tag: &str) -> bool;

    /// Tags of every agent currently connected, sorted.
    fn connected(&self) -> Vec<String>;
}
