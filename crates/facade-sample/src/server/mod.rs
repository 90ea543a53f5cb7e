//! # API Server Wiring
//!
//! Everything between a client connection and a facade method: the concrete context
//! capabilities, the model's durable state, configuration and the router.
//!
//! ## Request Flow
//!
//! ```text
//! Session ──connect──▶ Connection ──context(id)──▶ RequestContext
//!                          │
//!                          └──dispatch(name, version)──▶ Router ──▶ Registry::get_factory
//!                                                           │
//!                                            factory(&ctx) ◀┘  (registry unlocked)
//! ```
//!
//! A [`Connection`] owns the resources its facades register (watchers); dropping it stops
//! them. The [`ApiServer`] owns the only [`Registry`](facade_framework::Registry), built
//! once at startup by [`register_all`] and trimmed by [`ServerConfig::disabled_facades`].

pub mod api_server;
pub mod config;
pub mod context;
pub mod router;
pub mod state;

pub use api_server::{register_all, ApiServer, Connection};
pub use config::{ConfigError, FacadeRef, ServerConfig};
pub use context::{PresenceRecorder, RequestContext, ResourceStore, Role, Session};
pub use router::{DispatchError, Router};
pub use state::ModelState;

#[cfg(test)]
pub(crate) fn test_model() -> ModelState {
    ModelState::new(crate::model::ModelInfo {
        uuid: "deadbeef".to_string(),
        name: "test".to_string(),
        owner_tag: "user-admin".to_string(),
        agent_version: "0.1.0".to_string(),
    })
}
