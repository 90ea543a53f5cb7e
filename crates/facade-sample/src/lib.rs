//! # Facade Sample Server
//!
//! A small model-hosting API server built on `facade-framework`. It exists to show how
//! service modules plug into the registry and how a facade family evolves.
//!
//! - [`migration_master`] - `MigrationMaster` v1 to v3, the versioned family
//! - [`block`] - `Block` v2, a single-version client facade
//! - [`server`] - sessions, connections, model state, configuration and routing
//! - [`model`] - plain data returned by facade methods

pub mod block;
pub mod migration_master;
pub mod model;
pub mod server;
