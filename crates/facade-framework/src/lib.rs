//! # Facade Framework
//!
//! The dispatch core of a multi-tenant RPC server. Independently written service modules
//! register **named, versioned facade factories** here; the request router resolves an
//! incoming `(name, version)` to a factory, builds a request-scoped facade from a fresh
//! [`Context`], and uses the registered [`FacadeType`] to decide which methods the
//! transport may call on it.
//!
//! ## Architecture Overview
//!
//! 1. **Descriptor layer** ([`facade`]) - [`Facade`], [`FacadeType`], [`Factory`]
//! 2. **Capability layer** ([`context`]) - what a factory may see of the server: session,
//!    durable state, connection resources, presence
//! 3. **Directory layer** ([`registry`]) - [`Registry`], [`Registrar`], [`Description`]
//!
//! The registry owns factories, never facades. Construction happens per request, in the
//! caller, outside any registry lock; nothing is cached or pooled.
//!
//! ## Registering a Service
//!
//! ```rust
//! use facade_framework::{describe_facade, factory, FacadeError, FacadeType, Registrar, Registry};
//!
//! struct RebootApi;
//! describe_facade!(RebootApi => [clear_reboot_flag, wait_for_reboot]);
//!
//! pub fn register(registrar: &dyn Registrar) {
//!     registrar.must_register(
//!         "Reboot",
//!         2,
//!         factory(|ctx| {
//!             if !ctx.auth().auth_machine_agent() {
//!                 return Err(FacadeError::PermissionDenied);
//!             }
//!             Ok(Box::new(RebootApi))
//!         }),
//!         FacadeType::of::<RebootApi>(),
//!     );
//! }
//!
//! let registry = Registry::new();
//! register(&registry);
//! assert_eq!(registry.list()[0].versions, vec![2]);
//! ```
//!
//! ## Evolving a Facade
//!
//! A new version of a facade is registered under the same name with the next version
//! number. Older versions are **thin wrappers over the newest one**: the factory for
//! version *N* calls the construction function of version *N+1* and wraps the result in a
//! struct that forwards only the methods version *N* had. Business logic lives in exactly
//! one place, and each version's [`FacadeType`] lists exactly its own surface. See the
//! `MigrationMaster` family in the `facade-sample` crate.
//!
//! ## Errors
//!
//! The registry produces exactly two errors, [`RegistryError::NotFound`] and
//! [`RegistryError::AlreadyRegistered`]. Factory failures are [`FacadeError`]s and pass
//! through untouched.
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockContext`](mock::MockContext) for invoking factories
//! and [`RecordingRegistrar`](mock::RecordingRegistrar) for asserting what a module registers.

pub mod context;
pub mod error;
pub mod facade;
pub mod mock;
pub mod registry;
pub mod tracing;

// Re-export core types for convenience
pub use context::{Authorizer, Context, Permission, Presence, Resource, Resources, StateAccess};
pub use error::{FacadeError, RegistryError};
pub use facade::{factory, DescribeFacade, Facade, FacadeType, Factory};
pub use registry::{Description, FacadeDetails, Registrar, Registry};
