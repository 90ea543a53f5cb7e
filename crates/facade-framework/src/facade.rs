//! # Facades, Type Descriptors & Factories
//!
//! A **facade** is the request-scoped object a client talks to over the RPC boundary. It is
//! built fresh for every request by a [`Factory`] and thrown away afterwards.
//!
//! The transport needs to know which methods a facade exposes *without* constructing one, so
//! every registration carries a [`FacadeType`]: the concrete Rust type of the object the
//! factory returns plus the names of its exported methods. The descriptor is produced once,
//! at registration time, and the registry carries it around opaquely.
//!
//! ```rust
//! use facade_framework::{describe_facade, factory, FacadeType};
//!
//! struct RebootApi;
//!
//! impl RebootApi {
//!     fn clear_reboot_flag(&self) -> bool { true }
//! }
//!
//! describe_facade!(RebootApi => [clear_reboot_flag]);
//!
//! let reboot = factory(|_ctx| Ok(Box::new(RebootApi)));
//! let facade_type = FacadeType::of::<RebootApi>();
//! assert!(facade_type.has_method("clear_reboot_flag"));
//! # let _ = reboot;
//! ```

use crate::context::Context;
use crate::error::FacadeError;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A facade instance produced by a factory.
///
/// Implemented for every `Any + Send + Sync` type; the concrete type is recovered with
/// `downcast_ref` or `downcast` on `dyn Facade`.
pub trait Facade: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> Facade for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Facade {
    /// `TypeId` of the concrete facade behind the trait object.
    pub fn concrete_type_id(&self) -> TypeId {
        Any::type_id(self.as_any())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Recovers the concrete facade, handing the box back untouched on a type mismatch.
    pub fn downcast<T: Any>(self: Box<Self>) -> Result<Box<T>, Box<dyn Facade>> {
        if self.is::<T>() {
            self.into_any()
                .downcast::<T>()
                .map_err(|_| unreachable!("type checked above"))
        } else {
            Err(self)
        }
    }
}

impl fmt::Debug for dyn Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facade")
            .field("type_id", &self.concrete_type_id())
            .finish_non_exhaustive()
    }
}

/// Declares the method surface a facade type exports over the wire.
///
/// Only the methods listed here are callable for the version the type is registered under.
/// Use [`describe_facade!`](crate::describe_facade) rather than implementing this by hand.
pub trait DescribeFacade: Any + Send + Sync {
    const METHODS: &'static [&'static str];
}

/// Implements [`DescribeFacade`] for a type from a list of method identifiers.
///
/// ```rust
/// # use facade_framework::{describe_facade, DescribeFacade};
/// struct BlockApi;
/// describe_facade!(BlockApi => [list, switch_block_on, switch_block_off]);
/// assert_eq!(BlockApi::METHODS, &["list", "switch_block_on", "switch_block_off"]);
/// ```
#[macro_export]
macro_rules! describe_facade {
    ($ty:ty => [$($method:ident),* $(,)?]) => {
        impl $crate::DescribeFacade for $ty {
            const METHODS: &'static [&'static str] = &[$(stringify!($method)),*];
        }
    };
}

/// Opaque runtime type handle recorded alongside each registration.
#[derive(Clone, Copy)]
pub struct FacadeType {
    type_id: TypeId,
    type_name: &'static str,
    methods: &'static [&'static str],
}

impl FacadeType {
    /// Descriptor for a facade type that declares its own method surface.
    pub fn of<T: DescribeFacade>() -> Self {
        Self::with_methods::<T>(T::METHODS)
    }

    /// Descriptor with an explicit method list, for types outside this crate's reach.
    pub fn with_methods<T: Any>(methods: &'static [&'static str]) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            methods,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Short type name without the module path, for logs.
    pub fn short_name(&self) -> &'static str {
        self.type_name.rsplit("::").next().unwrap_or(self.type_name)
    }

    pub fn methods(&self) -> &'static [&'static str] {
        self.methods
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }

    /// True when `facade` is exactly the type this descriptor was built for.
    pub fn matches(&self, facade: &dyn Facade) -> bool {
        facade.concrete_type_id() == self.type_id
    }
}

impl PartialEq for FacadeType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.methods == other.methods
    }
}

impl Eq for FacadeType {}

impl fmt::Debug for FacadeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeType")
            .field("type_name", &self.type_name)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Builds a facade from the per-request construction context.
///
/// Contract: a factory checks `ctx.auth()` before doing anything else and returns
/// [`FacadeError::PermissionDenied`] when the session may not use the facade.
pub type Factory =
    Arc<dyn Fn(&dyn Context) -> Result<Box<dyn Facade>, FacadeError> + Send + Sync>;

/// Wraps a closure or function into a [`Factory`].
pub fn factory<F>(f: F) -> Factory
where
    F: Fn(&dyn Context) -> Result<Box<dyn Facade>, FacadeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClientApi;
    struct OtherApi;

    describe_facade!(ClientApi => [status, watch]);
    describe_facade!(OtherApi => [status, watch]);

    #[test]
    fn test_descriptor_reflects_declared_methods() {
        let t = FacadeType::of::<ClientApi>();
        assert_eq!(t.methods(), &["status", "watch"]);
        assert!(t.has_method("watch"));
        assert!(!t.has_method("export"));
        assert_eq!(t.short_name(), "ClientApi");
    }

    #[test]
    fn test_descriptor_equality_is_by_type() {
        assert_eq!(FacadeType::of::<ClientApi>(), FacadeType::of::<ClientApi>());
        assert_ne!(FacadeType::of::<ClientApi>(), FacadeType::of::<OtherApi>());
    }

    #[test]
    fn test_downcast_boxed_facade() {
        let facade: Box<dyn Facade> = Box::new(ClientApi);
        assert!(facade.is::<ClientApi>());
        assert!(FacadeType::of::<ClientApi>().matches(&*facade));
        assert!(!FacadeType::of::<OtherApi>().matches(&*facade));

        let facade = match facade.downcast::<OtherApi>() {
            Ok(_) => panic!("downcast to the wrong type succeeded"),
            Err(original) => original,
        };
        assert!(facade.downcast::<ClientApi>().is_ok());
    }

    #[test]
    fn test_plain_values_are_facades() {
        let facade: Box<dyn Facade> = Box::new("myobject");
        assert_eq!(facade.downcast_ref::<&str>(), Some(&"myobject"));
        let t = FacadeType::with_methods::<&'static str>(&[]);
        assert!(t.matches(&*facade));
    }
}
