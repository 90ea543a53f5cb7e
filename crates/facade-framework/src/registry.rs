//! # Facade Registry
//!
//! The directory the request router consults for every incoming call. Service modules fill
//! it at startup, the router queries it for the lifetime of the process.
//!
//! ## Concurrency Model
//!
//! Unlike the rest of the server, the registry is plain shared memory: a single
//! [`parking_lot::RwLock`] guards the entry set. Readers (`get_*`, `list*`) run in parallel,
//! writers (`register`, `discard`) are exclusive, so a reader never sees half an insert.
//!
//! The lock is never held while foreign code runs. [`Registry::get_factory`] clones the
//! stored `Arc` and releases the guard before the caller invokes the factory, so a factory
//! that itself consults the registry cannot deadlock.
//!
//! ## Ordering
//!
//! Entries are kept in nested `BTreeMap`s (name, then version). Enumeration is therefore
//! sorted by name and version without a sort step, and a name disappears together with
//! its last version.

use crate::error::{KeyDisplay, RegistryError};
use crate::facade::{FacadeType, Factory};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info, warn};

/// One facade name and every version registered for it, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub name: String,
    pub versions: Vec<u32>,
}

/// A single registration, as returned by [`Registry::list_details`].
#[derive(Clone)]
pub struct FacadeDetails {
    pub name: String,
    pub version: u32,
    pub factory: Factory,
    pub facade_type: FacadeType,
}

impl fmt::Debug for FacadeDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeDetails")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("facade_type", &self.facade_type)
            .finish_non_exhaustive()
    }
}

/// The registration surface service modules depend on.
///
/// Each service module exposes a `register(&dyn Registrar)` function and calls
/// [`Registrar::must_register`] once per version it serves. Depending on this trait rather
/// than on [`Registry`] lets tests record what a module registers.
pub trait Registrar {
    /// Adds `name` at `version`. `facade_type` must describe exactly the type `factory`
    /// returns; its method list is what the transport exports for this version.
    ///
    /// # Panics
    ///
    /// Implementations abort on a failed registration or an empty `name`. Duplicate
    /// registration at startup is a programming error, not something to recover from.
    fn must_register(&self, name: &str, version: u32, factory: Factory, facade_type: FacadeType);
}

#[derive(Clone)]
struct Record {
    factory: Factory,
    facade_type: FacadeType,
}

/// Concurrency-safe map of `(name, version)` to `(Factory, FacadeType)`.
///
/// Construct one per server (or per test) and pass it by reference to every service module.
///
/// ```rust
/// use facade_framework::{factory, FacadeType, Registry};
///
/// let registry = Registry::new();
/// registry
///     .register("Pinger", 1, factory(|_| Ok(Box::new(42u64))), FacadeType::with_methods::<u64>(&["ping"]))
///     .unwrap();
///
/// let err = registry.get_factory("Pinger", 2).err().unwrap();
/// assert_eq!(err.to_string(), "Pinger(2) not found");
/// ```
#[derive(Default)]
pub struct Registry {
    facades: RwLock<BTreeMap<String, BTreeMap<u32, Record>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a facade at the given version.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the key is taken; the existing
    /// entry is left untouched. Registration never overwrites.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn register(
        &self,
        name: &str,
        version: u32,
        factory: Factory,
        facade_type: FacadeType,
    ) -> Result<(), RegistryError> {
        assert!(!name.is_empty(), "facade name must not be empty");
        let key = KeyDisplay(name, version);

        let mut facades = self.facades.write();
        let versions = facades.entry(name.to_string()).or_default();
        if versions.contains_key(&version) {
            drop(facades);
            warn!(%key, "Duplicate facade registration");
            return Err(RegistryError::already_registered(name, version));
        }
        versions.insert(
            version,
            Record {
                factory,
                facade_type,
            },
        );
        let size = facades.values().map(BTreeMap::len).sum::<usize>();
        drop(facades);

        info!(%key, facade_type = facade_type.short_name(), size, "Registered");
        Ok(())
    }

    /// Like [`register`](Self::register), but a failure aborts the process.
    ///
    /// # Panics
    ///
    /// Panics with the registration error's message when the key is already taken, and
    /// on an empty `name`.
    pub fn must_register(&self, name: &str, version: u32, factory: Factory, facade_type: FacadeType) {
        if let Err(err) = self.register(name, version, factory, facade_type) {
            error!(error = %err, "Facade registration failed at startup");
            panic!("{err}");
        }
    }

    /// Returns the factory and type descriptor of one registration, read together so the
    /// pair always belongs to the same entry.
    pub fn get(&self, name: &str, version: u32) -> Result<(Factory, FacadeType), RegistryError> {
        self.lookup(name, version).map(|record| (record.factory, record.facade_type))
    }

    /// Returns the factory stored for the key, unchanged.
    pub fn get_factory(&self, name: &str, version: u32) -> Result<Factory, RegistryError> {
        self.lookup(name, version).map(|record| record.factory)
    }

    /// Returns the type descriptor stored for the key without constructing anything.
    pub fn get_type(&self, name: &str, version: u32) -> Result<FacadeType, RegistryError> {
        self.lookup(name, version).map(|record| record.facade_type)
    }

    /// Removes the entry if present. Other versions and other names are unaffected;
    /// discarding an absent key is a no-op.
    pub fn discard(&self, name: &str, version: u32) {
        let mut facades = self.facades.write();
        let Some(versions) = facades.get_mut(name) else {
            return;
        };
        let removed = versions.remove(&version).is_some();
        if versions.is_empty() {
            facades.remove(name);
        }
        drop(facades);

        if removed {
            info!(key = %KeyDisplay(name, version), "Discarded");
        }
    }

    /// Every registered name with its versions, sorted by name then version.
    pub fn list(&self) -> Vec<Description> {
        self.facades
            .read()
            .iter()
            .map(|(name, versions)| Description {
                name: name.clone(),
                versions: versions.keys().copied().collect(),
            })
            .collect()
    }

    /// Every registration with its factory and type, sorted by name then version.
    pub fn list_details(&self) -> Vec<FacadeDetails> {
        self.facades
            .read()
            .iter()
            .flat_map(|(name, versions)| {
                versions.iter().map(move |(version, record)| FacadeDetails {
                    name: name.clone(),
                    version: *version,
                    factory: record.factory.clone(),
                    facade_type: record.facade_type,
                })
            })
            .collect()
    }

    /// Number of `(name, version)` entries.
    pub fn len(&self) -> usize {
        self.facades.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.facades.read().is_empty()
    }

    fn lookup(&self, name: &str, version: u32) -> Result<Record, RegistryError> {
        let record = self
            .facades
            .read()
            .get(name)
            .and_then(|versions| versions.get(&version))
            .cloned();

        match record {
            Some(record) => Ok(record),
            None => {
                debug!(key = %KeyDisplay(name, version), "Facade not found");
                Err(RegistryError::not_found(name, version))
            }
        }
    }
}

impl Registrar for Registry {
    fn must_register(&self, name: &str, version: u32, factory: Factory, facade_type: FacadeType) {
        Registry::must_register(self, name, version, factory, facade_type);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("facades", &self.list())
            .finish()
    }
}
