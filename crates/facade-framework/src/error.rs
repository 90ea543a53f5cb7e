//! # Framework Errors
//!
//! Two families of errors live here:
//!
//! - [`RegistryError`] is produced by the [`Registry`](crate::Registry) itself. It has exactly
//!   two variants and both carry the offending `(name, version)` key. Their `Display` text is
//!   part of the contract, tooling matches on it.
//! - [`FacadeError`] is produced by factories and facade methods. The registry never creates,
//!   wraps or reinterprets one; whatever a factory returns reaches the caller unchanged.

use std::fmt;

/// Errors produced by registry lookups and registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No entry exists for the requested key. Expected at runtime, the caller decides
    /// whether it becomes an "unknown facade" reply.
    #[error("{name}({version}) not found")]
    NotFound { name: String, version: u32 },

    /// The key was already taken. Always a programming error in the registering module.
    #[error("object \"{name}({version})\" already registered")]
    AlreadyRegistered { name: String, version: u32 },
}

impl RegistryError {
    pub(crate) fn not_found(name: &str, version: u32) -> Self {
        RegistryError::NotFound {
            name: name.to_string(),
            version,
        }
    }

    pub(crate) fn already_registered(name: &str, version: u32) -> Self {
        RegistryError::AlreadyRegistered {
            name: name.to_string(),
            version,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    pub fn is_already_registered(&self) -> bool {
        matches!(self, RegistryError::AlreadyRegistered { .. })
    }

    /// The `(name, version)` key the error refers to.
    pub fn key(&self) -> (&str, u32) {
        match self {
            RegistryError::NotFound { name, version }
            | RegistryError::AlreadyRegistered { name, version } => (name, *version),
        }
    }
}

/// Errors raised while constructing a facade or running one of its methods.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    /// The session in the construction context may not use this facade.
    #[error("permission denied")]
    PermissionDenied,

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Durable state access failed.
    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl FacadeError {
    /// Wraps any error as [`FacadeError::Internal`].
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FacadeError::Internal(err.into())
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FacadeError::PermissionDenied)
    }
}

/// Formats a registry key the same way the error messages do: `name(version)`.
pub struct KeyDisplay<'a>(pub &'a str, pub u32);

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text_is_stable() {
        let err = RegistryError::not_found("name", 0);
        assert_eq!(err.to_string(), "name(0) not found");
        assert!(err.is_not_found());

        let err = RegistryError::already_registered("name", 7);
        assert_eq!(err.to_string(), "object \"name(7)\" already registered");
        assert!(err.is_already_registered());
        assert_eq!(err.key(), ("name", 7));
    }

    #[test]
    fn test_internal_keeps_source_text() {
        let err = FacadeError::internal("creating precheck backend");
        assert_eq!(err.to_string(), "creating precheck backend");
        assert!(!err.is_permission_denied());
        assert_eq!(FacadeError::PermissionDenied.to_string(), "permission denied");
    }
}
