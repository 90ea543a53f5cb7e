use facade_framework::{Context, Facade, FacadeError, Registry, RegistryError};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Why a request could not be turned into a facade.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No facade is registered under the requested key.
    #[error(transparent)]
    UnknownFacade(#[from] RegistryError),

    /// The factory refused; its error reaches the client unchanged.
    #[error(transparent)]
    Facade(#[from] FacadeError),

    #[error("{name}({version}) built a facade that is not {expected}")]
    TypeMismatch {
        name: String,
        version: u32,
        expected: &'static str,
    },
}

/// Resolves `(name, version)` to a freshly built facade.
#[derive(Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Looks up the factory, builds the facade for `ctx` and checks it is the registered
    /// type. The registry is not locked while the factory runs.
    #[instrument(skip(self, ctx), fields(id = ctx.id()))]
    pub fn dispatch(
        &self,
        name: &str,
        version: u32,
        ctx: &dyn Context,
    ) -> Result<Box<dyn Facade>, DispatchError> {
        let (factory, facade_type) = self.registry.get(name, version)?;

        let facade = factory(ctx).inspect_err(|err| debug!(%err, "Factory refused"))?;

        if !facade_type.matches(&*facade) {
            error!(expected = facade_type.type_name(), "Factory built the wrong type");
            return Err(DispatchError::TypeMismatch {
                name: name.to_string(),
                version,
                expected: facade_type.type_name(),
            });
        }
        debug!(facade = facade_type.short_name(), "Built facade");
        Ok(facade)
    }

    /// Methods the transport may call on `name` at `version`.
    pub fn exported_methods(
        &self,
        name: &str,
        version: u32,
    ) -> Result<&'static [&'static str], RegistryError> {
        Ok(self.registry.get_type(name, version)?.methods())
    }

    pub fn can_call(&self, name: &str, version: u32, method: &str) -> bool {
        self.exported_methods(name, version)
            .is_ok_and(|methods| methods.contains(&method))
    }
}
