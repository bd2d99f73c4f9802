use crate::binding::Backend;
use crate::error::CubismResult;

use super::{Context, ContextConfig};

/// Entry point wrapping an explicit runtime handle.
#[derive(Clone)]
pub struct Cubism<B: Backend> {
    backend: B,
}

impl<B: Backend> Cubism<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Version string reported by the wrapped runtime.
    #[must_use]
    pub fn version(&self) -> String {
        self.backend.version()
    }

    /// Creates a context with the runtime defaults.
    pub fn context(&self) -> CubismResult<Context<B>> {
        let context = Context::from_binding(self.backend.context()?);
        tracing::debug!(version = %self.version(), "context created");
        Ok(context)
    }

    /// Creates a context and applies `config` to it.
    pub fn context_with_config(&self, config: &ContextConfig) -> CubismResult<Context<B>> {
        config.validate()?;
        let context = self.context()?;
        context.configure(config)?;
        Ok(context)
    }
}
