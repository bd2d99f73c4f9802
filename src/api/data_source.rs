use crate::binding::{Backend, CubeBinding, GraphiteBinding, LibratoBinding};
use crate::core::Summarize;
use crate::error::CubismResult;

use super::Metric;

/// Graphite server as a metric source.
pub struct Graphite<B: Backend> {
    binding: B::Graphite,
}

impl<B: Backend> Clone for Graphite<B> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<B: Backend> Graphite<B> {
    #[must_use]
    pub fn from_binding(binding: B::Graphite) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &B::Graphite {
        &self.binding
    }

    /// Metric for a Graphite target expression, summed when the step is coarser than 10 s.
    #[must_use]
    pub fn metric(&self, expression: &str) -> Metric<B> {
        self.metric_summarized(expression, Summarize::default())
    }

    #[must_use]
    pub fn metric_summarized(&self, expression: &str, summarize: Summarize) -> Metric<B> {
        Metric::from_binding(self.binding.metric(expression, summarize))
    }

    /// Looks up metric paths matching `pattern`, e.g. `"servers.*.cpu"`.
    ///
    /// `callback` receives an error only when the lookup itself failed.
    pub fn find(
        &self,
        pattern: &str,
        callback: impl FnOnce(CubismResult<Vec<String>>) + 'static,
    ) {
        tracing::debug!(pattern, "graphite find");
        self.binding.find(pattern, Box::new(callback));
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.binding.host()
    }
}

/// Cube server as a metric source.
pub struct Cube<B: Backend> {
    binding: B::Cube,
}

impl<B: Backend> Clone for Cube<B> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<B: Backend> Cube<B> {
    #[must_use]
    pub fn from_binding(binding: B::Cube) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &B::Cube {
        &self.binding
    }

    #[must_use]
    pub fn metric(&self, expression: &str) -> Metric<B> {
        Metric::from_binding(self.binding.metric(expression))
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.binding.host()
    }
}

/// Librato account as a metric source.
pub struct Librato<B: Backend> {
    binding: B::Librato,
}

impl<B: Backend> Clone for Librato<B> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<B: Backend> Librato<B> {
    #[must_use]
    pub fn from_binding(binding: B::Librato) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &B::Librato {
        &self.binding
    }

    /// Metric `name` measured at `source`.
    #[must_use]
    pub fn metric(&self, name: &str, source: &str) -> Metric<B> {
        Metric::from_binding(self.binding.metric(name, source))
    }
}
