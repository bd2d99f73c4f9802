use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::types::{
    DEFAULT_CLIENT_DELAY_MS, DEFAULT_SERVER_DELAY_MS, DEFAULT_SIZE, DEFAULT_STEP_MS,
};
use crate::error::{CubismError, CubismResult};

/// Context setup in a persistable form.
///
/// Missing fields deserialize to the runtime defaults: 10 s step, 1440
/// samples, 5 s server and client delay. Unknown fields are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_server_delay_ms")]
    pub server_delay_ms: u64,
    #[serde(default = "default_client_delay_ms")]
    pub client_delay_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            size: default_size(),
            server_delay_ms: default_server_delay_ms(),
            client_delay_ms: default_client_delay_ms(),
        }
    }
}

impl ContextConfig {
    #[must_use]
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step_ms = duration_millis(step);
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_server_delay(mut self, delay: Duration) -> Self {
        self.server_delay_ms = duration_millis(delay);
        self
    }

    #[must_use]
    pub fn with_client_delay(mut self, delay: Duration) -> Self {
        self.client_delay_ms = duration_millis(delay);
        self
    }

    #[must_use]
    pub fn step(self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    #[must_use]
    pub fn server_delay(self) -> Duration {
        Duration::from_millis(self.server_delay_ms)
    }

    #[must_use]
    pub fn client_delay(self) -> Duration {
        Duration::from_millis(self.client_delay_ms)
    }

    pub fn validate(self) -> CubismResult<()> {
        if self.step_ms == 0 {
            return Err(CubismError::InvalidConfig(
                "step must be at least one millisecond".to_owned(),
            ));
        }
        if self.size == 0 {
            return Err(CubismError::InvalidConfig("size must be > 0".to_owned()));
        }
        Ok(())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_step_ms() -> u64 {
    DEFAULT_STEP_MS as u64
}

fn default_size() -> usize {
    DEFAULT_SIZE
}

fn default_server_delay_ms() -> u64 {
    DEFAULT_SERVER_DELAY_MS as u64
}

fn default_client_delay_ms() -> u64 {
    DEFAULT_CLIENT_DELAY_MS as u64
}
