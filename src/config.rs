use crate::buffer::DEFAULT_CAPACITY;
use crate::protocol::{DEFAULT_HOST, DEFAULT_PORT};
use crate::{ImuError, Result};
use std::time::Duration;

pub const ENV_HOST: &str = "IMU_SERVER_HOST";
pub const ENV_PORT: &str = "IMU_SERVER_PORT";
pub const ENV_IDLE_TIMEOUT_SECS: &str = "IMU_SERVER_IDLE_TIMEOUT_SECS";

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Close a connection after this long without an inbound frame.
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Samples kept in the shared retention buffer.
    pub buffer_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: None,
            buffer_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `IMU_SERVER_HOST`, `IMU_SERVER_PORT` and
    /// `IMU_SERVER_IDLE_TIMEOUT_SECS` (0 disables the timeout).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(host) = read(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = read(ENV_PORT) {
            config.port = port
                .parse()
                .map_err(|_| ImuError::Config(format!("{ENV_PORT}={port:?} is not a port number")))?;
        }
        if let Some(secs) = read(ENV_IDLE_TIMEOUT_SECS) {
            let secs: u64 = secs.parse().map_err(|_| {
                ImuError::Config(format!("{ENV_IDLE_TIMEOUT_SECS}={secs:?} is not a whole number"))
            })?;
            config.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// `host:port`, suitable for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
