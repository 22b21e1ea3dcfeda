use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Upper bound on a single chunk of a multi-chunk response.
pub const CHUNK_SIZE: usize = 512;

/// Requests at or above this length are rejected.
pub const MAX_REQUEST_LEN: usize = 1024;

/// Per-connection send buffer of the socket adapter (two full segments).
pub const SEND_BUFFER: usize = 2 * 1460;

pub const IDLE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub chunk_size: usize,
    pub max_request_len: usize,
    pub send_buffer: usize,
    /// `None` keeps stalled connections open indefinitely.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:80".to_string(),
            chunk_size: CHUNK_SIZE,
            max_request_len: MAX_REQUEST_LEN,
            send_buffer: SEND_BUFFER,
            idle_timeout_secs: Some(IDLE_TIMEOUT_SECS),
        }
    }
}

/// Limits the connection core enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub chunk_size: usize,
    pub max_request_len: usize,
    pub idle_timeout: Option<Duration>,
}

impl Default for Limits {
    fn default() -> Self {
        Config::default().limits()
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// `CONFIG` names an optional YAML file; `LISTEN` overrides the listen
    /// address on top of it.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    pub fn load_from<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup("CONFIG") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(listen_addr) = lookup("LISTEN") {
            cfg.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        if self.max_request_len == 0 {
            bail!("max_request_len must be greater than zero");
        }
        if self.idle_timeout_secs == Some(0) {
            bail!("idle_timeout_secs must be greater than zero, or null to disable");
        }
        if self.chunk_size > self.send_buffer {
            bail!(
                "chunk_size ({}) does not fit in send_buffer ({})",
                self.chunk_size,
                self.send_buffer
            );
        }
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            chunk_size: self.chunk_size,
            max_request_len: self.max_request_len,
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}
