//! Core types for storefront fetching
//!
//! Defines:
//! - Lazy props configuration and render mode
//! - The load context handed to fetch callbacks

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default rendering deadline for client-side transitions
pub const DEFAULT_TIMEOUT_MS: u64 = 50;

/// Whether a load is bound by a rendering deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Interactive transition: something must render immediately
    #[default]
    Client,
    /// Server rendering: no deadline, always wait for the data
    Server,
}

impl RenderMode {
    /// Check if the rendering deadline applies
    #[inline]
    #[must_use]
    pub fn enforces_deadline(&self) -> bool {
        matches!(self, RenderMode::Client)
    }
}

/// Lazy props configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyPropsConfig {
    /// Rendering deadline in milliseconds
    pub timeout_ms: u64,
    /// Whether the deadline is enforced
    pub mode: RenderMode,
}

impl LazyPropsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With rendering deadline
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With render mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Server rendering, deadline ignored
    #[inline]
    #[must_use]
    pub fn server(self) -> Self {
        self.with_mode(RenderMode::Server)
    }

    /// Client transition, deadline enforced
    #[inline]
    #[must_use]
    pub fn client(self) -> Self {
        self.with_mode(RenderMode::Client)
    }

    /// Rendering deadline
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse from TOML text. Missing keys fall back to defaults.
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid TOML for this shape
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if its contents are invalid
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }
}

impl Default for LazyPropsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            mode: RenderMode::Client,
        }
    }
}

/// Options handed to a lazy props fetch callback
///
/// `as_path` is the navigation destination and the history cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LoadContext {
    /// Destination path as shown in the address bar
    pub as_path: String,
    /// Query parameters of the destination
    pub query: BTreeMap<String, String>,
}

impl LoadContext {
    /// Create context for destination path
    #[inline]
    #[must_use]
    pub fn new(as_path: impl Into<String>) -> Self {
        Self {
            as_path: as_path.into(),
            query: BTreeMap::new(),
        }
    }

    /// With query parameter
    #[inline]
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Cache key for this destination
    #[inline]
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.as_path
    }
}
