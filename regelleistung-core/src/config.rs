//! Client configuration for the tender API.
//!
//! Stored as an optional TOML file; every field has a default so an empty
//! file (or no file at all) yields a working client:
//!
//! ```toml
//! base_url = "https://www.regelleistung.net/apps/cpp-publisher/api/v1/download/tenders/"
//! timeout_secs = 60
//! ambiguous_time = "reject"
//! ```

use crate::data::DataError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str =
    "https://www.regelleistung.net/apps/cpp-publisher/api/v1/download/tenders/";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How to resolve a Berlin wall-clock hour that occurs twice (last Sunday of October).
///
/// Hours skipped by the spring-forward transition are always rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousTimePolicy {
    /// Fail with a parse error
    #[default]
    Reject,
    /// Take the first occurrence (summer time, +02:00)
    Earliest,
    /// Take the second occurrence (standard time, +01:00)
    Latest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Download endpoint; the report path segment is appended to it.
    pub base_url: String,
    /// Per-request timeout. `None` or `0` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
    pub ambiguous_time: AmbiguousTimePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("regelleistung-core/", env!("CARGO_PKG_VERSION")).to_string(),
            ambiguous_time: AmbiguousTimePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from a TOML string. Normalizes `base_url` to end with `/`.
    pub fn from_toml_str(content: &str) -> Result<Self, DataError> {
        let mut config: ClientConfig = toml::from_str(content)
            .map_err(|e| DataError::Config(format!("parse client TOML: {e}")))?;
        if config.base_url.trim().is_empty() {
            return Err(DataError::Config("base_url must not be empty".into()));
        }
        if !config.base_url.ends_with('/') {
            config.base_url.push('/');
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
