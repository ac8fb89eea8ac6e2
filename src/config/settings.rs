//! Client settings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoteroError};

/// The Zotero Web API host.
pub const DEFAULT_HOST: &str = "https://api.zotero.org";

/// Value sent in the `Zotero-API-Version` header.
pub const API_VERSION: &str = "3";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Settings shared by every request a session issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash.
    pub host: String,
    /// Timeout applied by the endpoint helpers.
    pub timeout_secs: u64,
    /// Sent as the `User-Agent` header.
    pub user_agent: String,
    /// Whether successful requests are appended to the session's request log.
    pub record_history: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            record_history: false,
        }
    }
}

impl ClientConfig {
    /// Enable or disable the request log.
    pub fn with_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    /// Point the client at another host, e.g. a local test server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Timeout used by the endpoint helpers, in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate these settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the host is not an http(s) URL or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if !self.host.starts_with("https://") && !self.host.starts_with("http://") {
            return Err(ZoteroError::invalid_argument(format!(
                "host '{}' must start with http:// or https://",
                self.host
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ZoteroError::invalid_argument(
                "timeout must be a positive number of seconds",
            ));
        }

        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("zotero-client/{}", env!("CARGO_PKG_VERSION"))
}
