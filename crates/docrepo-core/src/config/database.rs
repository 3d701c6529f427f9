//! Store connection and naming configuration.

use serde::{Deserialize, Serialize};

/// Connection settings plus the environment suffix used for naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store connection string (e.g. `mongodb://host:27017`).
    pub connection_string: String,
    /// Appended to every logical database name. Empty means identity.
    #[serde(default)]
    pub environment_suffix: String,
    /// Application name reported to the server.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    /// Minimum number of pooled connections.
    #[serde(default)]
    pub min_pool_size: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Server selection timeout in seconds.
    #[serde(default = "default_server_selection_timeout")]
    pub server_selection_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Create a configuration with default pool settings and no suffix.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            environment_suffix: String::new(),
            app_name: None,
            max_pool_size: default_max_pool_size(),
            min_pool_size: 0,
            connect_timeout_seconds: default_connect_timeout(),
            server_selection_timeout_seconds: default_server_selection_timeout(),
        }
    }

    /// Set the environment suffix.
    pub fn with_environment_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.environment_suffix = suffix.into();
        self
    }
}

fn default_max_pool_size() -> u32 {
    20
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_server_selection_timeout() -> u64 {
    30
}
