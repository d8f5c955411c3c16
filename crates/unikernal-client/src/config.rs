//! Adapter configuration.
//!
//! ```toml
//! address = "ws://localhost:8080/ws"
//! service_id = "java-service"
//! auth_key = "adapter-key"
//! ```

use std::path::Path;

use serde::Deserialize;
use unikernal_core::ServiceId;

use crate::ConfigError;

/// Hub address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "ws://localhost:8080/ws";

/// Where to connect and who to announce as.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub address: String,
    pub service_id: String,
    /// Sent as-is; the hub decides whether it is valid.
    pub auth_key: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            service_id: String::new(),
            auth_key: String::new(),
        }
    }
}

impl AdapterConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Check the address and return the validated service id.
    pub fn validate(&self) -> Result<ServiceId, ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        Ok(ServiceId::new(self.service_id.as_str())?)
    }
}
