//! Compiler configuration.
//!
//! Loaded from TOML. Every field has a default, so a missing file or a
//! partial file is fine. Default location: /etc/neutron/sgacl.toml

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/neutron/sgacl.toml";

/// Result of probing the backend ACL table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Whether the ACL table has the optional `name` and `severity`
    /// columns.
    #[serde(default = "default_name_severity_columns")]
    pub name_severity_columns: bool,
}

/// Complete compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Master switch for security group enforcement
    #[serde(default = "default_security_groups_enabled")]
    pub security_groups_enabled: bool,

    /// DHCP replies are generated by the switch rather than an agent
    #[serde(default = "default_native_dhcp")]
    pub native_dhcp: bool,

    #[serde(default)]
    pub capabilities: Capabilities,
}

fn default_name_severity_columns() -> bool {
    true
}

fn default_security_groups_enabled() -> bool {
    true
}

fn default_native_dhcp() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            name_severity_columns: default_name_severity_columns(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            security_groups_enabled: default_security_groups_enabled(),
            native_dhcp: default_native_dhcp(),
            capabilities: Capabilities::default(),
        }
    }
}

impl CompilerConfig {
    pub fn with_security_groups_enabled(mut self, enabled: bool) -> Self {
        self.security_groups_enabled = enabled;
        self
    }

    pub fn with_native_dhcp(mut self, native: bool) -> Self {
        self.native_dhcp = native;
        self
    }

    pub fn with_name_severity_columns(mut self, supported: bool) -> Self {
        self.capabilities.name_severity_columns = supported;
        self
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content).map_err(|message| {
                    ConfigError::Parse {
                        path: path.display().to_string(),
                        message,
                    }
                })?;
                config.validate();
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate configuration.
    ///
    /// Every combination of settings is loadable; settings that cannot take
    /// effect are only reported. Returns true if nothing was reported.
    pub fn validate(&self) -> bool {
        if !self.security_groups_enabled && !self.native_dhcp {
            warn!("native_dhcp = false has no effect while security groups are disabled");
            return false;
        }
        true
    }
}
