//! Configuration management.
//!
//! Loads the service directory extension table and logging settings from
//! TOML. Every section has defaults, so an empty file yields the baseline
//! directory with `info`/`pretty` logging.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::service::{ServiceClass, ServiceDirectory, ServicePolicy};
use crate::types::{is_valid_service_name, ServiceKey};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service directory configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Service directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Start from the baseline service table
    #[serde(default = "default_include_defaults")]
    pub include_defaults: bool,

    /// Additional (or overriding) services
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// One service entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name, `[a-zA-Z.]+`
    pub name: String,

    /// Behaviour class
    #[serde(default = "default_class")]
    pub class: ServiceClass,

    /// Compare values case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,

    /// Only the most recent proof counts. Defaults by class: keybase and
    /// social services are last-writer-wins, the rest are not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_writer_wins: Option<bool>,
}

impl ServiceConfig {
    /// Policy described by this entry.
    pub fn policy(&self) -> ServicePolicy {
        let lww_default = matches!(self.class, ServiceClass::Keybase | ServiceClass::Social);
        ServicePolicy {
            class: self.class,
            case_sensitive: self.case_sensitive,
            last_writer_wins: self.last_writer_wins.unwrap_or(lww_default),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_include_defaults() -> bool {
    true
}

fn default_class() -> ServiceClass {
    ServiceClass::Social
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            include_defaults: default_include_defaults(),
            services: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Example
    /// ```no_run
    /// # use idassert_core::config::Config;
    /// let config = Config::from_file("idassert.toml")?;
    /// let directory = config.service_directory()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for service in &self.directory.services {
            if !is_valid_service_name(&service.name) {
                anyhow::bail!(
                    "Service name '{}' must match [a-zA-Z.]+",
                    service.name
                );
            }
            if !seen.insert(service.name.to_ascii_lowercase()) {
                anyhow::bail!("Service '{}' is declared more than once", service.name);
            }
        }

        let directory = self.build_directory()?;
        let web_aliases = directory
            .iter()
            .filter(|(_, policy)| policy.class == ServiceClass::Web)
            .count();
        if web_aliases > 1 {
            anyhow::bail!(
                "At most one service may use class 'web' (found {})",
                web_aliases
            );
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Logging level must be one of: {} (got '{}')",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Logging format must be one of: {} (got '{}')",
                valid_formats.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }

    /// Build the immutable service directory described by this configuration.
    pub fn service_directory(&self) -> Result<ServiceDirectory> {
        self.validate()?;
        self.build_directory()
    }

    fn build_directory(&self) -> Result<ServiceDirectory> {
        let mut directory = if self.directory.include_defaults {
            ServiceDirectory::baseline()
        } else {
            ServiceDirectory::empty()
        };
        for service in &self.directory.services {
            let key = ServiceKey::new(&service.name)
                .with_context(|| format!("Invalid service entry '{}'", service.name))?;
            directory = directory.with_service(key, service.policy());
        }
        Ok(directory)
    }
}
