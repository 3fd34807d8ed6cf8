use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::DeviceDescriptor;
use crate::snmp::{ClientOptions, Oid, SnmpVersion};

/// Used when neither `--conf` nor `PAGETALLY_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "pagetally.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub snmp: SnmpConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnmpConfig {
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default)]
    pub version: SnmpVersion,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Devices polled at the same time during collection.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_community() -> String {
    "public".into()
}

fn default_port() -> u16 {
    161
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_retries() -> u32 {
    1
}

fn default_concurrency() -> usize {
    4
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            community: default_community(),
            version: SnmpVersion::default(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            concurrency: default_concurrency(),
        }
    }
}

impl SnmpConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            community: self.community.clone(),
            version: self.version,
            port: self.port,
            timeout: Duration::from_millis(self.timeout_ms),
            retries: self.retries,
        }
    }
}

/// One `[[devices]]` entry. `title`/`ip` are accepted for older config files.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "ip")]
    pub address: String,
    #[serde(default)]
    pub oid: Option<Oid>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl DeviceConfig {
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            query_target: self.oid.clone().unwrap_or_default(),
            address: self.address.clone(),
            groups: self.groups.iter().cloned().collect::<BTreeSet<_>>(),
        }
    }
}

/// Layout of the older JSON configuration: `{ "database": "...", "printers": [...] }`.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    database: String,
    printers: Vec<DeviceConfig>,
    #[serde(default)]
    snmp: SnmpConfig,
}

impl From<LegacyConfig> for AppConfig {
    fn from(legacy: LegacyConfig) -> Self {
        Self {
            database: DatabaseConfig {
                path: legacy.database,
            },
            snmp: legacy.snmp,
            devices: legacy.printers,
        }
    }
}

impl AppConfig {
    /// Reads `path`; `.json` files are parsed in the legacy layout, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::load_from_json_str(&s)
        } else {
            Self::load_from_str(&s)
        }
    }

    /// Parse and validate TOML config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_json_str(s: &str) -> Result<Self, ConfigError> {
        let legacy: LegacyConfig = serde_json::from_str(s)?;
        let config = AppConfig::from(legacy);
        config.validate()?;
        Ok(config)
    }

    /// Device descriptors in configuration order.
    pub fn device_descriptors(&self) -> Vec<DeviceDescriptor> {
        self.devices.iter().map(DeviceConfig::descriptor).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            !self.database.path.trim().is_empty(),
            "database.path must be non-empty".into(),
        )?;
        ensure(
            !self.snmp.community.is_empty(),
            "snmp.community must be non-empty".into(),
        )?;
        ensure(
            self.snmp.port > 0,
            format!("snmp.port must be between 1 and 65535, got {}", self.snmp.port),
        )?;
        ensure(
            self.snmp.timeout_ms > 0,
            format!("snmp.timeout_ms must be > 0, got {}", self.snmp.timeout_ms),
        )?;
        ensure(
            self.snmp.concurrency > 0,
            format!("snmp.concurrency must be > 0, got {}", self.snmp.concurrency),
        )?;

        let mut seen = HashSet::with_capacity(self.devices.len());
        for device in &self.devices {
            ensure(
                !device.name.trim().is_empty(),
                "device name must be non-empty".into(),
            )?;
            ensure(
                !device.address.trim().is_empty(),
                format!("device {:?}: address must be non-empty", device.name),
            )?;
            ensure(
                seen.insert(device.name.as_str()),
                format!("device name {:?} is used more than once", device.name),
            )?;
            ensure(
                device.groups.iter().all(|g| !g.trim().is_empty()),
                format!("device {:?}: group names must be non-empty", device.name),
            )?;
        }
        Ok(())
    }
}

fn ensure(condition: bool, message: String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message))
    }
}
