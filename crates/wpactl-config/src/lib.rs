//! Shared configuration for wpactl consumers.
//!
//! A TOML file at the platform config path, overridden by `WPACTL_`
//! environment variables, translated into `wpactl_core::ClientConfig`.
//! Opening the control socket itself is left to the embedding
//! application; [`Config::control_socket_path`] says where it lives.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wpactl_core::{ClientConfig, SessionConfig};

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `WPACTL_CLIENT__SCAN_TIMEOUT_MS=500`.
pub const ENV_PREFIX: &str = "WPACTL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Where to find the daemon.
    #[serde(default)]
    pub daemon: DaemonSection,

    /// How the client drives it.
    #[serde(default)]
    pub client: ClientSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DaemonSection {
    /// Directory holding one control socket per interface.
    #[serde(default = "default_control_dir")]
    pub control_dir: PathBuf,

    /// Wireless interface name (e.g., "wlan0").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            control_dir: default_control_dir(),
            interface: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientSection {
    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,

    /// Unset waits for a connect outcome indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            scan_timeout_ms: default_scan_timeout_ms(),
            connect_timeout_secs: None,
            event_buffer: default_event_buffer(),
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_control_dir() -> PathBuf {
    PathBuf::from("/var/run/wpa_supplicant")
}
fn default_scan_timeout_ms() -> u64 {
    2000
}
fn default_event_buffer() -> usize {
    SessionConfig::default().event_buffer
}
fn default_max_message_size() -> usize {
    SessionConfig::default().max_message_size
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate the `[client]` section and build the runtime config.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let client = &self.client;

        if client.scan_timeout_ms == 0 {
            return Err(invalid("client.scan_timeout_ms", "must be greater than zero"));
        }
        if client.connect_timeout_secs == Some(0) {
            return Err(invalid(
                "client.connect_timeout_secs",
                "must be greater than zero; leave unset to wait indefinitely",
            ));
        }
        if client.event_buffer == 0 {
            return Err(invalid("client.event_buffer", "must be greater than zero"));
        }
        if client.max_message_size == 0 {
            return Err(invalid("client.max_message_size", "must be greater than zero"));
        }

        Ok(ClientConfig {
            scan_timeout: Duration::from_millis(client.scan_timeout_ms),
            connect_timeout: client.connect_timeout_secs.map(Duration::from_secs),
            session: SessionConfig {
                event_buffer: client.event_buffer,
                max_message_size: client.max_message_size,
            },
        })
    }

    /// Path of the control socket for the configured interface.
    pub fn control_socket_path(&self) -> Result<PathBuf, ConfigError> {
        let interface = self
            .daemon
            .interface
            .as_deref()
            .ok_or_else(|| invalid("daemon.interface", "no interface configured"))?;

        if interface.is_empty() || interface.contains('/') {
            return Err(invalid(
                "daemon.interface",
                format!("'{interface}' is not an interface name"),
            ));
        }

        Ok(self.daemon.control_dir.join(interface))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "wpactl", "wpactl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wpactl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path` (if present), then environment.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&figment_for(&config_path()))
}

/// Extract a Config from an already assembled figment.
pub fn load_config_from(figment: &Figment) -> Result<Config, ConfigError> {
    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`, creating parents.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_translate() {
        assert_eq!(
            Config::default().client_config().ok(),
            Some(ClientConfig::default())
        );
    }

    #[test]
    fn zero_connect_timeout_rejected() {
        let mut cfg = Config::default();
        cfg.client.connect_timeout_secs = Some(0);
        assert!(matches!(
            cfg.client_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "client.connect_timeout_secs"
        ));
    }

    #[test]
    fn socket_path_needs_interface() {
        let mut cfg = Config::default();
        assert!(cfg.control_socket_path().is_err());

        cfg.daemon.interface = Some("wlan0".into());
        assert_eq!(
            cfg.control_socket_path().ok(),
            Some(PathBuf::from("/var/run/wpa_supplicant/wlan0"))
        );

        cfg.daemon.interface = Some("../wlan0".into());
        assert!(cfg.control_socket_path().is_err());
    }
}
