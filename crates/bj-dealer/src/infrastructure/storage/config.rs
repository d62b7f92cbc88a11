//! TOML-based configuration for the dealer.
//!
//! The dealer runs fine with no file at all; `--config <PATH>` points it at
//! one when the defaults need changing.  Example:
//!
//! ```toml
//! [dealer]
//! server_name = "MyBlackJackDealer"
//! read_timeout_secs = 60
//! round_pause_ms = 1000
//!
//! [network]
//! bind_address = "0.0.0.0"
//! tcp_port = 0
//! discovery_port = 13122
//! broadcast_address = "255.255.255.255"
//! broadcast_interval_ms = 1000
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so a file may
//! contain only the keys it wants to override.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bj_core::protocol::messages::DISCOVERY_PORT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::SessionSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but cannot be used.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level dealer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DealerConfig {
    #[serde(default)]
    pub dealer: DealerSection,
    #[serde(default)]
    pub network: NetworkSection,
}

/// Game behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealerSection {
    /// Name advertised in every Offer.  Truncated to 32 bytes on the wire.
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Idle limit for each blocking read from a player.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Pause before each deal and before the dealer's reveal.  `0` disables it.
    #[serde(default = "default_round_pause_ms")]
    pub round_pause_ms: u64,
    /// Fixed shuffle seed.  Connection N shuffles with `seed + N`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
}

/// Socket settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// Address for the TCP listener.  `0.0.0.0` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// TCP port; `0` lets the OS pick one, which the Offer then advertises.
    #[serde(default)]
    pub tcp_port: u16,
    /// UDP port players listen on for Offers.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// Destination address for Offers.
    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: IpAddr,
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_server_name() -> String {
    "MyBlackJackDealer".to_string()
}
fn default_read_timeout_secs() -> u64 {
    60
}
fn default_round_pause_ms() -> u64 {
    1000
}
fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_discovery_port() -> u16 {
    DISCOVERY_PORT
}
fn default_broadcast_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::BROADCAST)
}
fn default_broadcast_interval_ms() -> u64 {
    1000
}

impl Default for DealerSection {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            read_timeout_secs: default_read_timeout_secs(),
            round_pause_ms: default_round_pause_ms(),
            shuffle_seed: None,
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            tcp_port: 0,
            discovery_port: default_discovery_port(),
            broadcast_address: default_broadcast_address(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl DealerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// when a value fails [`DealerConfig::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: DealerConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values the dealer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dealer.server_name.trim().is_empty() {
            return Err(ConfigError::Invalid("server_name must not be empty".into()));
        }
        if self.dealer.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_secs must be at least 1".into(),
            ));
        }
        if self.network.broadcast_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "broadcast_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.network.bind_address, self.network.tcp_port)
    }

    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddr::new(self.network.broadcast_address, self.network.discovery_port)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.network.broadcast_interval_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            read_timeout: Duration::from_secs(self.dealer.read_timeout_secs),
            round_pause: Duration::from_millis(self.dealer.round_pause_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads and validates `DealerConfig` from `path`.
///
/// Unlike a first-run settings file, an explicitly named config that does
/// not exist is an error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
/// errors of [`DealerConfig::from_toml_str`].
pub fn load_config(path: &Path) -> Result<DealerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    DealerConfig::from_toml_str(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
