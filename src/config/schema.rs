//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sni::AdapterSettings;

/// Root of the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listener, certificate, logging and adapter selection.
    pub server: ServerConfig,

    /// Per-adapter settings tables, keyed by lower-cased adapter name.
    pub adapters: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    /// Resolve the file layout into the value the server consumes.
    ///
    /// The adapter name is lower-cased and its settings are taken from the
    /// `[adapters.<name>]` table, if present.
    pub fn into_server_config(self) -> ServerConfig {
        let mut server = self.server;
        server.sni_adapter = server.sni_adapter.trim().to_lowercase();

        if !server.sni_adapter.is_empty() {
            if let Some(settings) = self.adapters.get(&server.sni_adapter) {
                server
                    .sni_adapter_settings
                    .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }

        server
    }
}

/// Everything needed to build a `Server`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` for TCP transports, a filesystem path for Unix ones.
    pub address: String,

    /// Socket type to listen on.
    #[serde(rename = "type")]
    pub transport: Transport,

    /// Default certificate file (PEM).
    pub certificate: PathBuf,

    /// Private key for the default certificate (PEM).
    pub key: PathBuf,

    /// `stdout`, or a file path opened for appending.
    pub log: String,

    /// Registered adapter name; empty disables SNI selection.
    pub sni_adapter: String,

    /// Adapter-specific settings, filled from `[adapters.<name>]`.
    #[serde(skip)]
    pub sni_adapter_settings: AdapterSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:443".to_string(),
            transport: Transport::Tcp4,
            certificate: PathBuf::new(),
            key: PathBuf::new(),
            log: "stdout".to_string(),
            sni_adapter: String::new(),
            sni_adapter_settings: AdapterSettings::new(),
        }
    }
}

/// Listening socket type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// TCP over IPv4 or IPv6.
    Tcp,
    /// TCP over IPv4 only.
    #[default]
    Tcp4,
    /// TCP over IPv6 only.
    Tcp6,
    /// Unix-domain stream socket.
    Unix,
    /// Unix-domain sequenced-packet socket.
    Unixpacket,
    /// Unix-domain datagram socket.
    Unixgram,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Tcp4 => "tcp4",
            Transport::Tcp6 => "tcp6",
            Transport::Unix => "unix",
            Transport::Unixpacket => "unixpacket",
            Transport::Unixgram => "unixgram",
        }
    }

    pub fn is_unix(&self) -> bool {
        matches!(
            self,
            Transport::Unix | Transport::Unixpacket | Transport::Unixgram
        )
    }

    /// Whether a resolved socket address is usable with this transport.
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Transport::Tcp => true,
            Transport::Tcp4 => addr.is_ipv4(),
            Transport::Tcp6 => addr.is_ipv6(),
            _ => false,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
