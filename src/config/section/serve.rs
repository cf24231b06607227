//! `[serve]` section configuration.
//!
//! Contains local proxy and live-reload settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # Proxy HTTP port
//! ws_port = 35729             # Live-reload WebSocket port
//! proxy = true                # Run the storefront proxy during `watch`
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Local server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// Proxy HTTP port number.
    pub port: u16,

    /// Live-reload WebSocket port number.
    pub ws_port: u16,

    /// Run the storefront proxy.
    pub proxy: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
            proxy: true,
        }
    }
}

impl ServeConfig {
    pub const WS_PORT: FieldPath = FieldPath::new("serve.ws_port");

    /// Checked for `watch` only: proxy and WebSocket need distinct base ports.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.proxy && self.port == self.ws_port {
            diag.error_with_hint(
                Self::WS_PORT,
                format!("ws_port {} is also the proxy port", self.ws_port),
                "pick distinct ports, or pass --no-proxy",
            );
        }
    }
}
