use serde::{Deserialize, Serialize};

use crate::types::ByteSize;

/// HTTP ingress settings, deserialized from `[server]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `"tcp://127.0.0.1:8080"`.
    pub listen: String,
    /// Route that accepts event batches.
    pub path: String,
    /// Upper bound on a single request body.
    pub max_body_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "tcp://localhost:8080".to_string(),
            path: "/user/event".to_string(),
            max_body_bytes: ByteSize::from(16 * 1024 * 1024),
        }
    }
}

impl ServerConfig {
    /// Replace the host part of `listen`, keeping the port.
    pub fn set_host(&mut self, host: &str) {
        let port = self.port().unwrap_or(8080);
        self.listen = format!("tcp://{host}:{port}");
    }

    /// Replace the port part of `listen`, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = self.host().unwrap_or("localhost").to_string();
        self.listen = format!("tcp://{host}:{port}");
    }

    fn authority(&self) -> &str {
        self.listen.strip_prefix("tcp://").unwrap_or(&self.listen)
    }

    fn host(&self) -> Option<&str> {
        self.authority().rsplit_once(':').map(|(host, _)| host)
    }

    fn port(&self) -> Option<u16> {
        self.authority()
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_override_keeps_port() {
        let mut cfg = ServerConfig {
            listen: "tcp://127.0.0.1:9900".into(),
            ..ServerConfig::default()
        };
        cfg.set_host("0.0.0.0");
        assert_eq!(cfg.listen, "tcp://0.0.0.0:9900");
    }

    #[test]
    fn port_override_keeps_host() {
        let mut cfg = ServerConfig::default();
        cfg.set_port(0);
        assert_eq!(cfg.listen, "tcp://localhost:0");
    }
}
