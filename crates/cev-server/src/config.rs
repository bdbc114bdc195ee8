//! Server configuration: built-in defaults, optional TOML file, CLI
//! overrides. Later layers win.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn load(
        path: Option<&Path>,
        bind_override: Option<String>,
        port_override: Option<u16>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("invalid config file: {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Some(bind) = bind_override {
            config.bind = bind;
        }
        if let Some(port) = port_override {
            config.port = port;
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address '{}:{}'", self.bind, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_no_file_given() {
        let config = ServerConfig::load(None, None, None).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn file_values_replace_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"127.0.0.1\"\nport = 9001").unwrap();
        let config = ServerConfig::load(Some(file.path()), None, None).unwrap();
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9002").unwrap();
        let config = ServerConfig::load(Some(file.path()), None, None).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.port, 9002);
    }

    #[test]
    fn cli_overrides_beat_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"127.0.0.1\"\nport = 9001").unwrap();
        let config =
            ServerConfig::load(Some(file.path()), Some("0.0.0.0".to_string()), Some(9100)).unwrap();
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot = 9001").unwrap();
        assert!(ServerConfig::load(Some(file.path()), None, None).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = ServerConfig::load(Some(Path::new("/nonexistent/config.toml")), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn socket_addr_parses() {
        let config = ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        };
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn socket_addr_rejects_garbage() {
        let config = ServerConfig {
            bind: "not-an-address".to_string(),
            port: 8000,
        };
        assert!(config.socket_addr().is_err());
    }
}
