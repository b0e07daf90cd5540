//! Process-wide configuration, produced once at startup.
//!
//! Values come from an optional TOML file and are then overridden by
//! `APPSHELF_*` environment variables. The resulting [`AppConfig`] is
//! passed by reference into the components that need it; nothing reads
//! configuration from ambient globals after startup.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::StoreError;
use crate::sandbox::SandboxConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "appshelf.toml";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Enables permissive CORS for a separately served frontend.
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3150,
            dev_mode: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection settings for the remote document store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Backend selection input for the artifact store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryConfig {
    pub remote: Option<RemoteConfig>,
}

impl RepositoryConfig {
    /// Configuration that always selects the local fallback backend.
    pub fn fallback_only() -> Self {
        Self { remote: None }
    }

    pub fn with_remote(remote: RemoteConfig) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    /// Returns the remote settings if they are complete.
    pub fn remote_settings(&self) -> Result<&RemoteConfig, StoreError> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| StoreError::Config("no database URL configured".to_string()))?;

        let url = remote.database_url.trim();
        if url.is_empty() {
            return Err(StoreError::Config("database URL is empty".to_string()));
        }
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(StoreError::Config(
                "database URL must use the postgres:// scheme".to_string(),
            ));
        }
        if remote.max_connections == 0 {
            return Err(StoreError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        Ok(remote)
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub repository: RepositoryConfig,
    pub sandbox: SandboxConfig,
}

/// Raw TOML structure for `appshelf.toml`
#[derive(Debug, Deserialize)]
struct AppToml {
    server: Option<ServerSection>,
    repository: Option<RepositorySection>,
    sandbox: Option<SandboxSection>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
    dev_mode: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RepositorySection {
    database_url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SandboxSection {
    program: Option<String>,
    args: Option<Vec<String>>,
    timeout_ms: Option<u64>,
    max_output_bytes: Option<usize>,
    max_concurrent: Option<usize>,
    env: Option<HashMap<String, String>>,
}

impl AppConfig {
    /// Load configuration from `path`, or from `appshelf.toml` in the working
    /// directory when no path is given. A missing default file yields defaults;
    /// a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                Self::load(Some(default_path))
            }
        }
    }

    /// Parse configuration from TOML text, filling gaps with defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml: AppToml = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(section) = toml.server {
            if let Some(host) = section.host {
                config.server.host = host;
            }
            if let Some(port) = section.port {
                config.server.port = port;
            }
            if let Some(dev_mode) = section.dev_mode {
                config.server.dev_mode = dev_mode;
            }
        }

        if let Some(section) = toml.repository {
            if let Some(url) = section.database_url {
                let mut remote = RemoteConfig::new(url);
                if let Some(max) = section.max_connections {
                    remote.max_connections = max;
                }
                if let Some(timeout) = section.connect_timeout_secs {
                    remote.connect_timeout_secs = timeout;
                }
                config.repository.remote = Some(remote);
            }
        }

        if let Some(section) = toml.sandbox {
            if let Some(program) = section.program {
                config.sandbox.program = program;
            }
            if let Some(args) = section.args {
                config.sandbox.args = args;
            }
            if let Some(timeout_ms) = section.timeout_ms {
                config.sandbox.timeout_ms = timeout_ms;
            }
            if let Some(max) = section.max_output_bytes {
                config.sandbox.max_output_bytes = max;
            }
            if let Some(max) = section.max_concurrent {
                config.sandbox.max_concurrent = max;
            }
            if let Some(env) = section.env {
                config.sandbox.env = env;
            }
        }

        Ok(config)
    }

    /// Apply `APPSHELF_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("APPSHELF_DATABASE_URL") {
            let mut remote = self
                .repository
                .remote
                .take()
                .unwrap_or_else(|| RemoteConfig::new(String::new()));
            remote.database_url = url;
            self.repository.remote = Some(remote);
        }
        if let Some(host) = lookup("APPSHELF_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("APPSHELF_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid APPSHELF_PORT '{}'", port))?;
        }
        if let Some(program) = lookup("APPSHELF_SANDBOX_PROGRAM") {
            self.sandbox.program = program;
        }
        if let Some(timeout) = lookup("APPSHELF_SANDBOX_TIMEOUT_MS") {
            self.sandbox.timeout_ms = timeout
                .parse()
                .with_context(|| format!("Invalid APPSHELF_SANDBOX_TIMEOUT_MS '{}'", timeout))?;
        }
        if let Some(max) = lookup("APPSHELF_SANDBOX_MAX_CONCURRENT") {
            self.sandbox.max_concurrent = max
                .parse()
                .with_context(|| format!("Invalid APPSHELF_SANDBOX_MAX_CONCURRENT '{}'", max))?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:3150");
        assert!(!config.server.dev_mode);
        assert!(config.repository.remote.is_none());
        assert_eq!(config.sandbox.timeout_ms, 2000);
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appshelf.toml");
        fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 8080
dev_mode = true

[repository]
database_url = "postgres://localhost/appshelf"
max_connections = 4

[sandbox]
program = "/usr/bin/node"
timeout_ms = 500
max_concurrent = 2

[sandbox.env]
PATH = "/usr/bin"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert!(config.server.dev_mode);
        let remote = config.repository.remote_settings().unwrap();
        assert_eq!(remote.database_url, "postgres://localhost/appshelf");
        assert_eq!(remote.max_connections, 4);
        assert_eq!(remote.connect_timeout_secs, 5);
        assert_eq!(config.sandbox.program, "/usr/bin/node");
        assert_eq!(config.sandbox.timeout_ms, 500);
        assert_eq!(config.sandbox.max_concurrent, 2);
        assert_eq!(config.sandbox.env.get("PATH").unwrap(), "/usr/bin");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_invalid_toml_fails() {
        assert!(AppConfig::from_toml_str("not valid toml {{{{").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let config = AppConfig::from_toml_str("[server]\nport = 9000\n")
            .unwrap()
            .apply_env(env_from(&[
                ("APPSHELF_PORT", "9100"),
                ("APPSHELF_DATABASE_URL", "postgresql://db/apps"),
                ("APPSHELF_SANDBOX_TIMEOUT_MS", "750"),
                ("APPSHELF_SANDBOX_MAX_CONCURRENT", "8"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.sandbox.timeout_ms, 750);
        assert_eq!(config.sandbox.max_concurrent, 8);
        assert!(config.repository.remote_settings().is_ok());
    }

    #[test]
    fn test_invalid_port_env_fails() {
        let result = AppConfig::default().apply_env(env_from(&[("APPSHELF_PORT", "eighty")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_remote_is_config_error() {
        let err = RepositoryConfig::fallback_only().remote_settings().unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_non_postgres_url_is_config_error() {
        let config = RepositoryConfig::with_remote(RemoteConfig::new("mysql://localhost/apps"));
        let err = config.remote_settings().unwrap_err();
        assert!(err.to_string().contains("postgres://"));
    }

    #[test]
    fn test_empty_url_is_config_error() {
        let config = RepositoryConfig::with_remote(RemoteConfig::new("  "));
        assert!(matches!(config.remote_settings(), Err(StoreError::Config(_))));
    }
}
