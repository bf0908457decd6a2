//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `NWA_`, nested keys separated by `__`)
//! 2. Current working directory: ./nwa.toml
//! 3. XDG config directory: ~/.config/nwa/nwa.toml
//! 4. System directory: /etc/nwa/nwa.toml
//! 5. Default values
//!
//! For example `NWA_API__BACKEND_URL=https://orchestrator.example.net` overrides
//! `api.backend_url`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

const CONFIG_FILE: &str = "nwa.toml";
const XDG_PREFIX: &str = "nwa";
const ENV_PREFIX: &str = "NWA_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Process-level settings
    pub service: ServiceConfig,

    /// Backend API settings
    pub api: ApiConfig,

    /// Table behaviour
    #[serde(default)]
    pub table: TableConfig,
}

/// Process-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name used in logs
    pub name: String,

    /// Log filter (trace, debug, info, warn, error, or an `EnvFilter` directive)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON logs instead of human-readable ones
    #[serde(default = "default_false")]
    pub json_logs: bool,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://orchestrator.example.net`
    pub backend_url: String,

    /// Path prefix placed between the origin and collection paths
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    /// Request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Rows per page for a freshly mounted table
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Quiet period for free-text filter input, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl TableConfig {
    /// Debounce quiet period as Duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("nwa-table/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_size() -> u64 {
    25
}

fn default_debounce_ms() -> u64 {
    300
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Files are merged lowest priority first so that higher priority files
    /// override lower ones. Environment variables override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// This bypasses the search path. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Config file locations, highest priority first
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX);
        if let Some(path) = xdg_dirs.find_config_file(CONFIG_FILE) {
            paths.push(path);
        }

        paths.push(Path::new("/etc").join(XDG_PREFIX).join(CONFIG_FILE));

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "nwa".to_string(),
                log_level: default_log_level(),
                json_logs: default_false(),
                environment: default_environment(),
            },
            api: ApiConfig {
                backend_url: "http://localhost:8080".to_string(),
                api_prefix: default_api_prefix(),
                timeout_secs: default_timeout(),
                user_agent: default_user_agent(),
            },
            table: TableConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.api_prefix, "/api/");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.table.default_page_size, 25);
        assert_eq!(config.table.debounce(), Duration::from_millis(300));
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
backend_url = "https://orchestrator.example.net"
timeout_secs = 5

[table]
debounce_ms = 150
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.api.backend_url, "https://orchestrator.example.net");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.api_prefix, "/api/");
        assert_eq!(config.table.debounce_ms, 150);
        assert_eq!(config.table.default_page_size, 25);
        assert_eq!(config.service.name, "nwa");
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = Config::load_from("/nonexistent/nwa.toml").unwrap();
        assert_eq!(config.api.backend_url, "http://localhost:8080");
    }
}
