//! Bootstrap configuration and data path resolution
//!
//! Settings come from, in priority order:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the service starts on defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::filter::QualityScale;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_RESULT_CAP: usize = 500;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

pub const ENV_PORT: &str = "DINAMIQUES_PORT";
pub const ENV_CONFIG: &str = "DINAMIQUES_CONFIG";
pub const ENV_DATA: &str = "DINAMIQUES_DATA";

const APP_DIR: &str = "dinamiques";
const CONFIG_FILE: &str = "config.toml";
const DATA_FILE: &str = "dinamiques.json";

/// Where the catalog loads its dynamics from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A JSON document on disk or behind a URL
    #[default]
    Static,
    /// A remote catalog API
    Api,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Document URL (static) or API base URL (api)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Catalog document (static source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,

    /// Favorites store; favorites are kept in memory only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites_path: Option<PathBuf>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Most dynamics returned by one listing request
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,

    #[serde(default)]
    pub quality_scale: QualityScale,

    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            favorites_path: None,
            port: DEFAULT_PORT,
            bind_address: default_bind_address(),
            page_size: DEFAULT_PAGE_SIZE,
            result_cap: DEFAULT_RESULT_CAP,
            quality_scale: QualityScale::default(),
            search_debounce_ms: DEFAULT_DEBOUNCE_MS,
            logging: LoggingConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_result_cap() -> usize {
    DEFAULT_RESULT_CAP
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }
        if self.result_cap == 0 {
            return Err(Error::Config("result_cap must be at least 1".to_string()));
        }
        if self.source.kind == SourceKind::Api && self.source.url.is_none() {
            return Err(Error::Config("source.kind = \"api\" requires source.url".to_string()));
        }
        Ok(())
    }
}

/// Locate the configuration file
///
/// Tries `<config_dir>/dinamiques/config.toml`, then
/// `/etc/dinamiques/config.toml` on Linux.
pub fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Read and validate a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration file, falling back to defaults when there is none
///
/// An explicitly named file that cannot be read is still an error; only the
/// implicit search may come up empty.
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(path) => path,
            None => {
                warn!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };
    let config = load_toml_config(&path)?;
    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Write data to `path` through a sibling temp file and a rename
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).ok_or_else(|| {
        Error::InvalidInput(format!("{} has no file name", path.display()))
    })?;
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, content)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Write a configuration file atomically (temp file + rename)
///
/// On Unix the file is restricted to its owner.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize TOML: {}", e)))?;
    atomic_write(path, content.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Data path resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML `data_path`
/// 4. `<data_dir>/dinamiques/dinamiques.json`, or `./dinamiques.json`
pub fn resolve_data_path(cli_arg: Option<&Path>, env_var_name: &str, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(path) = &config.data_path {
        return path.clone();
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join(DATA_FILE))
        .unwrap_or_else(|| PathBuf::from(DATA_FILE))
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub data_path: Option<PathBuf>,
    pub quality_scale: Option<QualityScale>,
}

/// Effective settings after applying every configuration layer
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub favorites_path: Option<PathBuf>,
    pub port: u16,
    pub bind_address: String,
    pub page_size: usize,
    pub result_cap: usize,
    pub quality_scale: QualityScale,
    pub search_debounce: Duration,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn resolve(config: TomlConfig, overrides: ConfigOverrides) -> Self {
        let data_path = resolve_data_path(overrides.data_path.as_deref(), ENV_DATA, &config);
        Self {
            data_path,
            favorites_path: config.favorites_path,
            port: overrides.port.unwrap_or(config.port),
            bind_address: config.bind_address,
            page_size: config.page_size,
            result_cap: config.result_cap,
            quality_scale: overrides.quality_scale.unwrap_or(config.quality_scale),
            search_debounce: Duration::from_millis(config.search_debounce_ms),
            source: config.source,
            logging: config.logging,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.quality_scale, QualityScale::TenPoint);
    }

    #[test]
    fn test_parse_sections() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 6000
            quality_scale = 5
            [logging]
            level = "debug"
            [source]
            kind = "api"
            url = "http://localhost:3000"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.quality_scale, QualityScale::FivePoint);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.source.kind, SourceKind::Api);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_quality_scale_rejected() {
        assert!(toml::from_str::<TomlConfig>("quality_scale = 7").is_err());
    }

    #[test]
    fn test_api_source_requires_url() {
        let config = TomlConfig {
            source: SourceConfig { kind: SourceKind::Api, url: None },
            ..TomlConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = TomlConfig {
            port: 6000,
            data_path: Some(PathBuf::from("/srv/toml.json")),
            ..TomlConfig::default()
        };
        let settings = Settings::resolve(
            config,
            ConfigOverrides {
                port: Some(7000),
                data_path: Some(PathBuf::from("/tmp/cli.json")),
                quality_scale: Some(QualityScale::FivePoint),
            },
        );
        assert_eq!(settings.port, 7000);
        assert_eq!(settings.data_path, PathBuf::from("/tmp/cli.json"));
        assert_eq!(settings.quality_scale, QualityScale::FivePoint);
        assert_eq!(settings.bind_addr(), "127.0.0.1:7000");
    }
}
