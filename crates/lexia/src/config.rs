//! Configuration stored in `lexia.yaml`.
//!
//! The file is optional; every field has a default. The path comes from
//! `--config`, then `LEXIA_CONFIG`, then `./lexia.yaml`. `LEXIA_TOKEN`
//! overrides the API token from the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lexia_table::{TableOptions, DEFAULT_PAGE_SIZE};
use lexia_validate::{Validator, DEFAULT_CACHE_CAPACITY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "lexia.yaml";
pub const CONFIG_ENV: &str = "LEXIA_CONFIG";
pub const TOKEN_ENV: &str = "LEXIA_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiaConfig {
    pub api: ApiConfig,
    pub table: TableConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub page_size: usize,
    /// Quiet period before a search term applies, in milliseconds.
    pub debounce_ms: u64,
    pub case_sensitive_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub cache_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1/".to_string(),
            token: None,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: 300,
            case_sensitive_search: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl LexiaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = url::Url::parse(&self.api.base_url) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url '{}' is not an absolute URL: {err}",
                self.api.base_url
            )));
        }
        if self.table.page_size == 0 {
            return Err(ConfigError::Invalid("table.page_size must be > 0".into()));
        }
        if self.validation.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "validation.cache_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Table defaults derived from this configuration.
    pub fn table_options(&self) -> TableOptions {
        TableOptions::new()
            .page_size(self.table.page_size)
            .debounce(Duration::from_millis(self.table.debounce_ms))
            .case_sensitive(self.table.case_sensitive_search)
    }

    /// An empty validator sized by this configuration.
    pub fn validator(&self) -> Validator {
        Validator::new().cache_capacity(self.validation.cache_capacity)
    }

    /// Applies environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.api.token = Some(token);
            }
        }
        self
    }
}

/// Picks the config path: explicit flag, then `LEXIA_CONFIG`, then the
/// default file name.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Loads and validates a config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<LexiaConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        let config = LexiaConfig::default().with_env();
        config.validate()?;
        return Ok(config);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: LexiaConfig = if contents.trim().is_empty() {
        LexiaConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    let config = config.with_env();
    config.validate()?;
    Ok(config)
}

/// Writes `config` to `path` as YAML, replacing the file.
pub fn save_config(path: &Path, config: &LexiaConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "saved configuration");
    Ok(())
}
