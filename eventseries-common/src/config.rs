//! Configuration loading and root folder resolution
//!
//! Configuration comes from a TOML file; every field has a compiled default so a
//! missing or partial file never prevents startup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "EVENTSERIES_ROOT_FOLDER";

/// Application name used for config and data directories
const APP_DIR: &str = "eventseries";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding query results, cache blobs and the optional database
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub completion: CompletionConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the completion cache is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// One JSON file per named blob
    #[default]
    File,
    /// Key-value table in a SQLite database
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
}

/// Canonical-title lookup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Maximum number of lookups in flight at once
    pub max_concurrent_lookups: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Rate limit per lookup source
    pub requests_per_second: u32,
    /// Structured volume metadata service
    pub ceurspt_base_url: String,
    /// Volume index site
    pub ceurws_base_url: String,
    /// Title words marking a proceeding as belonging to a yearly event
    pub annual_synonyms: Vec<String>,
}

/// Default words marking annual proceedings
pub fn default_annual_synonyms() -> Vec<String> {
    ["annual", "annually", "yearly"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 50,
            request_timeout_secs: 60,
            requests_per_second: 10,
            ceurspt_base_url: "http://ceurspt.wikidata.dbis.rwth-aachen.de".to_string(),
            ceurws_base_url: "https://ceur-ws.org".to_string(),
            annual_synonyms: default_annual_synonyms(),
        }
    }
}

/// Matcher cascade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Number of independent strategies that must agree on a pair
    pub required_to_pass: usize,
    /// Event count above which the DBLP matcher fans out over a thread pool
    pub parallel_threshold: usize,
    /// GloVe-format text file seeding the pretrained word-vector matchers
    pub pretrained_vectors: Option<PathBuf>,
    pub vector_dimensions: usize,
    pub training_epochs: usize,
    /// Use word n-grams instead of character n-grams
    pub word_wise_ngrams: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            required_to_pass: 3,
            parallel_threshold: 500,
            pretrained_vectors: None,
            vector_dimensions: 100,
            training_epochs: 5,
            word_wise_ngrams: false,
        }
    }
}

/// Default location of the configuration file for this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load configuration from a TOML file
///
/// # Errors
/// Fails if the file cannot be read or is not valid TOML.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load configuration, falling back to defaults
///
/// A missing file is expected on first run and only logged. An unreadable or
/// invalid file is logged as a warning; defaults are used in both cases.
pub fn load_or_default(path: Option<&Path>) -> TomlConfig {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using defaults");
            return TomlConfig::default();
        }
    };

    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return TomlConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        Err(e) => {
            warn!(error = %e, "Invalid configuration, using defaults");
            TomlConfig::default()
        }
    }
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable [`ROOT_FOLDER_ENV`]
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./eventseries_data"))
}

/// User-Agent sent with every outgoing HTTP request
pub fn get_user_agent() -> String {
    format!(
        "eventseries/{} (event series linking)",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.backend, CacheBackendKind::File);
        assert_eq!(config.completion.max_concurrent_lookups, 50);
        assert_eq!(config.matching.required_to_pass, 3);
        assert_eq!(config.matching.parallel_threshold, 500);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [matching]
            required_to_pass = 2

            [cache]
            backend = "sqlite"
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.required_to_pass, 2);
        assert_eq!(config.matching.parallel_threshold, 500);
        assert_eq!(config.cache.backend, CacheBackendKind::Sqlite);
        assert_eq!(config.completion.request_timeout_secs, 60);
        assert_eq!(config.completion.annual_synonyms, default_annual_synonyms());
    }

    #[test]
    fn test_user_agent_format() {
        assert!(get_user_agent().starts_with("eventseries/"));
    }
}
