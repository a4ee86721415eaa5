//! Configuration loading.
//!
//! `Config` is what the TOML file says; `Settings` is the resolved runtime
//! view after defaults, the config file, environment and CLI flags.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::Site;
use crate::rate_limit::{BoxedPacer, TokenBucket};
use crate::scrapers::{CatalogError, CatalogOverrides, OrderCatalog, SiteRegistry};
use crate::storage::{
    BoxedStore, FallbackStore, FileStore, MemoryStore, RecordStore, SqliteStore,
};

/// Config file looked for in the working directory.
pub const LOCAL_CONFIG_FILENAME: &str = "cartscrape.toml";
/// Primary store file inside the data directory.
pub const DEFAULT_STORE_FILENAME: &str = "cartscrape.json";
/// Secondary store database inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "cartscrape.db";
/// Export subdirectory inside the data directory.
const EXPORTS_SUBDIR: &str = "exports";

pub const ENV_DATA_DIR: &str = "CARTSCRAPE_DATA_DIR";
pub const ENV_USER_AGENT: &str = "CARTSCRAPE_USER_AGENT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Bulk run tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Items fetched concurrently per chunk.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Minimum spacing between chunk starts.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

fn default_batch_size() -> usize {
    crate::pipeline::DEFAULT_BATCH_SIZE
}

fn default_chunk_delay_ms() -> u64 {
    2000
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
        }
    }
}

/// Contents of a config file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Data directory; relative paths resolve against the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    /// User agent: a literal string, or "impersonate" for a browser one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// HTTP request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default)]
    pub bulk: BulkConfig,
    /// Per-site selector overrides; each field replaces the built-in list.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sites: HashMap<Site, CatalogOverrides>,
    /// Replacement order page catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<OrderCatalog>,

    /// Path this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Find and load a config file: `explicit`, then `./cartscrape.toml`,
    /// then the user config directory. No file at all yields defaults; an
    /// explicit path that cannot be read is an error.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path).await;
        }
        for candidate in Self::candidates() {
            if candidate.is_file() {
                return Self::load_from_path(&candidate).await;
            }
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILENAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("cartscrape").join("config.toml"));
        }
        paths
    }

    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source_path = Some(path.to_path_buf());
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Directory relative paths resolve against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let path = expand_tilde(path_str);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    /// Resolve into settings, applying environment overrides on top.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let base_dir = self.base_dir().unwrap_or_else(|| PathBuf::from("."));
        let mut settings = Settings::default();

        if let Some(dir) = &self.data_dir {
            settings.set_data_dir(self.resolve_path(dir, &base_dir));
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                settings.set_data_dir(expand_tilde(&dir));
            }
        }
        if let Some(name) = &self.store_file {
            settings.store_filename = name.clone();
        }
        if let Some(name) = &self.database_file {
            settings.database_filename = name.clone();
        }
        if let Some(dir) = &self.export_dir {
            settings.export_dir = self.resolve_path(dir, &base_dir);
        }
        settings.user_agent = std::env::var(ENV_USER_AGENT)
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .or(self.user_agent);
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        settings.bulk = self.bulk;
        settings.sites = self.sites;
        settings.orders = self.orders;

        settings.validate()?;
        Ok(settings)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| (path == "~").then_some("")) {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Primary store filename, inside `data_dir`.
    pub store_filename: String,
    /// Secondary store filename, inside `data_dir`.
    pub database_filename: String,
    /// Where exports are written.
    pub export_dir: PathBuf,
    /// User agent config (None = default, "impersonate", or literal).
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    pub bulk: BulkConfig,
    pub sites: HashMap<Site, CatalogOverrides>,
    pub orders: Option<OrderCatalog>,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cartscrape");

        Self {
            export_dir: data_dir.join(EXPORTS_SUBDIR),
            data_dir,
            store_filename: DEFAULT_STORE_FILENAME.to_string(),
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            user_agent: None,
            request_timeout: 30,
            bulk: BulkConfig::default(),
            sites: HashMap::new(),
            orders: None,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let mut settings = Self::default();
        settings.set_data_dir(data_dir);
        settings
    }

    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.export_dir = data_dir.join(EXPORTS_SUBDIR);
        self.data_dir = data_dir;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bulk.batch_size == 0 {
            return Err(ConfigError::Invalid("bulk.batch_size must be at least 1".into()));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Invalid("request_timeout must be at least 1".into()));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_filename)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Open the record store: JSON file first, SQLite second. If the
    /// database cannot be opened the secondary tier is kept in memory.
    pub fn open_store(&self) -> RecordStore {
        let primary: BoxedStore = Arc::new(FileStore::new(self.store_path()));
        let secondary: BoxedStore = match SqliteStore::new(&self.database_path()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(
                    "Secondary store {} unavailable, using memory: {}",
                    self.database_path().display(),
                    e
                );
                Arc::new(MemoryStore::new())
            }
        };
        RecordStore::new(FallbackStore::new(primary, secondary))
    }

    /// Site adapters with configured selector overrides.
    pub fn registry(&self) -> Result<SiteRegistry, CatalogError> {
        SiteRegistry::with_overrides(&self.sites)
    }

    pub fn order_catalog(&self) -> OrderCatalog {
        self.orders.clone().unwrap_or_else(OrderCatalog::builtin)
    }

    /// Chunk pacer for bulk runs.
    pub fn pacer(&self) -> BoxedPacer {
        Arc::new(TokenBucket::per_interval(Duration::from_millis(
            self.bulk.chunk_delay_ms,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::FieldRule;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartscrape.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bulk.batch_size, 3);
        assert_eq!(settings.bulk.chunk_delay_ms, 2000);
        assert!(settings.data_dir.ends_with("cartscrape"));
        assert!(settings.export_dir.starts_with(&settings.data_dir));
    }

    #[tokio::test]
    async fn test_load_full_config() {
        let (dir, path) = write_config(
            r#"
            data_dir = "data"
            request_timeout = 10
            user_agent = "impersonate"

            [bulk]
            batch_size = 5

            [sites.amazon]
            title = ["h1.custom", { selector = "meta[name='t']", attr = "content" }]
            "#,
        );
        let config = Config::load(Some(&path)).await.unwrap();
        let settings = config.into_settings().unwrap();

        assert_eq!(settings.data_dir, dir.path().join("data"));
        assert_eq!(settings.request_timeout, 10);
        assert_eq!(settings.bulk.batch_size, 5);
        assert_eq!(settings.bulk.chunk_delay_ms, 2000);
        let amazon = settings.sites.get(&Site::Amazon).unwrap();
        assert_eq!(
            amazon.title.as_deref(),
            Some(&[FieldRule::text("h1.custom"), FieldRule::attr("meta[name='t']", "content")][..])
        );
        assert!(settings.registry().is_ok());
    }

    #[tokio::test]
    async fn test_store_names_and_export_dir() {
        let (dir, path) = write_config(
            r#"
            store_file = "records.json"
            database_file = "records.db"
            export_dir = "out"
            "#,
        );
        let config = Config::load(Some(&path)).await.unwrap();
        let settings = config.into_settings().unwrap();

        assert_eq!(settings.store_filename, "records.json");
        assert_eq!(settings.database_filename, "records.db");
        assert_eq!(settings.export_dir, dir.path().join("out"));
        assert!(settings.store_path().ends_with("records.json"));
        assert!(settings.database_path().ends_with("records.db"));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_invalid() {
        let (_dir, path) = write_config("[bulk]\nbatch_size = 0\n");
        let config = Config::load(Some(&path)).await.unwrap();
        assert!(matches!(config.into_settings(), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_unknown_site_is_a_parse_error() {
        let (_dir, path) = write_config("[sites.walmart]\ntitle = [\"h1\"]\n");
        assert!(matches!(
            Config::load(Some(&path)).await,
            Err(ConfigError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_explicit_config_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/cartscrape.toml"))).await;
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x"), home.join("x"));
        }
        assert_eq!(expand_tilde("/abs"), PathBuf::from("/abs"));
    }
}
