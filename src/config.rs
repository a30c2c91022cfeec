//! Rate source configuration
//!
//! Read from an optional TOML file, then overridden by the environment:
//!
//! ```toml
//! cache_dir = "/var/cache/dmon"
//! repo_dir = "/home/me/src/exchange-rates"
//! api_key = "..."
//! prefetch_delay_ms = 1000
//! ```
//!
//! | Variable | Field |
//! |---|---|
//! | `DMON_RATES_CACHE` | `cache_dir` |
//! | `DMON_RATES_REPO` | `repo_dir` |
//! | `DMON_EXCHANGERATE_API_KEY` | `api_key` |

use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use crate::rates::api::EXCHANGERATE_API_URL;
use crate::rates::base::DEFAULT_BASE_CURRENCY;
use crate::rates::prefetch::{PrefetchOptions, DEFAULT_PREFETCH_DELAY};
use crate::rates::snapshot::{SnapshotRepo, SyncMode};
use crate::rates::store::{RateStore, CACHE_FILE_NAME};
use crate::rates::tiered::TieredRateSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_RATES_CACHE: &str = "DMON_RATES_CACHE";
pub const ENV_RATES_REPO: &str = "DMON_RATES_REPO";
pub const ENV_API_KEY: &str = "DMON_EXCHANGERATE_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub cache_dir: PathBuf,
    pub repo_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub base_currency: Currency,
    pub prefetch_delay_ms: u64,
    pub git_sync: bool,
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `~/.dmon/cache`
pub fn default_cache_dir() -> PathBuf {
    home_dir().join(".dmon").join("cache")
}

/// `~/.dmon/config.toml`
pub fn default_config_path() -> PathBuf {
    home_dir().join(".dmon").join("config.toml")
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            repo_dir: None,
            api_key: None,
            api_base_url: EXCHANGERATE_API_URL.to_string(),
            base_currency: DEFAULT_BASE_CURRENCY,
            prefetch_delay_ms: DEFAULT_PREFETCH_DELAY.as_millis() as u64,
            git_sync: true,
        }
    }
}

impl RatesConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MoneyError::ConfigError(format!("Invalid config: {}", e)))
    }

    /// Load `path`, or `~/.dmon/config.toml` when it exists, then apply the
    /// environment. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    MoneyError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&text)?
            }
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    log::debug!("Loading config from {}", default_path.display());
                    Self::from_toml(&fs::read_to_string(&default_path)?)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.apply_env(|name| std::env::var(name).ok()))
    }

    /// Override fields from environment variables looked up via `lookup`.
    /// Blank values are ignored.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = var(ENV_RATES_CACHE) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var(ENV_RATES_REPO) {
            self.repo_dir = Some(PathBuf::from(dir));
        }
        if let Some(key) = var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        self
    }

    /// `<cache_dir>/exchange-rates.db`
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE_NAME)
    }

    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms)
    }

    /// Pre-fetch options using the configured delay and base currency
    pub fn prefetch_options(&self) -> PrefetchOptions {
        PrefetchOptions {
            delay: self.prefetch_delay(),
            currencies: vec![self.base_currency],
            ..PrefetchOptions::default()
        }
    }

    /// Persistent store under `cache_dir`
    #[cfg(feature = "rusqlite-support")]
    pub fn open_store(&self) -> Result<Arc<dyn RateStore>> {
        let store = crate::rates::sqlite::SqliteRateStore::open_dir(&self.cache_dir)?;
        Ok(Arc::new(store))
    }

    /// Without SQLite support rates are cached for the life of the process
    #[cfg(not(feature = "rusqlite-support"))]
    pub fn open_store(&self) -> Result<Arc<dyn RateStore>> {
        Ok(Arc::new(crate::rates::store::MemoryRateStore::new()))
    }

    /// Snapshot repository, when a repository directory is set
    pub fn snapshot_repo(&self) -> Option<SnapshotRepo> {
        let sync = if self.git_sync {
            SyncMode::Git
        } else {
            SyncMode::Disabled
        };
        self.repo_dir
            .as_ref()
            .map(|dir| SnapshotRepo::new(dir).with_sync(sync))
    }

    #[cfg(feature = "api")]
    pub fn rate_api(&self) -> Result<crate::rates::api::ExchangeRateApi> {
        Ok(crate::rates::api::ExchangeRateApi::new(self.api_key.clone())?
            .with_base_url(self.api_base_url.clone())
            .with_base_currency(self.base_currency))
    }

    /// Tiered source over the configured cache, snapshot repository and API
    pub fn build_source(&self) -> Result<TieredRateSource> {
        self.build_source_with_store(self.open_store()?)
    }

    /// Tiered source over an already opened store
    pub fn build_source_with_store(&self, store: Arc<dyn RateStore>) -> Result<TieredRateSource> {
        let mut source = TieredRateSource::new().with_store(store);
        if let Some(repo) = self.snapshot_repo() {
            source = source.with_snapshots(repo);
        }
        #[cfg(feature = "api")]
        {
            source = source.with_api(Box::new(self.rate_api()?));
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RatesConfig::default();
        assert!(config.cache_dir.ends_with(".dmon/cache"));
        assert_eq!(config.prefetch_delay(), Duration::from_millis(500));
        assert_eq!(config.base_currency, Currency::USD);
        assert!(config.repo_dir.is_none());
        assert!(config.git_sync);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RatesConfig::from_toml(
            r#"
            repo_dir = "/srv/rates"
            prefetch_delay_ms = 1000
            git_sync = false
            "#,
        )
        .unwrap();

        assert_eq!(config.repo_dir, Some(PathBuf::from("/srv/rates")));
        assert_eq!(config.prefetch_delay(), Duration::from_secs(1));
        assert_eq!(config.api_base_url, EXCHANGERATE_API_URL);
        assert_eq!(config.snapshot_repo().unwrap().root(), Path::new("/srv/rates"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            RatesConfig::from_toml("prefetch_delay_ms = \"soon\""),
            Err(MoneyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = RatesConfig::default().apply_env(env(&[
            (ENV_RATES_CACHE, "/tmp/dmon-cache"),
            (ENV_RATES_REPO, "/tmp/dmon-repo"),
            (ENV_API_KEY, "secret"),
        ]));

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/dmon-cache"));
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/dmon-cache/exchange-rates.db"));
        assert_eq!(config.repo_dir, Some(PathBuf::from("/tmp/dmon-repo")));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = RatesConfig::default().apply_env(env(&[(ENV_API_KEY, "  ")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"from-file\"\n").unwrap();

        let config = RatesConfig::load(Some(&path)).unwrap();
        assert!(config.api_key.is_some());

        let missing = dir.path().join("missing.toml");
        assert!(matches!(RatesConfig::load(Some(&missing)), Err(MoneyError::ConfigError(_))));
    }

    #[test]
    fn test_build_source_with_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = RatesConfig {
            repo_dir: Some(dir.path().to_path_buf()),
            git_sync: false,
            ..RatesConfig::default()
        };
        let store: Arc<dyn RateStore> = Arc::new(crate::rates::store::MemoryRateStore::new());
        let source = config.build_source_with_store(store).unwrap();

        assert!(source.store().is_some());
        assert!(source.snapshots().is_some());
    }
}
