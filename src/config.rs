use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::recommender::DEFAULT_MODEL;

const CONFIG_FILE: &str = "config.yaml";

/// Environment variable overriding the configured model
pub const MODEL_ENV: &str = "MOODMUSIC_MODEL";

/// Default number of recommendations per query
const DEFAULT_K: usize = 5;
/// Largest `k` the HTTP and CLI adapters accept
const DEFAULT_MAX_K: usize = 20;
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Settings the recommender itself is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommenderConfig {
    /// Model identifier shared by the catalog index and query encoding
    pub model: String,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model name (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_model")]
    pub model: String,

    /// Song catalog JSON file. The builtin catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    #[serde(default = "default_k")]
    pub default_k: usize,

    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Print progress while the model downloads on first use
    #[serde(default = "default_show_download_progress")]
    pub show_download_progress: bool,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            catalog_path: None,
            default_k: DEFAULT_K,
            max_k: DEFAULT_MAX_K,
            listen_addr: default_listen_addr(),
            show_download_progress: true,
            base_path: PathBuf::new(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_max_k() -> usize {
    DEFAULT_MAX_K
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_show_download_progress() -> bool {
    true
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.trim().is_empty() {
            bail!("model cannot be empty");
        }
        if self.max_k == 0 {
            bail!("max_k must be greater than 0");
        }
        if !(1..=self.max_k).contains(&self.default_k) {
            bail!(
                "default_k must be between 1 and max_k ({}), got {}",
                self.max_k,
                self.default_k
            );
        }
        self.listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("listen_addr '{}' is not a socket address", self.listen_addr))?;

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, creating it with defaults if
    /// missing. `MOODMUSIC_MODEL` overrides the model for this process.
    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::read_or_create(base_path)?;
        config.apply_model_override(std::env::var(MODEL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_or_create(base_path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            let defaults = Self {
                base_path: base_path.to_path_buf(),
                ..Default::default()
            };
            defaults.save()?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            log::debug!("upgrading {}", path.display());
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.base_path.join(CONFIG_FILE);
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(&path, config_str)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn apply_model_override(&mut self, model: Option<String>) {
        if let Some(model) = model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
            log::info!("using model '{}' from {}", model, MODEL_ENV);
            self.model = model;
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::read_or_create(tmp.path()).unwrap();

        assert!(tmp.path().join(CONFIG_FILE).exists());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.default_k, 5);
        assert_eq!(config.max_k, 20);
        assert!(config.catalog_path.is_none());
        assert_eq!(config.base_path(), tmp.path());
    }

    #[test]
    fn test_missing_fields_get_defaults_and_resave() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "default_k: 3\n").unwrap();

        let config = Config::read_or_create(tmp.path()).unwrap();
        assert_eq!(config.default_k, 3);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);

        let saved = std::fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        assert!(saved.contains("listen_addr"));
    }

    #[test]
    fn test_malformed_config_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "default_k: [not a number\n").unwrap();
        assert!(Config::read_or_create(tmp.path()).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            default_k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_k: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            listen_addr: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            model: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_override() {
        let mut config = Config::default();

        config.apply_model_override(Some("  ".to_string()));
        assert_eq!(config.model, DEFAULT_MODEL);

        config.apply_model_override(Some("bge-small-en-v1.5".to_string()));
        assert_eq!(config.model, "bge-small-en-v1.5");
        assert_eq!(config.recommender_config().model, "bge-small-en-v1.5");
    }
}
