use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use homedir::my_home;

use crate::{
    catalog::Catalog,
    config::Config,
    recommender::{FastEmbedEncoder, Recommender, TextEncoder},
};

/// Environment variable pointing at the data directory
const HOME_ENV: &str = "MOODMUSIC_HOME";

/// Builds the recommender and its dependencies from configuration.
///
/// Everything is constructed explicitly and handed to the adapters; there
/// are no process-wide instances.
pub struct AppFactory;

impl AppFactory {
    /// Create a recommender with the fastembed encoder named in `config`.
    pub fn create_recommender(config: &Config) -> Result<Arc<Recommender>> {
        let catalog = Self::load_catalog(config)?;
        let encoder = Self::create_encoder(config)?;
        Self::create_recommender_with(config, catalog, encoder)
    }

    /// Create a recommender around an already constructed encoder.
    pub fn create_recommender_with(
        config: &Config,
        catalog: Arc<Catalog>,
        encoder: Arc<dyn TextEncoder>,
    ) -> Result<Arc<Recommender>> {
        let recommender = Recommender::new(config.recommender_config(), catalog, encoder)
            .context("Failed to create recommender")?;
        Ok(Arc::new(recommender))
    }

    /// Load the configured catalog, or the builtin one.
    pub fn load_catalog(config: &Config) -> Result<Arc<Catalog>> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?,
            None => Catalog::builtin().context("Builtin catalog is invalid")?,
        };

        if catalog.is_empty() {
            log::warn!("catalog has no songs, every query will return nothing");
        }

        Ok(Arc::new(catalog))
    }

    fn create_encoder(config: &Config) -> Result<Arc<dyn TextEncoder>> {
        let encoder = FastEmbedEncoder::new(
            &config.model,
            config.base_path().to_path_buf(),
            config.show_download_progress,
        )
        .with_context(|| format!("Failed to load embedding model '{}'", config.model))?;
        Ok(Arc::new(encoder))
    }

    /// Get the base path for the application
    pub fn get_base_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(HOME_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = my_home()
            .map_err(|e| anyhow::anyhow!("Could not determine home directory: {:?}", e))?
            .context("Home directory path is empty")?;
        Ok(home.join(".local/share/moodmusic"))
    }
}
