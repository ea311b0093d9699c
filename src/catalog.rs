//! Song catalog loading and validation.
//!
//! The catalog is an ordered JSON list of records
//! (`id`, `title`, `artist`, `tags`, `description`). It is loaded once at
//! startup and shared read-only afterwards. Catalog position is the key the
//! embedding index uses, so the order of the source list is preserved.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Catalog shipped inside the binary.
const BUILTIN_CATALOG: &str = include_str!("../data/songs.json");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: String,
}

impl CatalogItem {
    /// Trim every field and drop blank tags.
    fn normalize(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.title = self.title.trim().to_string();
        self.artist = self.artist.trim().to_string();
        self.description = self.description.trim().to_string();
        self.tags = self
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("id cannot be empty".to_string());
        }
        if self.title.is_empty() {
            return Err(format!("title of '{}' cannot be empty", self.id));
        }
        if self.description.is_empty() {
            return Err(format!("description of '{}' cannot be empty", self.id));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot load catalog: {0}")]
    Load(String),

    #[error("invalid catalog record #{position}: {message}")]
    Validation { position: usize, message: String },
}

/// Immutable, ordered sequence of catalog items.
#[derive(Clone, Debug)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Load the catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| CatalogError::Load(format!("{}: {err}", path.display())))?;
        let catalog = Self::from_json_str(&raw)?;
        log::info!(
            "loaded {} catalog items from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|err| CatalogError::Load(err.to_string()))?;

        let serde_json::Value::Array(records) = value else {
            return Err(CatalogError::Load(
                "catalog must be a JSON list of records".to_string(),
            ));
        };

        let items = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                serde_json::from_value::<CatalogItem>(record).map_err(|err| {
                    CatalogError::Validation {
                        position,
                        message: err.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_items(items)
    }

    /// Build a catalog from already deserialized items, normalizing and
    /// validating each of them.
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut normalized = Vec::with_capacity(items.len());

        for (position, item) in items.into_iter().enumerate() {
            let item = item.normalize();
            item.validate()
                .map_err(|message| CatalogError::Validation { position, message })?;

            if !seen.insert(item.id.clone()) {
                return Err(CatalogError::Validation {
                    position,
                    message: format!("duplicate id '{}'", item.id),
                });
            }

            normalized.push(item);
        }

        Ok(Self { items: normalized })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
