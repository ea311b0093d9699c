//! Crate-level scenario tests.
//!
//! `KeywordEncoder` stands in for a real model: every dimension counts the
//! words of one mood family, so similarity behaves predictably without a
//! model download.

mod cli;

use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, CatalogItem};
use crate::config::RecommenderConfig;
use crate::recommender::{EncoderError, Recommender, TextEncoder};

pub const TEST_MODEL: &str = "keyword-test";

const MOOD_FAMILIES: &[&[&str]] = &[
    &["calm", "peaceful", "relaxed", "relaxing", "ambient", "waters", "quiet", "serene"],
    &["angry", "rage", "loud", "furious", "mad"],
    &["happy", "joy", "upbeat", "cheerful", "sunny"],
    &["sad", "cry", "heartbreak", "lonely", "blue"],
];

/// Weight of the constant dimension keeping vectors non-zero
const BIAS: f32 = 0.1;

/// Deterministic bag-of-mood-words encoder recording every batch.
pub struct KeywordEncoder {
    batches: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl KeywordEncoder {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(vec![]),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            batches: Mutex::new(vec![]),
            fail: true,
        }
    }

    /// Number of batches with more than one text (catalog builds).
    pub fn catalog_batches(&self) -> usize {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|batch| batch.len() > 1)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn embed(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; MOOD_FAMILIES.len() + 1];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            for (dim, family) in MOOD_FAMILIES.iter().enumerate() {
                if family.contains(&word.as_str()) {
                    vector[dim] += 1.0;
                }
            }
        }
        vector[MOOD_FAMILIES.len()] = BIAS;
        vector
    }
}

impl TextEncoder for KeywordEncoder {
    fn model(&self) -> &str {
        TEST_MODEL
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        self.batches.lock().unwrap().push(texts.to_vec());
        if self.fail {
            return Err(EncoderError::EmbeddingFailed("encoder offline".to_string()));
        }
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }
}

pub fn item(id: &str, title: &str, artist: &str, tags: &[&str], description: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: description.to_string(),
    }
}

/// The two-song catalog: one calm, one angry.
pub fn calm_and_rage() -> Arc<Catalog> {
    Arc::new(
        Catalog::from_items(vec![
            item("a", "Calm Waters", "X", &["calm", "ambient"], "Calm Waters by X."),
            item("b", "Rage Mode", "Y", &["angry", "loud"], "Rage Mode by Y."),
        ])
        .unwrap(),
    )
}

pub fn mixed_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::from_items(vec![
            item("calm-1", "Still Lake", "A", &["calm", "quiet"], "Serene and peaceful."),
            item("rage-1", "Smash", "B", &["angry", "loud"], "Furious noise."),
            item("happy-1", "Sunny Day", "C", &["happy", "upbeat"], "Cheerful joy."),
            item("sad-1", "Rain", "D", &["sad"], "Lonely and blue."),
            item("mix-1", "Bittersweet", "E", &["happy", "sad"], "Joy and heartbreak."),
            item("plain-1", "Untitled", "F", &[], "Nothing in particular."),
        ])
        .unwrap(),
    )
}

pub fn recommender_with(catalog: Arc<Catalog>, encoder: Arc<KeywordEncoder>) -> Recommender {
    let config = RecommenderConfig {
        model: TEST_MODEL.to_string(),
    };
    Recommender::new(config, catalog, encoder).unwrap()
}
