//! Mood-to-song recommendation service.
//!
//! Composes the catalog, encoder, index and selector into one
//! `recommend(mood_text, k)` call:
//! - Validates the query before touching the model
//! - Builds the embedding index on first use, exactly once
//! - Scores and ranks under a shared read lock once built

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::catalog::{Catalog, CatalogItem};
use crate::config::RecommenderConfig;
use crate::recommender::encoder::TextEncoder;
use crate::recommender::error::RecommendError;
use crate::recommender::index::{normalize, EmbeddingIndex, IndexState};
use crate::recommender::select::select_top_k;

/// One recommended song with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationHit {
    #[serde(rename = "song")]
    pub item: CatalogItem,
    pub score: f32,
}

/// Recommends catalog items for free-form mood text.
///
/// The index starts `Empty` and is built by the first query (or
/// [`Recommender::warm_up`]). Concurrent first queries are serialized by
/// the write lock so the catalog is only encoded once; later queries only
/// take the read lock.
pub struct Recommender {
    config: RecommenderConfig,
    catalog: Arc<Catalog>,
    encoder: Arc<dyn TextEncoder>,
    state: RwLock<IndexState>,
}

impl Recommender {
    /// Create a recommender with an unbuilt index.
    ///
    /// Fails if the encoder was loaded with a different model than the one
    /// configured: index and query vectors must come from the same model.
    pub fn new(
        config: RecommenderConfig,
        catalog: Arc<Catalog>,
        encoder: Arc<dyn TextEncoder>,
    ) -> Result<Self, RecommendError> {
        if encoder.model() != config.model {
            return Err(RecommendError::ModelMismatch {
                configured: config.model.clone(),
                encoder: encoder.model().to_string(),
            });
        }

        Ok(Self {
            config,
            catalog,
            encoder,
            state: RwLock::new(IndexState::Empty),
        })
    }

    /// Model identifier used for both the index and queries.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_index_built(&self) -> bool {
        self.state
            .read()
            .map(|state| state.is_built())
            .unwrap_or(false)
    }

    /// Build the index now instead of on the first query.
    pub fn warm_up(&self) -> Result<(), RecommendError> {
        self.ensure_index()
    }

    /// Recommend up to `k` songs for the given mood, best match first.
    pub fn recommend(
        &self,
        mood_text: &str,
        k: usize,
    ) -> Result<Vec<RecommendationHit>, RecommendError> {
        let mood_text = mood_text.trim();
        if mood_text.is_empty() {
            return Err(RecommendError::invalid_query("mood_text must be non-empty"));
        }
        if k < 1 {
            return Err(RecommendError::invalid_query("k must be >= 1"));
        }

        self.ensure_index()?;

        let guard = self
            .state
            .read()
            .map_err(|e| RecommendError::Internal(format!("Lock poisoned: {}", e)))?;
        let index = guard
            .built()
            .ok_or_else(|| RecommendError::Internal("index not built".to_string()))?;

        if index.is_empty() {
            return Ok(vec![]);
        }

        let query = self.encode_query(mood_text)?;
        let scores = index.scores(&query)?;
        let top = select_top_k(&scores, k);

        log::debug!(
            "mood '{}' matched {} of {} songs",
            mood_text,
            top.len(),
            scores.len()
        );

        top.into_iter()
            .map(|(position, score)| {
                self.catalog
                    .get(position)
                    .cloned()
                    .map(|item| RecommendationHit { item, score })
                    .ok_or_else(|| {
                        RecommendError::Internal(format!("no catalog item at {}", position))
                    })
            })
            .collect()
    }

    /// Encode one query text and normalize it.
    fn encode_query(&self, mood_text: &str) -> Result<Vec<f32>, RecommendError> {
        let vectors = self.encoder.encode(&[mood_text.to_string()])?;
        if vectors.len() != 1 {
            return Err(RecommendError::EncodingMismatch {
                expected: 1,
                got: vectors.len(),
            });
        }

        let mut query = vectors.into_iter().next().unwrap_or_default();
        normalize(&mut query);
        Ok(query)
    }

    /// Ensure the index is built, building it if needed.
    fn ensure_index(&self) -> Result<(), RecommendError> {
        {
            let state = self
                .state
                .read()
                .map_err(|e| RecommendError::Internal(format!("Lock poisoned: {}", e)))?;
            if state.is_built() {
                return Ok(());
            }
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| RecommendError::Internal(format!("Lock poisoned: {}", e)))?;

        // another caller may have built it while we waited for the lock
        if state.is_built() {
            return Ok(());
        }

        log::info!(
            "Building embedding index for {} songs with model '{}'",
            self.catalog.len(),
            self.config.model
        );

        let index = EmbeddingIndex::build(self.catalog.items(), self.encoder.as_ref())?;
        *state = IndexState::Built(index);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::encoder::EncoderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed vector per call and can misreport the batch size.
    struct StubEncoder {
        model: String,
        drop_one: bool,
        calls: AtomicUsize,
    }

    impl StubEncoder {
        fn new(model: &str) -> Self {
            Self {
                model: model.to_string(),
                drop_one: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TextEncoder for StubEncoder {
        fn model(&self) -> &str {
            &self.model
        }

        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut out: Vec<Vec<f32>> = texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect();
            if self.drop_one {
                out.pop();
            }
            Ok(out)
        }
    }

    fn catalog() -> Arc<Catalog> {
        let raw = r#"[
            {"id": "a", "title": "A", "artist": "X", "description": "first"},
            {"id": "b", "title": "B", "artist": "Y", "description": "second song"}
        ]"#;
        Arc::new(Catalog::from_json_str(raw).unwrap())
    }

    fn config(model: &str) -> RecommenderConfig {
        RecommenderConfig {
            model: model.to_string(),
        }
    }

    #[test]
    fn test_model_mismatch_rejected() {
        let encoder = Arc::new(StubEncoder::new("other"));
        let result = Recommender::new(config("stub"), catalog(), encoder);
        assert!(matches!(result, Err(RecommendError::ModelMismatch { .. })));
    }

    #[test]
    fn test_invalid_queries_do_not_build_index() {
        let encoder = Arc::new(StubEncoder::new("stub"));
        let rec = Recommender::new(config("stub"), catalog(), encoder.clone()).unwrap();

        assert!(matches!(
            rec.recommend("  \n", 3),
            Err(RecommendError::InvalidQuery(_))
        ));
        assert!(matches!(
            rec.recommend("happy", 0),
            Err(RecommendError::InvalidQuery(_))
        ));
        assert!(!rec.is_index_built());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_encoding_mismatch_is_fatal_and_index_stays_empty() {
        let mut stub = StubEncoder::new("stub");
        stub.drop_one = true;
        let rec = Recommender::new(config("stub"), catalog(), Arc::new(stub)).unwrap();

        let result = rec.recommend("happy", 1);
        assert!(matches!(
            result,
            Err(RecommendError::EncodingMismatch {
                expected: 2,
                got: 1
            })
        ));
        assert!(!result.unwrap_err().is_client_error());
        assert!(!rec.is_index_built());
    }

    #[test]
    fn test_warm_up_builds_once() {
        let encoder = Arc::new(StubEncoder::new("stub"));
        let rec = Recommender::new(config("stub"), catalog(), encoder.clone()).unwrap();

        rec.warm_up().unwrap();
        rec.warm_up().unwrap();
        assert!(rec.is_index_built());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);

        rec.recommend("happy", 1).unwrap();
        // one more call for the query only
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_catalog_returns_no_hits() {
        let encoder = Arc::new(StubEncoder::new("stub"));
        let empty = Arc::new(Catalog::from_items(vec![]).unwrap());
        let rec = Recommender::new(config("stub"), empty, encoder.clone()).unwrap();

        assert!(rec.recommend("happy", 5).unwrap().is_empty());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hit_serializes_as_song() {
        let hit = RecommendationHit {
            item: catalog().get(0).unwrap().clone(),
            score: 0.5,
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["song"]["id"], "a");
        assert_eq!(value["score"], 0.5);
    }
}
