//! Text encoders turning strings into embedding vectors.
//!
//! The recommender only depends on the [`TextEncoder`] trait. The
//! production implementation wraps fastembed:
//! - Model download into a configurable cache directory on first use
//! - Batch embedding generation, one call per batch

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{InitOptions, TextEmbedding};

/// Error type for encoder operations
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

/// Maps strings to fixed-length vectors.
///
/// Implementations must be deterministic for a given model, return exactly
/// one vector per input in input order, and keep the dimensionality fixed.
pub trait TextEncoder: Send + Sync {
    /// Identifier of the model producing the vectors.
    fn model(&self) -> &str;

    /// Encode a batch of texts.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError>;
}

/// Encoder backed by a local fastembed model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct FastEmbedEncoder {
    model: Mutex<TextEmbedding>,
    model_name: String,
}

impl FastEmbedEncoder {
    /// Load the named model, downloading it into `cache_dir/models` if it
    /// is not cached yet.
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> Result<Self, EncoderError> {
        let model_enum = parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EncoderError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        log::info!(
            "Loading embedding model '{}' from {}",
            model_name,
            models_dir.display()
        );

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(show_download_progress);

        let model =
            TextEmbedding::try_new(options).map_err(|e| EncoderError::InitFailed(e.to_string()))?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
        })
    }
}

impl TextEncoder for FastEmbedEncoder {
    fn model(&self) -> &str {
        &self.model_name
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self.model.lock().map_err(|e| {
            EncoderError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EncoderError::EmbeddingFailed(e.to_string()))
    }
}

/// Parse model name string to fastembed enum.
fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EncoderError> {
    let normalized = name
        .trim()
        .trim_start_matches("sentence-transformers/")
        .trim_start_matches("BAAI/")
        .to_lowercase();

    match normalized.as_str() {
        "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" | "allminiml6v2q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
        "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-small-en-v1.5-q" | "bgesmallenv15q" => {
            Ok(fastembed::EmbeddingModel::BGESmallENV15Q)
        }
        "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-base-en-v1.5-q" | "bgebaseenv15q" => Ok(fastembed::EmbeddingModel::BGEBaseENV15Q),
        "bge-large-en-v1.5" | "bgelargeenv15" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "bge-large-en-v1.5-q" | "bgelargeenv15q" => {
            Ok(fastembed::EmbeddingModel::BGELargeENV15Q)
        }
        _ => Err(EncoderError::InvalidModel(format!(
            "Unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5 (add -q suffix for quantized)",
            name
        ))),
    }
}
