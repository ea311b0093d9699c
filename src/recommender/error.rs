use crate::recommender::encoder::EncoderError;
use crate::recommender::index::IndexError;

/// Errors that can occur while answering a recommendation query.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("{0}")]
    InvalidQuery(String),

    #[error("Encoder returned {got} vectors for {expected} inputs")]
    EncodingMismatch { expected: usize, got: usize },

    #[error("Encoder uses model '{encoder}' but recommender is configured for '{configured}'")]
    ModelMismatch { configured: String, encoder: String },

    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecommendError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Whether the caller's input caused the failure (as opposed to a
    /// broken encoder or index).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }
}
