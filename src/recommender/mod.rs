//! Embedding-backed mood recommendations.
//!
//! # Architecture
//!
//! - `text`: Builds the encoder input for each catalog item
//! - `encoder`: Text encoder trait and the fastembed implementation
//! - `index`: Normalized embedding matrix and dot-product scoring
//! - `select`: Partial top-K selection with deterministic ties
//! - `service`: The `Recommender` tying it all together

pub mod encoder;
mod error;
mod index;
mod select;
mod service;
mod text;

pub use encoder::{EncoderError, FastEmbedEncoder, TextEncoder};
pub use error::RecommendError;
pub use index::{EmbeddingIndex, IndexError, IndexState, SCORE_EPSILON};
pub use select::select_top_k;
pub use service::{RecommendationHit, Recommender};
pub use text::embeddable_text;

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
