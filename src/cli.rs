use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::recommender::{RecommendError, RecommendationHit};
use crate::web::resolve_k;

#[derive(Parser, Debug)]
#[command(version, about = "Recommend songs by mood text", long_about = None)]
pub struct Args {
    /// Song catalog JSON file. Overrides `catalog_path` in config.yaml.
    #[clap(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Embedding model. Overrides config.yaml and MOODMUSIC_MODEL.
    #[clap(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend songs for a mood description
    Recommend {
        /// Your mood description (one or more words/sentences)
        #[clap(required = true, num_args = 1..)]
        mood_text: Vec<String>,

        /// How many recommendations to return (config default_k if unset)
        #[clap(short, allow_negative_numbers = true)]
        k: Option<i64>,

        /// Output JSON instead of human-readable text
        #[clap(long, default_value = "false")]
        json: bool,
    },
    /// Start the HTTP server
    Serve {
        /// Address to listen on. Overrides `listen_addr` in config.yaml.
        #[clap(long)]
        addr: Option<String>,

        /// Embed the catalog before accepting requests
        #[clap(long, default_value = "false")]
        warm: bool,
    },
    /// Serve the recommend_songs tool over MCP (stdio)
    Mcp {
        /// Embed the catalog before accepting requests
        #[clap(long, default_value = "false")]
        warm: bool,
    },
    /// Print the loaded catalog as JSON
    Catalog {},
}

/// Join the mood words the way they were typed.
pub fn join_mood_text(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

/// Validate the command-line query before any model is loaded.
///
/// Unlike the HTTP endpoint, `k` has no upper bound here: a `k` larger than
/// the catalog returns the whole catalog.
pub fn resolve_request(
    words: &[String],
    k: Option<i64>,
    default_k: usize,
) -> Result<(String, usize), RecommendError> {
    let mood_text = join_mood_text(words);
    if mood_text.is_empty() {
        return Err(RecommendError::invalid_query("mood_text must be non-empty"));
    }
    let k = resolve_k(k, default_k, None)?;
    Ok((mood_text, k))
}

/// Human-readable listing of recommendations.
pub fn render_hits(model: &str, hits: &[RecommendationHit]) -> String {
    let mut out = format!("Model: {model}\n");
    for (idx, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} — {}  (score={:.4})\n",
            idx + 1,
            hit.item.title,
            hit.item.artist,
            hit.score
        ));
    }
    out
}
