//! MCP tool server over stdio.
//!
//! Exposes a single `recommend_songs` tool backed by the same
//! [`Recommender`] the CLI and HTTP adapters use.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;

use crate::{
    config::Config,
    recommender::{RecommendError, Recommender},
    web::{resolve_k, RecommendResponse},
};

/// Arguments for the recommend_songs tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Parameters for recommending songs by mood")]
pub struct RecommendSongsArgs {
    /// One or more sentences describing the user's mood
    #[schemars(description = "Free-form description of the current mood")]
    pub mood_text: String,

    /// How many recommendations to return
    #[schemars(description = "Number of songs to return (default: 5)")]
    #[serde(default)]
    pub k: Option<i64>,
}

#[derive(Clone)]
pub struct MoodMusicMcp {
    recommender: Arc<Recommender>,
    default_k: usize,
    tool_router: ToolRouter<Self>,
}

impl MoodMusicMcp {
    pub fn new(recommender: Arc<Recommender>, config: &Config) -> Self {
        Self {
            recommender,
            default_k: config.default_k,
            tool_router: Self::tool_router(),
        }
    }

    fn recommend(&self, args: RecommendSongsArgs) -> Result<RecommendResponse, RecommendError> {
        let k = resolve_k(args.k, self.default_k, None)?;
        let recommender = self.recommender.clone();

        tokio::task::block_in_place(move || {
            let results = recommender.recommend(&args.mood_text, k)?;
            Ok(RecommendResponse {
                model: recommender.model().to_string(),
                results,
            })
        })
    }
}

#[tool_router]
impl MoodMusicMcp {
    /// Bad input comes back as a tool error the model can read and correct;
    /// anything else fails the call.
    #[tool(description = "Recommend songs for a free-form mood description")]
    pub async fn recommend_songs(
        &self,
        Parameters(args): Parameters<RecommendSongsArgs>,
    ) -> Result<CallToolResult, McpError> {
        log::debug!("recommend_songs: {args:?}");

        match self.recommend(args) {
            Ok(response) => Ok(CallToolResult::success(vec![Content::json(response)?])),
            Err(err) if err.is_client_error() => {
                Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
            }
            Err(err) => {
                log::error!("recommend_songs failed: {err:?}");
                Err(McpError::internal_error(err.to_string(), None))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for MoodMusicMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "moodmusic".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Song recommendations by mood.\n\n\
                 Tools:\n\
                 - recommend_songs: `mood_text` describes how the user feels, \
                 `k` is how many songs to return (default {}). \
                 Returns the model name and songs with similarity scores.",
                self.default_k
            )),
            ..Default::default()
        }
    }
}

/// Serve the tool over stdin/stdout until the client disconnects.
pub fn start_stdio(recommender: Arc<Recommender>, config: &Config) -> anyhow::Result<()> {
    let server = MoodMusicMcp::new(recommender, config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async move {
            log::info!("serving MCP on stdio");
            let service = server
                .serve(stdio())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to start MCP service: {e:?}"))?;

            let reason = service
                .waiting()
                .await
                .map_err(|e| anyhow::anyhow!("MCP service error: {e:?}"))?;
            log::info!("MCP service stopped: {reason:?}");
            Ok(())
        })
}
