use crate::{
    config::Config,
    recommender::{RecommendError, RecommendationHit, Recommender},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

const INDEX_HTML: &str = include_str!("../web/index.html");

#[derive(Clone)]
struct SharedState {
    recommender: Arc<Recommender>,
    default_k: usize,
    max_k: usize,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

pub fn router(recommender: Arc<Recommender>, config: &Config) -> Router {
    let shared_state = Arc::new(SharedState {
        recommender,
        default_k: config.default_k,
        max_k: config.max_k,
    });

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/recommend", post(recommend))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn start_daemon(recommender: Arc<Recommender>, config: &Config) -> anyhow::Result<()> {
    let app = router(recommender, config);
    let addr = config.listen_addr.clone();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { start_app(app, &addr).await })
}

#[derive(Debug)]
struct HttpError(RecommendError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        if self.0.is_client_error() {
            (
                axum::http::StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_request", "message": self.0.to_string()})),
            )
                .into_response()
        } else {
            log::error!("{self:?}");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal_error", "message": self.0.to_string()})),
            )
                .into_response()
        }
    }
}

impl<E> From<E> for HttpError
where
    E: Into<RecommendError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    /// Free-form mood description
    pub mood_text: String,

    /// Number of songs to return, `default_k` when omitted
    #[serde(default)]
    pub k: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub model: String,
    pub results: Vec<RecommendationHit>,
}

/// Check a caller supplied `k`. It must be at least 1, and at most `max_k`
/// when a cap is given.
pub fn resolve_k(
    k: Option<i64>,
    default_k: usize,
    max_k: Option<usize>,
) -> Result<usize, RecommendError> {
    let Some(k) = k else {
        return Ok(default_k);
    };
    let k = usize::try_from(k)
        .ok()
        .filter(|k| *k >= 1)
        .ok_or_else(|| RecommendError::invalid_query("k must be >= 1"))?;
    match max_k {
        Some(max_k) if k > max_k => Err(RecommendError::invalid_query(format!(
            "k must be <= {max_k}"
        ))),
        _ => Ok(k),
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn recommend(
    State(state): State<Arc<SharedState>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, HttpError> {
    let Json(payload) =
        payload.map_err(|rejection| RecommendError::invalid_query(rejection.body_text()))?;
    log::debug!("payload: {payload:?}");

    let k = resolve_k(payload.k, state.default_k, Some(state.max_k))?;
    let recommender = state.recommender.clone();

    tokio::task::block_in_place(move || {
        let results = recommender.recommend(&payload.mood_text, k)?;
        Ok(RecommendResponse {
            model: recommender.model().to_string(),
            results,
        }
        .into())
    })
}
