use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lemma_core::persist::{load_all, IndexPaths, MetaFile};
use lemma_core::vector::DEFAULT_TOP_K;
use lemma_core::{BooleanEngine, DocId, IndexStats, QueryError, ScoredDoc, VectorSearchEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Deserialize)]
pub struct VectorParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse<T> {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<T>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub index: IndexStats,
    pub vocabulary_size: usize,
    pub language: String,
    pub created_at: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    position: usize,
}

/// A rejected query, reported as 400 with its position.
pub struct ApiError(QueryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.0.to_string(), kind: self.0.kind(), position: self.0.position() };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Engines loaded once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub boolean: Arc<BooleanEngine>,
    pub vector: Arc<VectorSearchEngine>,
    pub meta: Arc<MetaFile>,
}

impl AppState {
    pub fn load(index_dir: &str) -> Result<Self> {
        let loaded = load_all(&IndexPaths::new(index_dir))?;
        let normalizer = loaded.meta.language.normalizer();
        Ok(Self {
            boolean: Arc::new(BooleanEngine::new(loaded.inverted, normalizer.clone())),
            vector: Arc::new(VectorSearchEngine::new(loaded.vectors, normalizer)),
            meta: Arc::new(loaded.meta),
        })
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    // Load index at startup; a bad index is fatal
    let app_state = AppState::load(&index_dir)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search/boolean", get(boolean_handler))
        .route("/search/vector", get(vector_handler))
        .route("/stats", get(stats_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<BooleanParams>,
) -> Result<Json<SearchResponse<DocId>>, ApiError> {
    let start = std::time::Instant::now();
    let results = state.boolean.search_str(&params.q).map_err(ApiError)?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn vector_handler(
    State(state): State<AppState>,
    Query(params): Query<VectorParams>,
) -> Json<SearchResponse<ScoredDoc>> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, MAX_K);
    let results = state.vector.search(&params.q, k);
    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        index: state.boolean.index().stats(),
        vocabulary_size: state.vector.index().vocabulary().len(),
        language: state.meta.language.to_string(),
        created_at: state.meta.created_at.clone(),
    })
}
