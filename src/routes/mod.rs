//! Route assembly

pub mod dashboard;
pub mod notifications;
pub mod quotes;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::cache::CacheStats;
use crate::pricing;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let api = pricing::router()
        .route("/dashboard", get(dashboard::summary))
        .route("/notifications", post(notifications::create));

    Router::new()
        .route("/health", get(health))
        .route("/quotations/:id/sheet", get(quotes::sheet))
        .nest("/api", api)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
