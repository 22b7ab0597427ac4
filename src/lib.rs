pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::jwt::TokenKeys;
use crate::config::Config;
use crate::state::{AppState, SharedState};
use crate::storage::{DiskImageStore, ImageStore};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let tokens = TokenKeys::new(&config.jwt_secret);
    let images: Arc<dyn ImageStore> = Arc::new(DiskImageStore::new(config.upload_dir.clone()));

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        tokens,
        images,
    });

    Router::new()
        .merge(routes::api_routes())
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .route("/", get(root))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "API is running..."
}

async fn health() -> &'static str {
    "ok"
}
