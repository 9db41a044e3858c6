use crate::AppState;
use axum::{Router, routing::get};

pub mod web;

async fn health() -> &'static str {
    "OK"
}

pub fn create_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/health", get(health))
        .merge(web::create_web_router())
}
