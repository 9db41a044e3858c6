use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;

use crate::AppState;
use crate::validation::FormErrors;

pub mod accounts;
pub mod articles;
pub mod engagement;

/// `302 Found` to `location`.
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// Re-renders a form with its submitted values and any errors.
pub fn render_form<F: Serialize>(form: &F, errors: Option<FormErrors>) -> Response {
    let errors = errors.unwrap_or_default();
    Json(json!({ "form": form, "errors": errors })).into_response()
}

pub fn create_web_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/", get(articles::article_list::<S>))
        .route("/articles/popular/", get(articles::popular_articles::<S>))
        .route(
            "/articles/create/",
            get(articles::create_article_form::<S>).post(articles::create_article::<S>),
        )
        .route("/article/{slug}/", get(articles::article_detail::<S>))
        .route(
            "/article/{slug}/update/",
            get(articles::update_article_form::<S>).post(articles::update_article::<S>),
        )
        .route(
            "/article/{slug}/like/",
            get(engagement::like_article::<S>).post(engagement::like_article::<S>),
        )
        .route(
            "/article/{slug}/dislike/",
            get(engagement::dislike_article::<S>).post(engagement::dislike_article::<S>),
        )
        .route("/user/{username}/", get(accounts::user_page::<S>))
        .route("/dashboard/", get(accounts::dashboard::<S>))
        .route(
            "/dashboard/{id}/update",
            get(accounts::update_profile_form::<S>).post(accounts::update_profile::<S>),
        )
}
