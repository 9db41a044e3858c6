use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{found, render_form};
use crate::AppState;
use crate::auth::RequestContext;
use crate::errors::ApiError;
use crate::publication::{self, ArticleList, ArticlePage, PopularList};
use crate::repositories::{ArticleRepository, Visibility};
use crate::validation::ArticleForm;

#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    query: Option<String>,
    page: Option<String>,
}

#[instrument(skip_all, fields(has_query = params.query.is_some(), page = ?params.page))]
pub async fn article_list<S: AppState>(
    State(state): State<S>,
    Query(params): Query<ListArticlesQuery>,
) -> Result<Json<ArticleList>, ApiError> {
    debug!("Processing article list request");

    let list =
        publication::list(&state, params.query.as_deref(), params.page.as_deref()).await?;

    info!(returned_count = list.articles.len(), "Successfully listed articles");
    Ok(Json(list))
}

#[instrument(skip_all)]
pub async fn popular_articles<S: AppState>(
    State(state): State<S>,
) -> Result<Json<PopularList>, ApiError> {
    let popular = publication::popular(&state).await?;
    info!(returned_count = popular.articles.len(), "Ranked popular articles");
    Ok(Json(popular))
}

#[instrument(skip_all, fields(slug = %slug))]
pub async fn article_detail<S: AppState>(
    State(state): State<S>,
    Path(slug): Path<String>,
) -> Result<Json<ArticlePage>, ApiError> {
    let page = publication::detail(&state, &slug).await?;
    debug!(id = page.article.id, "Found published article");
    Ok(Json(page))
}

pub async fn create_article_form<S: AppState>(ctx: RequestContext) -> Result<Response, ApiError> {
    ctx.require_user()?;
    Ok(render_form(&ArticleForm::default(), None))
}

#[instrument(skip_all, fields(title = %form.title))]
pub async fn create_article<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Form(form): Form<ArticleForm>,
) -> Result<Response, ApiError> {
    let author = ctx.require_user()?;

    match publication::create_article(&state, author, &form).await {
        Ok(_) => Ok(found("/")),
        Err(ApiError::Validation(errors)) => {
            debug!(%errors, "Invalid article form");
            Ok(render_form(&form, Some(errors)))
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip_all, fields(slug = %slug))]
pub async fn update_article_form<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    ctx.require_user()?;
    let article = state
        .article_repo()
        .get_by_slug(&slug, Visibility::Any)
        .await?;
    Ok(render_form(&ArticleForm::from(&article), None))
}

#[instrument(skip_all, fields(slug = %slug, title = %form.title))]
pub async fn update_article<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Path(slug): Path<String>,
    Form(form): Form<ArticleForm>,
) -> Result<Response, ApiError> {
    let editor = ctx.require_user()?;

    match publication::edit_article(&state, &slug, editor, &form).await {
        Ok(_) => Ok(found("/dashboard/")),
        Err(ApiError::Validation(errors)) => {
            debug!(%errors, "Invalid article form");
            Ok(render_form(&form, Some(errors)))
        }
        Err(err) => Err(err),
    }
}
