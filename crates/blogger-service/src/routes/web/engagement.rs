use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use super::found;
use crate::AppState;
use crate::auth::RequestContext;
use crate::errors::ApiError;
use crate::publication;
use crate::repositories::Recorded;

/// A new like redirects to the article. A repeated like renders the article
/// page in place, with no redirect.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn like_article<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let user = ctx.require_user()?;
    let (article, outcome) = publication::like_article(&state, user, &slug).await?;

    match outcome {
        Recorded::Created => Ok(found(article.absolute_url())),
        Recorded::AlreadyRecorded => {
            debug!(article_id = article.id, "Like already recorded");
            let page = publication::article_page(&state, article).await?;
            Ok(Json(page).into_response())
        }
    }
}

/// Unlike likes, a repeated dislike still redirects to the article.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn dislike_article<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let user = ctx.require_user()?;
    let (article, outcome) = publication::dislike_article(&state, user, &slug).await?;

    if outcome == Recorded::AlreadyRecorded {
        debug!(article_id = article.id, "Dislike already recorded");
    }
    Ok(found(article.absolute_url()))
}
