use axum::{
    Form, Json,
    extract::{Path, State},
    response::Response,
};
use tracing::{debug, info, instrument};

use super::{found, render_form};
use crate::AppState;
use crate::auth::RequestContext;
use crate::errors::ApiError;
use crate::publication::{self, AuthorPage, Dashboard};
use crate::validation::ProfileForm;

#[instrument(skip_all, fields(username = %username))]
pub async fn user_page<S: AppState>(
    State(state): State<S>,
    Path(username): Path<String>,
) -> Result<Json<AuthorPage>, ApiError> {
    let page = publication::by_author(&state, &username).await?;
    info!(article_count = page.article_count, "Rendered user page");
    Ok(Json(page))
}

#[instrument(skip_all)]
pub async fn dashboard<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
) -> Result<Json<Dashboard>, ApiError> {
    let user = ctx.require_user()?;
    let dashboard = publication::dashboard(&state, user).await?;
    debug!(user_id = user.id, article_count = dashboard.articles.len(), "Rendered dashboard");
    Ok(Json(dashboard))
}

#[instrument(skip_all, fields(profile_id = id))]
pub async fn update_profile_form<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    ctx.require_user()?;
    let profile = publication::profile(&state, id).await?;
    Ok(render_form(&ProfileForm::from(&profile), None))
}

#[instrument(skip_all, fields(profile_id = id))]
pub async fn update_profile<S: AppState>(
    State(state): State<S>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, ApiError> {
    let editor = ctx.require_user()?;

    match publication::edit_profile(&state, id, editor, &form).await {
        Ok(_) => Ok(found("/dashboard/")),
        Err(ApiError::Validation(errors)) => {
            debug!(%errors, "Invalid profile form");
            Ok(render_form(&form, Some(errors)))
        }
        Err(err) => Err(err),
    }
}
