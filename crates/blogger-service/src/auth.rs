//! Request identity.
//!
//! Sessions and passwords live in the fronting auth layer, which forwards the
//! authenticated username in [`REMOTE_USER_HEADER`]. Handlers see it only
//! through [`RequestContext`].

use axum::extract::FromRequestParts;
use http::request::Parts;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::AppState;
use crate::errors::ApiError;
use crate::models::User;
use crate::repositories::UserRepository;

pub const REMOTE_USER_HEADER: &str = "x-remote-user";
pub const LOGIN_URL: &str = "/accounts/login/";

/// Builds the login URL that sends the user back to `next` afterwards.
pub fn login_redirect(next: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{LOGIN_URL}?next={next}")
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: Option<User>,
    /// Path and query of the request, used as the post-login target.
    pub path: String,
}

impl RequestContext {
    pub fn anonymous(path: impl Into<String>) -> Self {
        Self {
            user: None,
            path: path.into(),
        }
    }

    pub fn authenticated(user: User, path: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            path: path.into(),
        }
    }

    pub fn require_user(&self) -> Result<&User, ApiError> {
        self.user.as_ref().ok_or_else(|| {
            debug!(path = %self.path, "Anonymous access to protected resource");
            ApiError::AuthRequired {
                next: self.path.clone(),
            }
        })
    }
}

impl<S: AppState> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let username = parts
            .headers
            .get(REMOTE_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let Some(username) = username else {
            return Ok(Self::anonymous(path));
        };

        match state.user_repo().find_by_username(username).await? {
            Some(user) => Ok(Self::authenticated(user, path)),
            None => {
                warn!(username = %username, "Unknown remote user, treating as anonymous");
                Ok(Self::anonymous(path))
            }
        }
    }
}
