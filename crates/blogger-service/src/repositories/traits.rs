use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::ApiError;
use crate::models::{
    Article, ArticleChanges, AuthoredArticle, NewArticle, NewUser, Profile, ProfileChanges, User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Published,
    Any,
}

/// Filter for article listings. Every reader-facing query starts from
/// [`ArticleQuery::published`].
#[derive(Debug, Clone)]
pub struct ArticleQuery {
    pub visibility: Visibility,
    pub author_id: Option<i32>,
    /// Every keyword must occur in the title. Matching uses SQLite `LIKE`,
    /// so case is ignored for ASCII letters only ("CRÈME" won't match "crème").
    pub title_keywords: Vec<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ArticleQuery {
    pub fn published() -> Self {
        Self::with_visibility(Visibility::Published)
    }

    pub fn any() -> Self {
        Self::with_visibility(Visibility::Any)
    }

    fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility,
            author_id: None,
            title_keywords: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn by_author(mut self, author_id: i32) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn matching(mut self, keywords: Vec<String>) -> Self {
        self.title_keywords = keywords;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ListArticlesResult {
    pub items: Vec<AuthoredArticle>,
    /// Matching rows before limit/offset.
    pub total: i64,
}

#[async_trait]
pub trait ArticleRepository: Clone + Send + Sync + 'static {
    /// Fails with a title validation error when the title or its slug is taken.
    async fn create(&self, article: &NewArticle) -> Result<Article, ApiError>;
    async fn update(&self, id: i32, changes: &ArticleChanges) -> Result<Article, ApiError>;
    async fn find_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Option<Article>, ApiError>;
    async fn list(&self, query: &ArticleQuery) -> Result<ListArticlesResult, ApiError>;
    /// Number of rows matching `query`, ignoring its limit/offset.
    async fn count(&self, query: &ArticleQuery) -> Result<i64, ApiError>;

    async fn get_by_slug(&self, slug: &str, visibility: Visibility) -> Result<Article, ApiError> {
        self.find_by_slug(slug, visibility)
            .await?
            .ok_or(ApiError::NotFound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementKind {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Created,
    /// The user had already cast this vote; nothing was written.
    AlreadyRecorded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementCounts {
    likes: i64,
    dislikes: i64,
    popularity_score: i64,
}

impl EngagementCounts {
    pub fn new(likes: i64, dislikes: i64) -> Self {
        Self {
            likes,
            dislikes,
            popularity_score: dislikes - likes,
        }
    }

    pub fn likes(&self) -> i64 {
        self.likes
    }

    pub fn dislikes(&self) -> i64 {
        self.dislikes
    }

    /// Lower is more popular.
    pub fn popularity_score(&self) -> i64 {
        self.popularity_score
    }
}

#[async_trait]
pub trait EngagementRepository: Clone + Send + Sync + 'static {
    async fn record(
        &self,
        kind: EngagementKind,
        user_id: i32,
        article_id: i32,
    ) -> Result<Recorded, ApiError>;

    /// Counts for each requested article; articles without votes map to zero.
    async fn counts(&self, article_ids: &[i32]) -> Result<HashMap<i32, EngagementCounts>, ApiError>;

    async fn like(&self, user_id: i32, article_id: i32) -> Result<Recorded, ApiError> {
        self.record(EngagementKind::Like, user_id, article_id).await
    }

    async fn dislike(&self, user_id: i32, article_id: i32) -> Result<Recorded, ApiError> {
        self.record(EngagementKind::Dislike, user_id, article_id)
            .await
    }

    async fn counts_for(&self, article_id: i32) -> Result<EngagementCounts, ApiError> {
        Ok(self
            .counts(&[article_id])
            .await?
            .remove(&article_id)
            .unwrap_or_default())
    }
}

#[async_trait]
pub trait UserRepository: Clone + Send + Sync + 'static {
    /// Creates the user together with an empty profile.
    async fn create(&self, user: &NewUser, full_name: &str) -> Result<User, ApiError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError>;
    async fn profile_for_user(&self, user_id: i32) -> Result<Option<Profile>, ApiError>;
    async fn find_profile(&self, profile_id: i32) -> Result<Option<Profile>, ApiError>;
    async fn update_profile(
        &self,
        profile_id: i32,
        changes: &ProfileChanges,
    ) -> Result<Profile, ApiError>;
}
