//! The reader- and author-facing operations behind every route: visibility
//! rules, search, pagination and the engagement actions.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::errors::ApiError;
use crate::models::{Article, AuthoredArticle, NewArticle, Profile, ProfileChanges, User};
use crate::ranking::{self, Scored};
use crate::repositories::{
    ArticleQuery, ArticleRepository, EngagementCounts, EngagementRepository, Recorded,
    UserRepository, Visibility,
};
use crate::validation::{ArticleForm, ProfileForm};

pub const PAGE_SIZE: i64 = 5;
pub const SEARCH_LIMIT: i64 = 10;

/// Splits a search string into the keywords that must all match.
pub fn keywords(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl PageRequest {
    /// Missing or blank means the first page; anything unparsable is a 404.
    pub fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(PageRequest::Number(1)),
            Some("last") => Ok(PageRequest::Last),
            Some(value) => value
                .parse::<i64>()
                .map(PageRequest::Number)
                .map_err(|_| ApiError::NotFound),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub number: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    /// An empty listing still has one (empty) page.
    pub fn resolve(request: PageRequest, total: i64, per_page: i64) -> Result<Self, ApiError> {
        let num_pages = ((total + per_page - 1) / per_page).max(1);
        let number = match request {
            PageRequest::Number(number) => number,
            PageRequest::Last => num_pages,
        };
        if number < 1 || number > num_pages {
            debug!(number, num_pages, "Requested page out of range");
            return Err(ApiError::NotFound);
        }

        Ok(Pagination {
            number,
            per_page,
            total,
            num_pages,
            has_previous: number > 1,
            has_next: number < num_pages,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleList {
    pub articles: Vec<AuthoredArticle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<Pagination>,
}

#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub article: Article,
    pub author: User,
    pub profile: Option<Profile>,
    #[serde(flatten)]
    pub counts: EngagementCounts,
}

#[derive(Debug, Serialize)]
pub struct AuthorPage {
    pub user: User,
    pub profile: Option<Profile>,
    pub articles: Vec<AuthoredArticle>,
    pub article_count: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub profile: Option<Profile>,
    pub articles: Vec<AuthoredArticle>,
}

#[derive(Debug, Serialize)]
pub struct PopularList {
    pub articles: Vec<Scored<AuthoredArticle>>,
}

pub async fn list<S: AppState>(
    state: &S,
    query: Option<&str>,
    page: Option<&str>,
) -> Result<ArticleList, ApiError> {
    let articles = state.article_repo();

    if let Some(search) = query.map(str::trim).filter(|q| !q.is_empty()) {
        let filter = ArticleQuery::published()
            .matching(keywords(search))
            .limit(SEARCH_LIMIT);
        let result = articles.list(&filter).await?;
        debug!(query = %search, matched = result.total, "Searched published articles");

        return Ok(ArticleList {
            articles: result.items,
            query: Some(search.to_string()),
            page: None,
        });
    }

    let request = PageRequest::parse(page)?;
    let total = articles.count(&ArticleQuery::published()).await?;
    let pagination = Pagination::resolve(request, total, PAGE_SIZE)?;

    let filter = ArticleQuery::published()
        .limit(pagination.per_page)
        .offset(pagination.offset());
    let result = articles.list(&filter).await?;

    Ok(ArticleList {
        articles: result.items,
        query: None,
        page: Some(pagination),
    })
}

/// A published article. Drafts are invisible here, even to their author.
pub async fn detail<S: AppState>(state: &S, slug: &str) -> Result<ArticlePage, ApiError> {
    let article = state
        .article_repo()
        .get_by_slug(slug, Visibility::Published)
        .await?;
    article_page(state, article).await
}

/// Renders an article regardless of its visibility.
pub async fn article_page<S: AppState>(state: &S, article: Article) -> Result<ArticlePage, ApiError> {
    let users = state.user_repo();
    let author = users
        .find_by_id(article.author_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let profile = users.profile_for_user(author.id).await?;
    let counts = state.engagement_repo().counts_for(article.id).await?;

    Ok(ArticlePage {
        article,
        author,
        profile,
        counts,
    })
}

pub async fn by_author<S: AppState>(state: &S, username: &str) -> Result<AuthorPage, ApiError> {
    let users = state.user_repo();
    let user = users
        .find_by_username(username)
        .await?
        .ok_or(ApiError::NotFound)?;
    let profile = users.profile_for_user(user.id).await?;

    let result = state
        .article_repo()
        .list(&ArticleQuery::published().by_author(user.id))
        .await?;

    Ok(AuthorPage {
        user,
        profile,
        articles: result.items,
        article_count: result.total,
    })
}

/// Everything the user wrote, drafts included.
pub async fn dashboard<S: AppState>(state: &S, user: &User) -> Result<Dashboard, ApiError> {
    let profile = state.user_repo().profile_for_user(user.id).await?;
    let result = state
        .article_repo()
        .list(&ArticleQuery::any().by_author(user.id))
        .await?;

    Ok(Dashboard {
        user: user.clone(),
        profile,
        articles: result.items,
    })
}

/// Ranks every published article from its current counts.
pub async fn popular<S: AppState>(state: &S) -> Result<PopularList, ApiError> {
    let published = state
        .article_repo()
        .list(&ArticleQuery::published())
        .await?
        .items;

    let ids: Vec<i32> = published.iter().map(|a| a.article.id).collect();
    let mut counts = state.engagement_repo().counts(&ids).await?;

    let candidates = published
        .into_iter()
        .map(|article| {
            let article_counts = counts.remove(&article.article.id).unwrap_or_default();
            Scored::new(article, article_counts)
        })
        .collect();

    Ok(PopularList {
        articles: ranking::rank(candidates),
    })
}

pub async fn create_article<S: AppState>(
    state: &S,
    author: &User,
    form: &ArticleForm,
) -> Result<Article, ApiError> {
    let fields = form.validate()?;
    let new_article = NewArticle::new(author.id, fields, Utc::now().naive_utc());

    let article = state.article_repo().create(&new_article).await?;
    info!(id = article.id, slug = %article.slug, author_id = author.id, "Created article");
    Ok(article)
}

/// Saves `form` over the article at `slug`. Any authenticated user may edit
/// any article; ownership is not checked.
pub async fn edit_article<S: AppState>(
    state: &S,
    slug: &str,
    editor: &User,
    form: &ArticleForm,
) -> Result<Article, ApiError> {
    let articles = state.article_repo();
    let article = articles.get_by_slug(slug, Visibility::Any).await?;
    let fields = form.validate()?;

    if article.author_id != editor.id {
        warn!(
            id = article.id,
            author_id = article.author_id,
            editor_id = editor.id,
            "Article edited by a user other than its author"
        );
    }

    let changes = article.changes(fields, Utc::now().naive_utc());
    let updated = articles.update(article.id, &changes).await?;
    info!(
        id = updated.id,
        old_slug = %article.slug,
        slug = %updated.slug,
        published = updated.published,
        "Updated article"
    );
    Ok(updated)
}

pub async fn like_article<S: AppState>(
    state: &S,
    user: &User,
    slug: &str,
) -> Result<(Article, Recorded), ApiError> {
    let article = state.article_repo().get_by_slug(slug, Visibility::Any).await?;
    let outcome = state.engagement_repo().like(user.id, article.id).await?;
    info!(article_id = article.id, user_id = user.id, ?outcome, "Like");
    Ok((article, outcome))
}

pub async fn dislike_article<S: AppState>(
    state: &S,
    user: &User,
    slug: &str,
) -> Result<(Article, Recorded), ApiError> {
    let article = state.article_repo().get_by_slug(slug, Visibility::Any).await?;
    let outcome = state.engagement_repo().dislike(user.id, article.id).await?;
    info!(article_id = article.id, user_id = user.id, ?outcome, "Dislike");
    Ok((article, outcome))
}

pub async fn profile<S: AppState>(state: &S, profile_id: i32) -> Result<Profile, ApiError> {
    state
        .user_repo()
        .find_profile(profile_id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Like article edits, profile edits are not restricted to the owner.
pub async fn edit_profile<S: AppState>(
    state: &S,
    profile_id: i32,
    editor: &User,
    form: &ProfileForm,
) -> Result<Profile, ApiError> {
    let existing = profile(state, profile_id).await?;
    let fields = form.validate()?;

    if existing.user_id != editor.id {
        warn!(
            profile_id,
            owner_id = existing.user_id,
            editor_id = editor.id,
            "Profile edited by a user other than its owner"
        );
    }

    let updated = state
        .user_repo()
        .update_profile(profile_id, &ProfileChanges::from(fields))
        .await?;
    info!(profile_id, "Updated profile");
    Ok(updated)
}
