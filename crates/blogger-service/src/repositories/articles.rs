use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use tracing::debug;

use super::lock;
use super::traits::{ArticleQuery, ArticleRepository, ListArticlesResult, Visibility};
use crate::errors::ApiError;
use crate::models::{Article, ArticleChanges, AuthoredArticle, NewArticle};
use crate::schema::{articles, users};
use crate::validation::{FormErrors, ValidationError};

#[derive(Clone)]
pub struct SqliteArticleRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteArticleRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

/// `LIKE` pattern matching `keyword` anywhere, with wildcards taken literally.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn filtered(query: &ArticleQuery) -> articles::BoxedQuery<'static, Sqlite> {
    let mut statement = articles::table.into_boxed();

    if query.visibility == Visibility::Published {
        statement = statement.filter(articles::published.eq(true));
    }

    if let Some(author_id) = query.author_id {
        statement = statement.filter(articles::author_id.eq(author_id));
    }

    // SQLite's LIKE is case-insensitive for ASCII
    for keyword in &query.title_keywords {
        statement = statement.filter(articles::title.like(contains_pattern(keyword)).escape('\\'));
    }

    statement
}

/// Rejects a title or slug already used by an article other than `exclude_id`.
fn ensure_unique(
    conn: &mut SqliteConnection,
    title: &str,
    slug: &str,
    exclude_id: Option<i32>,
) -> Result<(), ApiError> {
    let exclude_id = exclude_id.unwrap_or(-1);

    let title_taken = diesel::select(exists(
        articles::table
            .filter(articles::title.eq(title))
            .filter(articles::id.ne(exclude_id)),
    ))
    .get_result::<bool>(conn)?;
    if title_taken {
        return Err(FormErrors::single("title", ValidationError::Duplicate("title")).into());
    }

    let slug_taken = diesel::select(exists(
        articles::table
            .filter(articles::slug.eq(slug))
            .filter(articles::id.ne(exclude_id)),
    ))
    .get_result::<bool>(conn)?;
    if slug_taken {
        return Err(FormErrors::single("title", ValidationError::Duplicate("slug")).into());
    }

    Ok(())
}

/// A unique violation that slipped past [`ensure_unique`] is still a title clash.
fn title_conflict(err: ApiError) -> ApiError {
    match err {
        ApiError::ConstraintViolation(message) => {
            debug!(error = %message, "Article uniqueness enforced by storage");
            FormErrors::single("title", ValidationError::Duplicate("title")).into()
        }
        other => other,
    }
}

#[async_trait]
impl ArticleRepository for SqliteArticleRepository {
    async fn create(&self, article: &NewArticle) -> Result<Article, ApiError> {
        let mut conn = lock(&self.db)?;
        ensure_unique(&mut conn, &article.title, &article.slug, None)?;

        let result = diesel::insert_into(articles::table)
            .values(article)
            .returning(Article::as_returning())
            .get_result::<Article>(&mut *conn)
            .map_err(|err| title_conflict(err.into()))?;
        Ok(result)
    }

    async fn update(&self, id: i32, changes: &ArticleChanges) -> Result<Article, ApiError> {
        let mut conn = lock(&self.db)?;
        ensure_unique(&mut conn, &changes.title, &changes.slug, Some(id))?;

        let result = diesel::update(articles::table.find(id))
            .set(changes)
            .returning(Article::as_returning())
            .get_result::<Article>(&mut *conn)
            .map_err(|err| title_conflict(err.into()))?;
        Ok(result)
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Option<Article>, ApiError> {
        let mut conn = lock(&self.db)?;
        let mut statement = articles::table
            .filter(articles::slug.eq(slug))
            .into_boxed();
        if visibility == Visibility::Published {
            statement = statement.filter(articles::published.eq(true));
        }

        let result = statement
            .select(Article::as_select())
            .first::<Article>(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn list(&self, query: &ArticleQuery) -> Result<ListArticlesResult, ApiError> {
        let mut conn = lock(&self.db)?;

        let total = filtered(query).count().get_result::<i64>(&mut *conn)?;

        let mut statement = filtered(query)
            .order((articles::publish_date.desc(), articles::id.desc()))
            .select(Article::as_select());
        if let Some(limit) = query.limit {
            statement = statement.limit(limit);
        }
        if let Some(offset) = query.offset {
            statement = statement.offset(offset);
        }
        let rows = statement.load::<Article>(&mut *conn)?;

        let author_ids: Vec<i32> = rows.iter().map(|a| a.author_id).collect();
        let authors: HashMap<i32, String> = users::table
            .filter(users::id.eq_any(author_ids))
            .select((users::id, users::username))
            .load::<(i32, String)>(&mut *conn)?
            .into_iter()
            .collect();

        let items = rows
            .into_iter()
            .map(|article| {
                let author = authors.get(&article.author_id).cloned().unwrap_or_default();
                AuthoredArticle { article, author }
            })
            .collect();

        Ok(ListArticlesResult { items, total })
    }

    async fn count(&self, query: &ArticleQuery) -> Result<i64, ApiError> {
        let mut conn = lock(&self.db)?;
        let total = filtered(query).count().get_result::<i64>(&mut *conn)?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("python"), "%python%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("snake_case"), "%snake\\_case%");
    }

    #[test]
    fn test_constraint_violation_becomes_title_error() {
        let err = title_conflict(ApiError::ConstraintViolation(
            "UNIQUE constraint failed: articles.title".to_string(),
        ));
        match err {
            ApiError::Validation(errors) => {
                let messages = errors.field("title").unwrap();
                assert_eq!(messages.len(), 1);
                assert!(messages[0].contains("already exists"));
            }
            other => panic!("expected a title validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_pass_through_title_conflict() {
        assert!(matches!(
            title_conflict(ApiError::NotFound),
            ApiError::NotFound
        ));
    }

    #[test]
    fn test_storage_level_duplicate_title_is_a_title_error() {
        let mut conn = crate::db::establish_connection(":memory:").unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let author_id: i32 = diesel::insert_into(users::table)
            .values((users::username.eq("alice"), users::email.eq("alice@example.com")))
            .returning(users::id)
            .get_result(&mut conn)
            .unwrap();
        let article = NewArticle {
            title: "Hello World".to_string(),
            author_id,
            created_at: now,
            updated_at: now,
            content: "Body".to_string(),
            published: false,
            publish_date: None,
            slug: "hello-world".to_string(),
        };

        // Skip ensure_unique so the UNIQUE index itself rejects the row
        let mut insert = || {
            diesel::insert_into(articles::table)
                .values(&article)
                .execute(&mut conn)
                .map_err(|err| title_conflict(err.into()))
        };
        assert!(insert().is_ok());
        match insert() {
            Err(ApiError::Validation(errors)) => assert!(errors.field("title").is_some()),
            other => panic!("expected a title validation error, got {other:?}"),
        }
    }
}
