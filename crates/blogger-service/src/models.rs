use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::validation::{ValidArticle, ValidProfile};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::profiles)]
pub struct NewProfile {
    pub user_id: i32,
    pub full_name: String,
}

/// Editable profile columns. `None` clears the column.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(treat_none_as_null = true)]
pub struct ProfileChanges {
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
}

impl From<ValidProfile> for ProfileChanges {
    fn from(profile: ValidProfile) -> Self {
        ProfileChanges {
            full_name: profile.full_name,
            bio: profile.bio,
            avatar: profile.avatar,
            github: profile.github,
            twitter: profile.twitter,
            facebook: profile.facebook,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub content: String,
    pub published: bool,
    pub publish_date: Option<NaiveDateTime>,
    pub slug: String,
}

impl Article {
    pub fn absolute_url(&self) -> String {
        format!("/article/{}/", self.slug)
    }

    /// Computes the full-row update for saving `fields` over this article.
    /// The slug and publish date are re-derived, never taken from input.
    pub fn changes(&self, fields: ValidArticle, now: NaiveDateTime) -> ArticleChanges {
        ArticleChanges {
            slug: slugify_title(&fields.title),
            publish_date: resolve_publish_date(fields.published, self.publish_date, now),
            title: fields.title,
            content: fields.content,
            published: fields.published,
            updated_at: now,
        }
    }
}

/// An article together with its author's username, as listed to readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub author: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::articles)]
pub struct NewArticle {
    pub title: String,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub content: String,
    pub published: bool,
    pub publish_date: Option<NaiveDateTime>,
    pub slug: String,
}

impl NewArticle {
    pub fn new(author_id: i32, fields: ValidArticle, now: NaiveDateTime) -> Self {
        NewArticle {
            slug: slugify_title(&fields.title),
            publish_date: resolve_publish_date(fields.published, None, now),
            title: fields.title,
            author_id,
            created_at: now,
            updated_at: now,
            content: fields.content,
            published: fields.published,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(treat_none_as_null = true)]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
    pub published: bool,
    pub publish_date: Option<NaiveDateTime>,
    pub slug: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::likes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub article_id: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::dislikes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Dislike {
    pub id: i32,
    pub user_id: i32,
    pub article_id: i32,
}

pub fn slugify_title(title: &str) -> String {
    slug::slugify(title)
}

/// `publish_date` is kept while an article stays published, stamped when it
/// first becomes published and cleared when it is unpublished.
pub fn resolve_publish_date(
    published: bool,
    current: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    if published {
        Some(current.unwrap_or(now))
    } else {
        None
    }
}
