#![allow(dead_code)]

use blogger_service::db;
use diesel::sqlite::SqliteConnection;

pub fn establish_test_connection() -> SqliteConnection {
    db::establish_connection(":memory:").expect("Failed to create in-memory database")
}

pub mod server_utils {
    use super::*;
    use axum_test::TestServer;
    use blogger_service::{DefaultAppState, create_app};
    use std::sync::{Arc, Mutex};

    pub fn create_test_server() -> (TestServer, Arc<Mutex<SqliteConnection>>) {
        let connection = establish_test_connection();
        let db = Arc::new(Mutex::new(connection));

        let state = DefaultAppState::new(db.clone());
        let app = create_app(state);

        let server = TestServer::new(app).unwrap();
        (server, db)
    }
}

/// Request helpers for acting as a signed-in user.
pub mod request_utils {
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestRequest;
    use blogger_service::auth::REMOTE_USER_HEADER;

    pub fn as_user(request: TestRequest, username: &str) -> TestRequest {
        request.add_header(
            HeaderName::from_static(REMOTE_USER_HEADER),
            HeaderValue::from_str(username).unwrap(),
        )
    }

    pub fn location(response: &axum_test::TestResponse) -> String {
        response
            .header("location")
            .to_str()
            .unwrap()
            .to_string()
    }
}

/// Seeds rows through the repositories, bypassing HTTP.
pub mod seed {
    use super::*;
    use blogger_service::models::{Article, NewArticle, NewUser, User, slugify_title};
    use blogger_service::repositories::{
        ArticleRepository, EngagementRepository, SqliteArticleRepository,
        SqliteEngagementRepository, SqliteUserRepository, UserRepository,
    };
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::sync::{Arc, Mutex};

    pub fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    pub async fn user(db: &Arc<Mutex<SqliteConnection>>, username: &str) -> User {
        SqliteUserRepository::new(db.clone())
            .create(
                &NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                },
                username,
            )
            .await
            .expect("Failed to seed user")
    }

    /// Published articles are stamped `minutes` after [`base_time`], so a
    /// larger value lists first.
    pub async fn article(
        db: &Arc<Mutex<SqliteConnection>>,
        author: &User,
        title: &str,
        published: bool,
        minutes: i64,
    ) -> Article {
        let created = base_time() + Duration::minutes(minutes);
        let new_article = NewArticle {
            title: title.to_string(),
            author_id: author.id,
            created_at: created,
            updated_at: created,
            content: format!("Content of {title}"),
            published,
            publish_date: published.then_some(created),
            slug: slugify_title(title),
        };

        SqliteArticleRepository::new(db.clone())
            .create(&new_article)
            .await
            .expect("Failed to seed article")
    }

    pub async fn likes(db: &Arc<Mutex<SqliteConnection>>, article: &Article, users: &[&User]) {
        let repo = SqliteEngagementRepository::new(db.clone());
        for user in users {
            repo.like(user.id, article.id)
                .await
                .expect("Failed to seed like");
        }
    }

    pub async fn dislikes(db: &Arc<Mutex<SqliteConnection>>, article: &Article, users: &[&User]) {
        let repo = SqliteEngagementRepository::new(db.clone());
        for user in users {
            repo.dislike(user.id, article.id)
                .await
                .expect("Failed to seed dislike");
        }
    }

    /// `count` distinct voters named `<prefix>0`, `<prefix>1`, ...
    pub async fn voters(db: &Arc<Mutex<SqliteConnection>>, prefix: &str, count: usize) -> Vec<User> {
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            created.push(user(db, &format!("{prefix}{i}")).await);
        }
        created
    }
}

pub mod test_utils {
    use blogger_service::models::{Article, Dislike, Like, Profile};
    use blogger_service::schema::{articles, dislikes, likes, profiles};
    use diesel::prelude::*;
    use diesel::sqlite::SqliteConnection;

    pub fn count_articles(conn: &mut SqliteConnection) -> i64 {
        articles::table
            .count()
            .get_result(conn)
            .expect("Failed to count articles")
    }

    pub fn count_likes(conn: &mut SqliteConnection, article_id: i32) -> i64 {
        likes::table
            .filter(likes::article_id.eq(article_id))
            .count()
            .get_result(conn)
            .expect("Failed to count likes")
    }

    pub fn count_dislikes(conn: &mut SqliteConnection, article_id: i32) -> i64 {
        dislikes::table
            .filter(dislikes::article_id.eq(article_id))
            .count()
            .get_result(conn)
            .expect("Failed to count dislikes")
    }

    pub fn likes_for(conn: &mut SqliteConnection, article_id: i32) -> Vec<Like> {
        likes::table
            .filter(likes::article_id.eq(article_id))
            .select(Like::as_select())
            .load(conn)
            .expect("Failed to load likes")
    }

    pub fn dislikes_for(conn: &mut SqliteConnection, article_id: i32) -> Vec<Dislike> {
        dislikes::table
            .filter(dislikes::article_id.eq(article_id))
            .select(Dislike::as_select())
            .load(conn)
            .expect("Failed to load dislikes")
    }

    pub fn get_article_by_slug(conn: &mut SqliteConnection, slug: &str) -> Option<Article> {
        articles::table
            .filter(articles::slug.eq(slug))
            .select(Article::as_select())
            .first(conn)
            .optional()
            .expect("Failed to query article")
    }

    pub fn get_article_by_id(conn: &mut SqliteConnection, id: i32) -> Article {
        articles::table
            .find(id)
            .select(Article::as_select())
            .first(conn)
            .expect("Article should exist")
    }

    pub fn get_profile_for_user(conn: &mut SqliteConnection, user_id: i32) -> Profile {
        profiles::table
            .filter(profiles::user_id.eq(user_id))
            .select(Profile::as_select())
            .first(conn)
            .expect("Profile should exist")
    }
}
