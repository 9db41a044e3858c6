use std::sync::{Arc, Mutex};

use axum::Router;
use diesel::sqlite::SqliteConnection;

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod publication;
pub mod ranking;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod validation;

use repositories::{
    ArticleRepository, EngagementRepository, SqliteArticleRepository, SqliteEngagementRepository,
    SqliteUserRepository, UserRepository,
};

pub trait AppState: Clone + Send + Sync + 'static {
    type Articles: ArticleRepository;
    type Engagements: EngagementRepository;
    type Users: UserRepository;

    fn article_repo(&self) -> &Self::Articles;
    fn engagement_repo(&self) -> &Self::Engagements;
    fn user_repo(&self) -> &Self::Users;
}

/// SQLite-backed state sharing one connection between the repositories.
#[derive(Clone)]
pub struct DefaultAppState {
    articles: SqliteArticleRepository,
    engagements: SqliteEngagementRepository,
    users: SqliteUserRepository,
}

impl DefaultAppState {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self {
            articles: SqliteArticleRepository::new(db.clone()),
            engagements: SqliteEngagementRepository::new(db.clone()),
            users: SqliteUserRepository::new(db),
        }
    }
}

impl AppState for DefaultAppState {
    type Articles = SqliteArticleRepository;
    type Engagements = SqliteEngagementRepository;
    type Users = SqliteUserRepository;

    fn article_repo(&self) -> &Self::Articles {
        &self.articles
    }

    fn engagement_repo(&self) -> &Self::Engagements {
        &self.engagements
    }

    fn user_repo(&self) -> &Self::Users {
        &self.users
    }
}

pub fn create_app(state: DefaultAppState) -> Router {
    routes::create_router().with_state(state)
}
