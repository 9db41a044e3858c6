use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::dsl::{count_star, exists};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::debug;

use super::lock;
use super::traits::{EngagementCounts, EngagementKind, EngagementRepository, Recorded};
use crate::errors::ApiError;
use crate::schema::{dislikes, likes};

#[derive(Clone)]
pub struct SqliteEngagementRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteEngagementRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

/// A duplicate vote rejected by the UNIQUE (user_id, article_id) constraint
/// means another request recorded it first.
fn recorded(insert: QueryResult<usize>) -> Result<Recorded, ApiError> {
    match insert.map_err(ApiError::from) {
        Ok(_) => Ok(Recorded::Created),
        Err(ApiError::ConstraintViolation(message)) => {
            debug!(error = %message, "Duplicate vote rejected by storage");
            Ok(Recorded::AlreadyRecorded)
        }
        Err(err) => Err(err),
    }
}

fn record_like(
    conn: &mut SqliteConnection,
    user_id: i32,
    article_id: i32,
) -> Result<Recorded, ApiError> {
    let existing = diesel::select(exists(
        likes::table
            .filter(likes::user_id.eq(user_id))
            .filter(likes::article_id.eq(article_id)),
    ))
    .get_result::<bool>(conn)?;
    if existing {
        return Ok(Recorded::AlreadyRecorded);
    }

    recorded(
        diesel::insert_into(likes::table)
            .values((likes::user_id.eq(user_id), likes::article_id.eq(article_id)))
            .execute(conn),
    )
}

fn record_dislike(
    conn: &mut SqliteConnection,
    user_id: i32,
    article_id: i32,
) -> Result<Recorded, ApiError> {
    let existing = diesel::select(exists(
        dislikes::table
            .filter(dislikes::user_id.eq(user_id))
            .filter(dislikes::article_id.eq(article_id)),
    ))
    .get_result::<bool>(conn)?;
    if existing {
        return Ok(Recorded::AlreadyRecorded);
    }

    recorded(
        diesel::insert_into(dislikes::table)
            .values((
                dislikes::user_id.eq(user_id),
                dislikes::article_id.eq(article_id),
            ))
            .execute(conn),
    )
}

#[async_trait]
impl EngagementRepository for SqliteEngagementRepository {
    async fn record(
        &self,
        kind: EngagementKind,
        user_id: i32,
        article_id: i32,
    ) -> Result<Recorded, ApiError> {
        let mut conn = lock(&self.db)?;
        match kind {
            EngagementKind::Like => record_like(&mut conn, user_id, article_id),
            EngagementKind::Dislike => record_dislike(&mut conn, user_id, article_id),
        }
    }

    async fn counts(&self, article_ids: &[i32]) -> Result<HashMap<i32, EngagementCounts>, ApiError> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = lock(&self.db)?;

        let like_counts: HashMap<i32, i64> = likes::table
            .filter(likes::article_id.eq_any(article_ids.to_vec()))
            .group_by(likes::article_id)
            .select((likes::article_id, count_star()))
            .load::<(i32, i64)>(&mut *conn)?
            .into_iter()
            .collect();

        let dislike_counts: HashMap<i32, i64> = dislikes::table
            .filter(dislikes::article_id.eq_any(article_ids.to_vec()))
            .group_by(dislikes::article_id)
            .select((dislikes::article_id, count_star()))
            .load::<(i32, i64)>(&mut *conn)?
            .into_iter()
            .collect();

        Ok(article_ids
            .iter()
            .map(|id| {
                let likes = like_counts.get(id).copied().unwrap_or(0);
                let dislikes = dislike_counts.get(id).copied().unwrap_or(0);
                (*id, EngagementCounts::new(likes, dislikes))
            })
            .collect())
    }
}
