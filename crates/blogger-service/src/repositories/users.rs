use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::lock;
use super::traits::UserRepository;
use crate::errors::ApiError;
use crate::models::{NewProfile, NewUser, Profile, ProfileChanges, User};
use crate::schema::{profiles, users};

#[derive(Clone)]
pub struct SqliteUserRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteUserRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser, full_name: &str) -> Result<User, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let created = diesel::insert_into(users::table)
                .values(user)
                .returning(User::as_returning())
                .get_result::<User>(conn)?;

            diesel::insert_into(profiles::table)
                .values(&NewProfile {
                    user_id: created.id,
                    full_name: full_name.to_string(),
                })
                .execute(conn)?;

            Ok(created)
        })?;
        Ok(result)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first::<User>(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = users::table
            .find(id)
            .select(User::as_select())
            .first::<User>(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn profile_for_user(&self, user_id: i32) -> Result<Option<Profile>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = profiles::table
            .filter(profiles::user_id.eq(user_id))
            .select(Profile::as_select())
            .first::<Profile>(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn find_profile(&self, profile_id: i32) -> Result<Option<Profile>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = profiles::table
            .find(profile_id)
            .select(Profile::as_select())
            .first::<Profile>(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn update_profile(
        &self,
        profile_id: i32,
        changes: &ProfileChanges,
    ) -> Result<Profile, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::update(profiles::table.find(profile_id))
            .set(changes)
            .returning(Profile::as_returning())
            .get_result::<Profile>(&mut *conn)?;
        Ok(result)
    }
}
