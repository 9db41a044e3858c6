use std::sync::{Mutex, MutexGuard};

use diesel::sqlite::SqliteConnection;
use tracing::error;

use crate::errors::ApiError;

pub mod articles;
pub mod engagement;
pub mod traits;
pub mod users;

pub use articles::SqliteArticleRepository;
pub use engagement::SqliteEngagementRepository;
pub use traits::*;
pub use users::SqliteUserRepository;

fn lock(db: &Mutex<SqliteConnection>) -> Result<MutexGuard<'_, SqliteConnection>, ApiError> {
    db.lock().map_err(|_| {
        error!("Database connection mutex poisoned");
        ApiError::InternalError
    })
}
