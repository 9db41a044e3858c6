use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: ConnectionError,
    },

    #[error("Failed to configure connection: {0}")]
    Setup(#[from] diesel::result::Error),

    #[error("Failed to run migrations: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),
}

/// Opens `database_url` (`:memory:` works) and brings its schema up to date.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, DbError> {
    let mut connection =
        SqliteConnection::establish(database_url).map_err(|source| DbError::Connection {
            url: database_url.to_string(),
            source,
        })?;

    diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut connection)?;

    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(DbError::Migration)?;
    if !applied.is_empty() {
        info!(count = applied.len(), "Applied pending migrations");
    }

    Ok(connection)
}
