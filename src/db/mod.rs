//! SQLite persistence.
//!
//! The query modules take a `&mut SqliteConnection` so the services can run several of
//! them inside one transaction (`&mut *tx`).

pub mod replies;
pub mod topics;
pub mod users;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Opens the pool and applies pending migrations.
///
/// An in-memory database exists only as long as its connection, so it gets a single
/// connection that is never recycled.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::debug!("database ready at {}", database_url);
    Ok(pool)
}

/// Fresh, migrated in-memory database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    connect("sqlite::memory:").await
}
