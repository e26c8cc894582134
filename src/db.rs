use log::*;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use std::str::FromStr;

use crate::config::Config;
use crate::error::Error;

/**
 * Create the SQLite connection pool and bring the schema up to date
 *
 * Foreign keys are switched on for every connection, the cascading delete
 * from questions to choices depends on it
 */
pub async fn create_pool(config: &Config) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/**
 * Apply the embedded migrations from `migrations/`
 */
pub async fn migrate(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

/**
 * A private in-memory database for tests
 *
 * A single connection, since every in-memory connection is its own database
 */
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    migrate(&pool).await.expect("migrations");
    pool
}
