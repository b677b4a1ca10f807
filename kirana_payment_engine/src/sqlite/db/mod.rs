//! Low-level query functions for the SQLite backend.
//!
//! Every function here runs against a caller-supplied connection, so units of work that span several
//! queries can share one database transaction.

use std::env;

use log::*;
use sqlx::{migrate::Migrator, sqlite::SqlitePoolOptions, SqlitePool};

pub mod orders;
pub mod transactions;

pub static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

pub const SQLITE_DB_URL: &str = "sqlite://data/kirana.db";

/// The database URL, from `KPG_DATABASE_URL`, falling back to [`SQLITE_DB_URL`].
pub fn db_url() -> String {
    env::var("KPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ KPG_DATABASE_URL is not set. Using the default, {SQLITE_DB_URL}");
        SQLITE_DB_URL.to_string()
    })
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    debug!("🗃️ Connection pool established for {url}");
    Ok(pool)
}

/// Creates the database file when it does not exist yet. Migrations need the file in place before
/// the pool opens.
pub async fn create_database_if_missing(url: &str) -> Result<(), sqlx::Error> {
    use sqlx::migrate::MigrateDatabase;
    if !sqlx::Sqlite::database_exists(url).await.unwrap_or(false) {
        info!("🗃️ Database {url} does not exist yet. Creating it.");
        sqlx::Sqlite::create_database(url).await?;
    }
    Ok(())
}
