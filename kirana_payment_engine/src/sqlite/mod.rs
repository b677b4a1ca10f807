pub mod db;
mod sqlite_impl;

pub use db::{create_database_if_missing, db_url, new_pool, MIGRATOR, SQLITE_DB_URL};
pub use sqlite_impl::SqliteDatabase;
