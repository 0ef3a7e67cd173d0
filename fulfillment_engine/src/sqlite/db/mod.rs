//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Writes that must be idempotent are expressed as single statements (`INSERT .. ON CONFLICT DO NOTHING RETURNING`,
//! `UPDATE .. WHERE <guard> RETURNING`). This keeps every check-and-set inside one SQLite write lock.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod badges;
pub mod messages;
pub mod notifications;
pub mod orders;
pub mod preferences;

const SQLITE_DB_URL: &str = "sqlite://data/tour_fulfillment.db";

pub fn db_url() -> String {
    let result = env::var("TFS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ TFS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// If `e` is a unique-constraint violation, returns the constraint description reported by SQLite
/// (e.g. `tourist_badges.badge_code`).
pub(crate) fn unique_violation(e: &SqlxError) -> Option<String> {
    match e {
        SqlxError::Database(db_err) if db_err.is_unique_violation() => Some(db_err.message().to_string()),
        _ => None,
    }
}
