use std::path::Path;

use chrono::{Duration, Utc};
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::{db_types::OrderNumber, SqliteDatabase};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

/// A throwaway database url in the system temp directory.
pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("tfs_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

pub async fn drop_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
}

/// Pretends the order's messages were last touched `age` ago, so that retry scans with a real deadline pick them up.
pub async fn age_messages(db: &SqliteDatabase, order_number: &OrderNumber, age: Duration) {
    sqlx::query("UPDATE outbound_messages SET updated_at = $1 WHERE order_number = $2")
        .bind(Utc::now() - age)
        .bind(order_number.as_str())
        .execute(db.pool())
        .await
        .expect("Error ageing messages");
}
