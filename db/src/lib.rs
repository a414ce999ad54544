pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use util::config;

/// Turns `DATABASE_PATH` into a connection URL. DSNs pass through untouched;
/// bare paths become SQLite files, created on first use.
pub fn database_url(path_or_url: &str) -> String {
    if path_or_url.starts_with("sqlite:") {
        return path_or_url.to_owned();
    }
    if let Some(parent) = Path::new(path_or_url).parent() {
        // SQLite won't create intermediate dirs.
        let _ = std::fs::create_dir_all(parent);
    }
    format!("sqlite://{path_or_url}?mode=rwc")
}

pub async fn try_connect(path_or_url: &str) -> Result<DatabaseConnection, DbErr> {
    let url = database_url(path_or_url);
    let mut opts = ConnectOptions::new(url.clone());
    opts.sqlx_logging(false);

    let db = Database::connect(opts).await?;
    tracing::info!(target: "db", %url, "database connected");
    Ok(db)
}

pub async fn connect() -> DatabaseConnection {
    try_connect(&config::database_path())
        .await
        .expect("Failed to connect to database")
}
