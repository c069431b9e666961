pub mod filter_utils;
pub mod models;
pub mod repository;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use util::{config, paths};

/// Opens the configured database. `DATABASE_PATH` may be a full `sqlite:` DSN or a
/// plain file path; for the latter the parent directory is created first.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();
    let url = if path_or_url.starts_with("sqlite:") {
        path_or_url
    } else {
        paths::ensure_parent_dir(&path_or_url)
            .map_err(|e| DbErr::Custom(format!("Cannot create database directory: {e}")))?;
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    tracing::info!(url = %url, "Connecting to database");
    let mut opts = ConnectOptions::new(url);
    opts.sqlx_logging(false);
    Database::connect(opts).await
}
