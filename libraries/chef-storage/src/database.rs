/// Database connection and migrations
use crate::error::{Result, StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Open a pool on a database file, creating the file if missing
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    Ok(pool)
}

/// Open (and migrate) the preset database at a filesystem path
pub async fn open(path: &Path) -> Result<SqlitePool> {
    info!(path = %path.display(), "opening preset database");
    let url = format!("sqlite://{}", path.display());
    let pool = create_pool(&url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Open an in-memory database (for testing).
///
/// A single connection, since every `sqlite::memory:` connection is its own
/// database.
pub async fn in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Embedded migrations for reliability across execution contexts
    const MIGRATIONS: &[&str] = &[
        include_str!("../migrations/20240801000001_create_presets.sql"),
        include_str!("../migrations/20240801000002_create_plugins.sql"),
    ];

    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
    }
    info!(count = MIGRATIONS.len(), "migrations applied");

    Ok(())
}
