//! Installed external effect plugins
//!
//! Bookkeeping only: a row records a plugin's display name, its path on disk
//! and the parameter values last used. Rows are merged into the list of
//! available transformations shown in the chain editor; loading the actual
//! plugin binary is the audio backend's concern.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::{Result, StorageError};

/// An installed plugin row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Record a plugin. Re-registering the same path is a no-op.
pub async fn save_plugin(pool: &SqlitePool, name: &str, path: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO plugins (name, path, params) VALUES (?, ?, '{}')")
        .bind(name)
        .bind(path)
        .execute(pool)
        .await?;

    Ok(())
}

/// All installed plugins, sorted by name
pub async fn installed_plugins(pool: &SqlitePool) -> Result<Vec<InstalledPlugin>> {
    let rows = sqlx::query("SELECT id, name, path, params FROM plugins ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let params = serde_json::from_str(&row.get::<String, _>("params"))
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            Ok(InstalledPlugin {
                id: row.get("id"),
                name: row.get("name"),
                path: row.get("path"),
                params,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    #[tokio::test]
    async fn save_and_list_plugins() {
        let pool = database::in_memory().await.unwrap();

        save_plugin(&pool, "TapeSat", "/plugins/tapesat.vst3")
            .await
            .unwrap();
        save_plugin(&pool, "AirEQ", "/plugins/aireq.vst3")
            .await
            .unwrap();

        let plugins = installed_plugins(&pool).await.unwrap();
        let names: Vec<_> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["AirEQ", "TapeSat"]);
    }

    #[tokio::test]
    async fn reregistering_same_path_is_noop() {
        let pool = database::in_memory().await.unwrap();

        save_plugin(&pool, "TapeSat", "/plugins/tapesat.vst3")
            .await
            .unwrap();
        save_plugin(&pool, "TapeSat", "/plugins/tapesat.vst3")
            .await
            .unwrap();

        assert_eq!(installed_plugins(&pool).await.unwrap().len(), 1);
    }
}
