//! Preset repository
//!
//! CRUD for persisted presets with a single "default" slot. The effect chain
//! and filename rule columns hold opaque JSON blobs; their shape is whatever
//! the current `chef-core` types serialize to.

use chef_core::{NameChangeParameters, Preset, PresetMetadata, Transformation};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{Result, StorageError};

/// Metadata for every stored preset, in insertion order, for list rendering
pub async fn get_metadata(pool: &SqlitePool) -> Result<Vec<PresetMetadata>> {
    let rows = sqlx::query("SELECT id, name, is_default FROM presets ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(metadata_from_row).collect())
}

/// Full preset by id
pub async fn get_by_id(pool: &SqlitePool, preset_id: i64) -> Result<Preset> {
    let row = sqlx::query(
        "SELECT ext, transformations, name_changer FROM presets WHERE id = ?",
    )
    .bind(preset_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StorageError::not_found("Preset", preset_id.to_string()))?;

    preset_from_row(&row)
}

/// The preset currently flagged default, if any
pub async fn get_default(pool: &SqlitePool) -> Result<Option<Preset>> {
    let row = sqlx::query(
        "SELECT ext, transformations, name_changer FROM presets WHERE is_default = 1",
    )
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(preset_from_row).transpose()
}

/// Move the default flag to `preset_id`.
///
/// Clears the current holder first, then sets the new one. The two writes are
/// not transactional: a crash in between leaves zero defaults, never two.
pub async fn make_default(pool: &SqlitePool, preset_id: i64) -> Result<()> {
    sqlx::query("UPDATE presets SET is_default = 0 WHERE is_default = 1")
        .execute(pool)
        .await?;

    let result = sqlx::query("UPDATE presets SET is_default = 1 WHERE id = ?")
        .bind(preset_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Preset", preset_id.to_string()));
    }

    Ok(())
}

/// In-place rename; no uniqueness constraint on names
pub async fn rename_preset(pool: &SqlitePool, preset_id: i64, new_name: &str) -> Result<()> {
    let result = sqlx::query("UPDATE presets SET name = ? WHERE id = ?")
        .bind(new_name)
        .bind(preset_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Preset", preset_id.to_string()));
    }

    Ok(())
}

/// Insert a new preset row under a freshly generated name.
///
/// Always creates a new row; existing presets are never overwritten by id.
pub async fn save_preset(pool: &SqlitePool, preset: &Preset) -> Result<PresetMetadata> {
    let name = uuid::Uuid::new_v4().to_string();
    let transformations = serde_json::to_string(&preset.transformations)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    let name_changer = serde_json::to_string(&preset.name_change_parameters)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    let result = sqlx::query(
        "INSERT INTO presets (name, is_default, ext, transformations, name_changer)
         VALUES (?, 0, ?, ?, ?)",
    )
    .bind(&name)
    .bind(&preset.ext)
    .bind(transformations)
    .bind(name_changer)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(id, name = %name, "preset saved");

    Ok(PresetMetadata {
        id,
        name,
        default: false,
    })
}

/// Remove a preset row. Loaded copies in the UI are not invalidated.
pub async fn delete(pool: &SqlitePool, preset_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM presets WHERE id = ?")
        .bind(preset_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Preset", preset_id.to_string()));
    }
    info!(id = preset_id, "preset deleted");

    Ok(())
}

fn metadata_from_row(row: &SqliteRow) -> PresetMetadata {
    PresetMetadata {
        id: row.get::<i64, _>("id"),
        name: row.get::<String, _>("name"),
        default: row.get::<i64, _>("is_default") != 0,
    }
}

fn preset_from_row(row: &SqliteRow) -> Result<Preset> {
    let transformations: Vec<Transformation> =
        serde_json::from_str(&row.get::<String, _>("transformations"))
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    let name_change_parameters: NameChangeParameters =
        serde_json::from_str(&row.get::<String, _>("name_changer"))
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    Ok(Preset {
        ext: row.get::<String, _>("ext"),
        transformations,
        name_change_parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use chef_core::NameChangeMode;
    use serde_json::json;

    fn sample_preset() -> Preset {
        let mut compressor = Transformation::named("Compressor");
        compressor
            .params
            .insert("threshold_db".to_string(), json!(-18.0));
        compressor.params.insert("ratio".to_string(), json!(4.0));

        Preset {
            ext: "wav".to_string(),
            transformations: vec![compressor, Transformation::named("Reverb")],
            name_change_parameters: NameChangeParameters::wildcards("mixed_$item"),
        }
    }

    #[tokio::test]
    async fn save_then_get_by_id_round_trips() {
        let pool = database::in_memory().await.unwrap();
        let preset = sample_preset();

        let metadata = save_preset(&pool, &preset).await.unwrap();
        assert!(!metadata.default);
        assert!(!metadata.name.is_empty());

        let loaded = get_by_id(&pool, metadata.id).await.unwrap();
        assert_eq!(loaded, preset);
    }

    #[tokio::test]
    async fn save_always_inserts_a_new_row() {
        let pool = database::in_memory().await.unwrap();
        let preset = sample_preset();

        let first = save_preset(&pool, &preset).await.unwrap();
        let second = save_preset(&pool, &preset).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.name, second.name);

        assert_eq!(get_metadata(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_by_id_missing_is_not_found() {
        let pool = database::in_memory().await.unwrap();
        let err = get_by_id(&pool, 999).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn default_slot_moves_exclusively() {
        let pool = database::in_memory().await.unwrap();
        let a = save_preset(&pool, &sample_preset()).await.unwrap();
        let b = save_preset(&pool, &sample_preset()).await.unwrap();

        make_default(&pool, a.id).await.unwrap();
        make_default(&pool, b.id).await.unwrap();

        let metadata = get_metadata(&pool).await.unwrap();
        let defaults: Vec<_> = metadata.iter().filter(|m| m.default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, b.id);
    }

    #[tokio::test]
    async fn get_default_when_none_is_none() {
        let pool = database::in_memory().await.unwrap();
        save_preset(&pool, &sample_preset()).await.unwrap();
        assert!(get_default(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_default_returns_flagged_preset() {
        let pool = database::in_memory().await.unwrap();
        let preset = sample_preset();
        let metadata = save_preset(&pool, &preset).await.unwrap();
        make_default(&pool, metadata.id).await.unwrap();

        let loaded = get_default(&pool).await.unwrap().unwrap();
        assert_eq!(loaded, preset);
        assert_eq!(
            loaded.name_change_parameters.mode,
            NameChangeMode::Wildcards
        );
    }

    #[tokio::test]
    async fn rename_updates_metadata() {
        let pool = database::in_memory().await.unwrap();
        let metadata = save_preset(&pool, &sample_preset()).await.unwrap();

        rename_preset(&pool, metadata.id, "Drum Bus").await.unwrap();
        let all = get_metadata(&pool).await.unwrap();
        assert_eq!(all[0].name, "Drum Bus");
    }

    #[tokio::test]
    async fn rename_allows_duplicate_names() {
        let pool = database::in_memory().await.unwrap();
        let a = save_preset(&pool, &sample_preset()).await.unwrap();
        let b = save_preset(&pool, &sample_preset()).await.unwrap();

        rename_preset(&pool, a.id, "Same").await.unwrap();
        rename_preset(&pool, b.id, "Same").await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let pool = database::in_memory().await.unwrap();
        let metadata = save_preset(&pool, &sample_preset()).await.unwrap();

        delete(&pool, metadata.id).await.unwrap();
        assert!(get_metadata(&pool).await.unwrap().is_empty());

        let err = delete(&pool, metadata.id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
