//! AudioChef Storage
//!
//! SQLite persistence for presets and installed plugins.
//!
//! Migrations are embedded and run when the database is opened, so any
//! execution context that can reach the file gets a usable schema.
//!
//! # Example
//!
//! ```rust,no_run
//! use chef_core::Preset;
//!
//! # async fn example() -> Result<(), chef_storage::StorageError> {
//! let pool = chef_storage::database::open(std::path::Path::new("presets.db")).await?;
//!
//! let metadata = chef_storage::presets::save_preset(&pool, &Preset::empty()).await?;
//! let loaded = chef_storage::presets::get_by_id(&pool, metadata.id).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod database;
mod error;
pub mod plugins;
pub mod presets;

pub use database::{create_pool, open, run_migrations};
pub use error::{Result, StorageError};
pub use plugins::InstalledPlugin;
pub use sqlx::sqlite::SqlitePool;
