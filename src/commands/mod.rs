pub mod categories;
pub mod config;
pub mod import;
pub mod labels;
pub mod search;

use anyhow::{Context, Result};

use crate::{config::Config, store::SqliteStore};

fn open_store(config: &Config) -> Result<SqliteStore> {
   SqliteStore::open(&config.db_path)
      .with_context(|| format!("failed to open database at {}", config.db_path.display()))
}
