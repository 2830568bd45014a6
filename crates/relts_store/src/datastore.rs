//! A datastore is a directory holding `relts.json` and, for SQLite, the database file.

use std::path::{Path, PathBuf};

use relts_core::TsResult;

use crate::config::{CONFIG_FILE_NAME, SQLITE_FILE_NAME};
use crate::{TimeSeriesStore, TsConfig};

pub fn config_path(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE_NAME)
}

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(SQLITE_FILE_NAME)
}

pub fn load_or_init_config(base: &Path) -> TsResult<TsConfig> {
    TsConfig::load_or_init(base, &default_sqlite_path(base))
}

/// Loads the datastore config and connects, running pending migrations.
pub async fn open_store(base: &Path) -> TsResult<TimeSeriesStore> {
    let config = load_or_init_config(base)?;
    TimeSeriesStore::connect(&config, base).await
}
