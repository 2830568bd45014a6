use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sea_orm::ConnectOptions;
use serde::{Deserialize, Serialize};

use relts_core::{TsError, TsResult};

pub(crate) const CONFIG_FILE_NAME: &str = "relts.json";
pub(crate) const SQLITE_FILE_NAME: &str = "relts.sqlite";

/// Backend selection, tagged by `backend` in `relts.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// A relative `path` is resolved against the datastore directory.
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

/// Connection pool tuning; unset fields keep the sea-orm defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

impl PoolConfig {
    pub(crate) fn apply(&self, options: &mut ConnectOptions) {
        if let Some(max) = self.max_connections {
            options.max_connections(max);
        }
        if let Some(min) = self.min_connections {
            options.min_connections(min);
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.acquire_timeout_ms {
            options.acquire_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.idle_timeout_ms {
            options.idle_timeout(Duration::from_millis(ms));
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TsConfig {
    pub database: DatabaseConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolConfig>,
    /// Keep a process-local copy of each dictionary. Defaults to on.
    #[serde(default)]
    pub cache_dictionaries: Option<bool>,
    /// Write the fact and its latest-value entry in one transaction. Defaults to off.
    #[serde(default)]
    pub atomic_inserts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failpoints: Option<Vec<String>>,
}

impl TsConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            cache_dictionaries: Some(true),
            atomic_inserts: Some(false),
            failpoints: None,
        }
    }

    /// Reads `relts.json` from `base_dir`, writing a SQLite default first when absent.
    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> TsResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| TsError::storage("create datastore dir", err.to_string()))?;
        let config_path = base_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::read(&config_path);
        }
        let config = Self::default_sqlite(default_sqlite_path.to_string_lossy());
        config.write(&config_path)?;
        log::info!("relts: wrote default config to {}", config_path.display());
        Ok(config)
    }

    pub fn read(path: &Path) -> TsResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| TsError::storage("read config", err.to_string()))?;
        let config: TsConfig = serde_json::from_str(&raw).map_err(|err| {
            TsError::invalid(format!("config {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn write(&self, path: &Path) -> TsResult<()> {
        let payload = serde_json::to_string_pretty(self)
            .map_err(|err| TsError::storage("serialize config", err.to_string()))?;
        fs::write(path, payload).map_err(|err| TsError::storage("write config", err.to_string()))
    }

    pub fn validate(&self) -> TsResult<()> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => {}
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => {
                if url.trim().is_empty() {
                    return Err(TsError::invalid(format!(
                        "{} backend needs a connection url",
                        self.backend_name()
                    )));
                }
            }
        }
        if let Some(pool) = &self.pool {
            if let (Some(min), Some(max)) = (pool.min_connections, pool.max_connections) {
                if min > max {
                    return Err(TsError::invalid(format!(
                        "pool min_connections {min} exceeds max_connections {max}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> TsResult<PathBuf> {
        let DatabaseConfig::Sqlite { path } = &self.database else {
            return Err(TsError::invalid(format!(
                "{} backend has no sqlite file",
                self.backend_name()
            )));
        };
        let candidate = PathBuf::from(path.as_deref().unwrap_or(SQLITE_FILE_NAME));
        if candidate.is_absolute() {
            Ok(candidate)
        } else {
            Ok(base_dir.join(candidate))
        }
    }

    /// URL handed to sea-orm; SQLite files are created on first connect.
    pub fn connection_url(&self, base_dir: &Path) -> TsResult<String> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => {
                let path = self.sqlite_path(base_dir)?;
                Ok(format!("sqlite://{}?mode=rwc", path.display()))
            }
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Ok(url.clone()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_dictionaries.unwrap_or(true)
    }

    pub fn atomic_inserts_enabled(&self) -> bool {
        self.atomic_inserts.unwrap_or(false)
    }

    pub(crate) fn failpoint_set(&self) -> HashSet<String> {
        self.failpoints.iter().flatten().cloned().collect()
    }
}
