pub mod config;
pub mod datastore;
mod db;
mod dict_cache;
pub mod migration;
mod provision;
pub mod store;

pub use config::{DatabaseConfig, PoolConfig, TsConfig};
pub use datastore::{config_path, default_sqlite_path, load_or_init_config, open_store};
pub use db::sanitize_series_name;
pub use relts_core::*;
pub use store::{SeriesInfo, TimeSeries, TimeSeriesStore};
