use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming the source parquet file.
pub const PARQUET_PATH_ENV: &str = "PARQUET_PATH";

/// Environment variable toggling the raw-table view (`1` or `true`).
pub const SHOW_TABLE_ENV: &str = "SHOW_TABLE";

const DEFAULT_PARQUET_PATH: &str = "final_state_daily_bist100.parquet";

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensConfig {
    /// Path of the aggregated daily final-state parquet export.
    pub parquet_path: PathBuf,
    /// Whether the presentation layer shows raw aggregated tables by
    /// default.
    pub show_table: bool,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            parquet_path: PathBuf::from(DEFAULT_PARQUET_PATH),
            show_table: false,
        }
    }
}

impl LensConfig {
    /// Resolves the configuration from the environment, with defaults for
    /// unset variables.
    pub fn from_env() -> Self {
        let parquet_path = env::var(PARQUET_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PARQUET_PATH));

        let show_table = env::var(SHOW_TABLE_ENV)
            .map(|value| matches!(value.as_str(), "1" | "true"))
            .unwrap_or(false);

        let config = Self {
            parquet_path,
            show_table,
        };
        debug!(?config, "Resolved configuration from environment");
        config
    }
}
