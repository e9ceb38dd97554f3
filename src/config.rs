use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_STORE_PATH: &str = "data/aircraft.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BATCH_SIZE: usize = 5_000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 50_000;

pub const ENV_CONFIG: &str = "AIRCRAFTDB_CONFIG";
pub const ENV_PATH: &str = "AIRCRAFTDB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "AIRCRAFTDB_BUSY_TIMEOUT_MS";
pub const ENV_BATCH_SIZE: &str = "AIRCRAFTDB_BATCH_SIZE";

/// SQLite journal mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
        }
    }
}

/// SQLite synchronous mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Normal,
    Full,
}

impl SyncMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            SyncMode::Normal => "NORMAL",
            SyncMode::Full => "FULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// How long a writer waits for the database lock before giving up
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default)]
    pub synchronous: SyncMode,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            synchronous: SyncMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records written per transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Log a progress line every this many records of an authority file
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow!("ingest.batch_size must be at least 1"));
        }
        if self.progress_interval == 0 {
            return Err(anyhow!("ingest.progress_interval must be at least 1"));
        }
        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl AppConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the full configuration: the TOML file (if any), then
    /// environment overrides, then the explicit database path.
    pub fn resolve(config_file: Option<&Path>, database: Option<&Path>) -> Result<Self> {
        let mut config = match config_path(config_file) {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                Self::load(&path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        if let Some(database) = database {
            config.store.path = database.to_path_buf();
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply `AIRCRAFTDB_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var(ENV_PATH)
            && !path.trim().is_empty()
        {
            self.store.path = PathBuf::from(path.trim());
        }
        if let Ok(value) = std::env::var(ENV_BUSY_TIMEOUT_MS) {
            self.store.busy_timeout_ms = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", ENV_BUSY_TIMEOUT_MS, value))?;
        }
        if let Ok(value) = std::env::var(ENV_BATCH_SIZE) {
            self.ingest.batch_size = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", ENV_BATCH_SIZE, value))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.ingest.validate()?;
        if self.store.path.as_os_str().is_empty() {
            return Err(anyhow!("store.path must not be empty"));
        }
        Ok(())
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. explicit `--config` argument
/// 2. `AIRCRAFTDB_CONFIG` env var
/// 3. `./aircraftdb.toml` when it exists
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from("./aircraftdb.toml");
    local.exists().then_some(local)
}
