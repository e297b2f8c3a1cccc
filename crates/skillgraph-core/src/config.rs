//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to the engine's data directories. The two stores live in
/// separate directories so they fail (and can be wiped) independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Primary document store directory (`data/primary/`).
    pub primary: PathBuf,
    /// Graph index directory (`data/graph/`).
    pub graph: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            primary: root.join("primary"),
            graph: root.join("graph"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.primary)?;
        std::fs::create_dir_all(&self.graph)?;
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Default recommendation list length.
    pub recommend_limit: usize,
    /// Attempts before a sync event is moved to the dead-letter state.
    pub max_sync_attempts: u32,
    /// Outbox rows processed per drain pass.
    pub drain_batch: usize,
    /// Interval for the optional background drain loop, in seconds.
    pub drain_interval_secs: u64,
    /// SQLite busy timeout on graph sessions, in milliseconds. Bounds how
    /// long a hung graph call can stall a hook.
    pub graph_busy_timeout_ms: u64,
}

impl EngineConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            data_paths,
            recommend_limit: env_or("SKILLGRAPH_RECOMMEND_LIMIT", 16),
            max_sync_attempts: env_or("SKILLGRAPH_MAX_SYNC_ATTEMPTS", 5),
            drain_batch: env_or("SKILLGRAPH_DRAIN_BATCH", 32),
            drain_interval_secs: env_or("SKILLGRAPH_DRAIN_INTERVAL_SECS", 10),
            graph_busy_timeout_ms: env_or("SKILLGRAPH_GRAPH_BUSY_TIMEOUT_MS", 2000),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
