//! Server configuration
//!
//! All settings come from environment variables with sensible defaults:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/treats/edge | Working directory (database, logs) |
//! | REMOTE_URL | (unset) | Remote order source base URL |
//! | REMOTE_API_KEY | (unset) | Remote order source credential |
//! | SYNC_INTERVAL_SECS | 300 | Seconds between periodic sync runs |
//! | ENVIRONMENT | development | development / staging / production |
//!
//! When REMOTE_URL or REMOTE_API_KEY is missing, the sync worker is
//! disabled and the engine serves local operations only.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// Remote order source base URL; sync disabled when unset
    pub remote_url: Option<String>,
    /// Credential for the remote order source; never hardcoded
    pub remote_api_key: Option<String>,
    /// Interval between periodic sync runs
    pub sync_interval_secs: u64,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/treats/edge".into()),
            remote_url: std::env::var("REMOTE_URL").ok(),
            remote_api_key: std::env::var("REMOTE_API_KEY").ok(),
            sync_interval_secs: std::env::var("SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("treats.db")
    }

    /// Ensure the working directory layout exists
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
