//! Configuration module
//!
//! Runtime configuration comes from the environment; user preferences
//! live in the settings table instead.

use crate::error::{AppError, AppResult};
use log::info;
use std::env;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "AUTOCARE_DB_PATH";
pub const TEST_MODE_ENV: &str = "AUTOCARE_TEST_MODE";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Seeds no sample data and exits once boot completes.
    pub test_mode: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = env::var(DB_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let test_mode = env::var(TEST_MODE_ENV)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self { db_path, test_mode }
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.db_path.display())
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("autocare"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autocare.db")
}

/// Validates the configuration and creates the database directory.
pub fn validate_config(config: &AppConfig) -> AppResult<()> {
    info!("Validating configuration (database at {})", config.db_path.display());

    if config.db_path.as_os_str().is_empty() {
        return Err(AppError::config("Database path is empty"));
    }
    if config.db_path.is_dir() {
        return Err(AppError::config(format!(
            "Database path {} is a directory",
            config.db_path.display()
        )));
    }

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }
    }

    Ok(())
}
