//! Account state store.
//!
//! Owns the loaded configuration document for the duration of the run.
//! Operations mutate account state in memory; `persist` writes the whole
//! document back to the file it came from, once, at the end of the run.
//! A crash mid-run loses everything since load.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::types::{AccountRecord, AccountState, CityboxError};

pub struct AccountStore {
    config: AppConfig,
    path: PathBuf,
}

impl AccountStore {
    /// Load the configuration document at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CityboxError> {
        let path = path.into();
        let config = AppConfig::load(&path)?;

        info!(
            path = %path.display(),
            accounts = config.account_info.len(),
            "Configuration loaded"
        );

        Ok(Self { config, path })
    }

    /// Wrap an already-built configuration; `persist` writes to `path`.
    pub fn from_config(config: AppConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            path: path.into(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Account identifiers in processing order.
    pub fn account_names(&self) -> Vec<String> {
        self.config.account_info.keys().cloned().collect()
    }

    pub fn account(&self, name: &str) -> Result<&AccountRecord, CityboxError> {
        self.config
            .account_info
            .get(name)
            .ok_or_else(|| CityboxError::UnknownAccount(name.to_string()))
    }

    pub fn state(&self, name: &str) -> Result<&AccountState, CityboxError> {
        self.account(name).map(|record| &record.state)
    }

    pub fn state_mut(&mut self, name: &str) -> Result<&mut AccountState, CityboxError> {
        self.config
            .account_info
            .get_mut(name)
            .map(|record| &mut record.state)
            .ok_or_else(|| CityboxError::UnknownAccount(name.to_string()))
    }

    /// Rewrite the full document, same shape, pretty-printed.
    pub fn persist(&self) -> Result<(), CityboxError> {
        let json = serde_json::to_string_pretty(&self.config)
            .map_err(|e| CityboxError::Storage(format!("Failed to serialise configuration: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| {
            CityboxError::Storage(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        debug!(
            path = %self.path.display(),
            accounts = self.config.account_info.len(),
            "Account state saved"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
