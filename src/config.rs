//! Configuration loading.
//!
//! Two layers: `RuntimeSettings` comes from the environment (paths, log
//! format, HTTP timeout) and `AppConfig` is the JSON document holding the
//! shared headers, endpoint URLs and the account map. The JSON document is
//! also the state file: it is read once at startup and rewritten once at
//! the end of the run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{AccountRecord, CityboxError};

const DEFAULT_CONF_FILE: &str = "citybox_conf.json";
const DEFAULT_LOG_FILE: &str = "citybox_log.csv";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Runtime settings (environment)
// ---------------------------------------------------------------------------

/// Process-level settings resolved from environment variables.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub conf_path: PathBuf,
    pub log_file: PathBuf,
    pub log_json: bool,
    pub http_timeout: Duration,
    /// Fallbacks taken while resolving; logged once a subscriber exists.
    pub notices: Vec<String>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            conf_path: PathBuf::from(DEFAULT_CONF_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_json: false,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            notices: Vec::new(),
        }
    }
}

impl RuntimeSettings {
    /// Resolve settings from `CITYBOX_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut notices = Vec::new();

        let http_timeout = match lookup("CITYBOX_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    notices.push(format!(
                        "Invalid CITYBOX_HTTP_TIMEOUT_SECS {raw:?}, using default {}s",
                        defaults.http_timeout.as_secs()
                    ));
                    defaults.http_timeout
                }
            },
            None => defaults.http_timeout,
        };

        Self {
            conf_path: lookup("CITYBOX_CONF").map(PathBuf::from).unwrap_or(defaults.conf_path),
            log_file: lookup("CITYBOX_LOG_FILE").map(PathBuf::from).unwrap_or(defaults.log_file),
            log_json: lookup("CITYBOX_LOG_JSON").is_some(),
            http_timeout,
            notices,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted configuration document
// ---------------------------------------------------------------------------

/// The `citybox_conf.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Headers sent with every request.
    #[serde(rename = "HEADER")]
    pub header: BTreeMap<String, String>,

    #[serde(rename = "GET_USER_INFO_URL")]
    pub user_info_url: String,
    #[serde(rename = "SIGN_URL")]
    pub sign_url: String,
    #[serde(rename = "ROULETTE_URL")]
    pub roulette_url: String,
    #[serde(rename = "LOTTERY_INFO_URL")]
    pub lottery_info_url: String,
    #[serde(rename = "LOTTERY_URL")]
    pub lottery_join_url: String,
    #[serde(rename = "LOTTERY_LOG_URL")]
    pub lottery_log_url: String,
    #[serde(rename = "LOTTERY_RECEIVE_URL")]
    pub lottery_receive_url: String,
    #[serde(rename = "COUPON_LIST_URL")]
    pub coupon_list_url: String,

    /// Request signature the coupon endpoint expects in a `sign` header.
    #[serde(rename = "COUPON_SIGN", default, skip_serializing_if = "Option::is_none")]
    pub coupon_sign: Option<String>,
    /// Run the coupon listing as the last engaged step.
    #[serde(rename = "CHECK_COUPON", default)]
    pub check_coupon: bool,

    #[serde(rename = "ACCOUNT_INFO")]
    pub account_info: BTreeMap<String, AccountRecord>,
}

/// Endpoint URLs and request signatures, detached from the account map
/// so operations can run while account state is borrowed mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub user_info: String,
    pub sign: String,
    pub roulette: String,
    pub lottery_info: String,
    pub lottery_join: String,
    pub lottery_log: String,
    pub lottery_receive: String,
    pub coupon_list: String,
    pub coupon_sign: Option<String>,
}

impl AppConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            user_info: self.user_info_url.clone(),
            sign: self.sign_url.clone(),
            roulette: self.roulette_url.clone(),
            lottery_info: self.lottery_info_url.clone(),
            lottery_join: self.lottery_join_url.clone(),
            lottery_log: self.lottery_log_url.clone(),
            lottery_receive: self.lottery_receive_url.clone(),
            coupon_list: self.coupon_list_url.clone(),
            coupon_sign: self.coupon_sign.clone(),
        }
    }

    /// Load and validate the configuration document.
    ///
    /// A missing file is `ConfigMissing`; anything unreadable, unparseable
    /// or incomplete is `ConfigInvalid`. Both abort the run.
    pub fn load(path: &Path) -> Result<Self, CityboxError> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(CityboxError::ConfigMissing { path: display });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| CityboxError::ConfigInvalid {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let config: AppConfig =
            serde_json::from_str(&contents).map_err(|e| CityboxError::ConfigInvalid {
                path: display.clone(),
                message: e.to_string(),
            })?;

        config.validate().map_err(|message| CityboxError::ConfigInvalid {
            path: display,
            message,
        })?;

        Ok(config)
    }

    /// Every account needs a token before any request is issued.
    fn validate(&self) -> Result<(), String> {
        for (name, record) in &self.account_info {
            if record.token.trim().is_empty() {
                return Err(format!("account {name} has no token"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
