//! Shared types for Citybox.
//!
//! Persisted account records, the remote outcome taxonomy every
//! operation classifies into, and the domain error enum.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::lenient;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// One entry of `ACCOUNT_INFO`: credential plus mutable runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Bearer token, injected under the `token` header and cookie.
    pub token: String,
    /// Session cookies for endpoints that require session affinity.
    /// A present-but-empty jar is kept as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub state: AccountState,
    /// Keys this tool does not interpret; written back untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AccountRecord {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            cookie: None,
            state: AccountState::default(),
            extra: BTreeMap::new(),
        }
    }
}

/// Per-account fields mutated during a run and written back at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Balance observed by the status check at the start of the run.
    #[serde(default)]
    pub last_modou: i64,
    /// Balance observed at reconciliation.
    #[serde(default)]
    pub current_modou: i64,
    /// `current_modou - last_modou`; negative when the balance dropped.
    #[serde(default)]
    pub difference: i64,
    /// Server-reported date of the last successful check-in.
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_sign: String,
    /// 0 until the server reports today's check-in.
    #[serde(default, deserialize_with = "lenient::int")]
    pub hassign: i64,
    #[serde(default)]
    pub token_expire: bool,
}

impl AccountState {
    /// Whether the server says today's check-in is still open.
    pub fn can_sign(&self) -> bool {
        self.hassign == 0
    }

    /// Record the end-of-run balance and derive the delta.
    pub fn reconcile(&mut self, current_modou: i64) -> i64 {
        self.current_modou = current_modou;
        self.difference = current_modou - self.last_modou;
        self.difference
    }
}

// ---------------------------------------------------------------------------
// Remote outcomes
// ---------------------------------------------------------------------------

/// Classified result of a single remote call.
///
/// Nothing read off the wire may touch account state before it has been
/// collapsed into one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome<T> {
    /// 200 with a body that decoded into `T`.
    Success(T),
    /// 401: the stored token is no longer accepted.
    AuthExpired,
    /// 400: the server refused the action (e.g. no spins left).
    Rejected(String),
    /// Any other status code.
    HttpError(u16),
    /// The request never produced a response.
    TransportException(String),
    /// 200 whose body did not match the expected shape.
    Malformed(String),
}

impl<T> fmt::Display for RemoteOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOutcome::Success(_) => write!(f, "success"),
            RemoteOutcome::AuthExpired => write!(f, "auth expired (401)"),
            RemoteOutcome::Rejected(msg) => write!(f, "rejected (400): {msg}"),
            RemoteOutcome::HttpError(code) => write!(f, "http error {code}"),
            RemoteOutcome::TransportException(msg) => write!(f, "transport error: {msg}"),
            RemoteOutcome::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for Citybox.
#[derive(Debug, thiserror::Error)]
pub enum CityboxError {
    #[error("Configuration file not found: {path}")]
    ConfigMissing { path: String },

    #[error("Invalid configuration ({path}): {message}")]
    ConfigInvalid { path: String, message: String },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
