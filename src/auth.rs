//! Session/auth provider.
//!
//! Builds the per-request header set (shared headers plus the account
//! token) and, for endpoints that need session affinity, the cookie jar.
//! Pure lookup: no network, no state changes.

use std::collections::BTreeMap;

use crate::storage::AccountStore;
use crate::types::CityboxError;

/// Header and cookie name the token is injected under.
pub const TOKEN_FIELD: &str = "token";

/// Resolved credentials for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub headers: BTreeMap<String, String>,
    /// Present only when cookies were requested.
    pub cookies: Option<BTreeMap<String, String>>,
}

pub struct SessionProvider<'a> {
    store: &'a AccountStore,
}

impl<'a> SessionProvider<'a> {
    pub fn new(store: &'a AccountStore) -> Self {
        Self { store }
    }

    /// Credentials for `account`. Fails if the account is not configured.
    pub fn credentials(&self, account: &str, need_cookie: bool) -> Result<Credentials, CityboxError> {
        let record = self.store.account(account)?;

        let mut headers = self.store.config().header.clone();
        headers.insert(TOKEN_FIELD.to_string(), record.token.clone());

        let cookies = need_cookie.then(|| {
            let mut jar = record.cookie.clone().unwrap_or_default();
            jar.insert(TOKEN_FIELD.to_string(), record.token.clone());
            jar
        });

        Ok(Credentials { headers, cookies })
    }
}
