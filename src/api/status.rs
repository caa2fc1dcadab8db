//! Session status and balance queries (`GET_USER_INFO_URL`).

use serde::Deserialize;
use tracing::{debug, warn};

use super::{lenient, CityboxApi};
use crate::auth::Credentials;
use crate::transport::HttpRequest;
use crate::types::{AccountState, RemoteOutcome};

/// Fields of the user-info payload the run consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(deserialize_with = "lenient::int")]
    pub modou: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_update: String,
    #[serde(deserialize_with = "lenient::int")]
    pub hassign: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct Balance {
    #[serde(deserialize_with = "lenient::int")]
    modou: i64,
}

impl<'a> CityboxApi<'a> {
    /// Validate the session and snapshot the start-of-run state.
    ///
    /// On success records `last_modou`, `last_sign` and `hassign` and
    /// clears `token_expire`. A 401 sets `token_expire`. Returns whether
    /// the account may proceed.
    pub async fn check_status(
        &self,
        account: &str,
        creds: &Credentials,
        state: &mut AccountState,
    ) -> bool {
        let request = HttpRequest::get(&self.endpoints.user_info).headers(creds.headers.clone());

        match self.execute::<UserInfo>(request).await {
            RemoteOutcome::Success(info) => {
                state.last_modou = info.modou;
                state.last_sign = info.last_update;
                state.hassign = info.hassign;
                state.token_expire = false;
                debug!(
                    account,
                    modou = state.last_modou,
                    hassign = state.hassign,
                    last_sign = %state.last_sign,
                    "Status checked"
                );
                true
            }
            RemoteOutcome::AuthExpired => {
                warn!(account, "Status check returned 401, token may be expired");
                state.token_expire = true;
                false
            }
            other => {
                warn!(account, outcome = %other, "Status check failed");
                false
            }
        }
    }

    /// Current balance, or 0 if it could not be read. Read-only.
    pub async fn check_balance(&self, account: &str, creds: &Credentials) -> i64 {
        let request = HttpRequest::get(&self.endpoints.user_info).headers(creds.headers.clone());

        match self.execute::<Balance>(request).await {
            RemoteOutcome::Success(balance) => balance.modou,
            other => {
                warn!(account, outcome = %other, "Balance check failed");
                0
            }
        }
    }
}
