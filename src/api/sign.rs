//! Daily check-in.

use serde::Deserialize;
use tracing::{info, warn};

use super::{lenient, CityboxApi};
use crate::auth::Credentials;
use crate::transport::HttpRequest;
use crate::types::{AccountState, RemoteOutcome};

#[derive(Debug, Deserialize)]
struct SignReward {
    #[serde(deserialize_with = "lenient::int")]
    qmodou: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Check-in accepted; `qmodou` modou granted.
    Signed { qmodou: i64 },
    /// The server already reported today's check-in; nothing was sent.
    AlreadySigned,
    Failed,
}

impl<'a> CityboxApi<'a> {
    /// Check in, unless the status check said it already happened today.
    pub async fn sign_in(
        &self,
        account: &str,
        creds: &Credentials,
        state: &AccountState,
    ) -> SignInOutcome {
        if !state.can_sign() {
            warn!(account, last_sign = %state.last_sign, "Already signed in today");
            return SignInOutcome::AlreadySigned;
        }

        let request = HttpRequest::get(&self.endpoints.sign).headers(creds.headers.clone());

        match self.execute::<SignReward>(request).await {
            RemoteOutcome::Success(reward) => {
                info!(account, qmodou = reward.qmodou, "Sign in successful");
                SignInOutcome::Signed {
                    qmodou: reward.qmodou,
                }
            }
            other => {
                warn!(account, outcome = %other, "Sign in failed");
                SignInOutcome::Failed
            }
        }
    }
}
