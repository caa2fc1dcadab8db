//! Reward wheel spin.

use serde::Deserialize;
use tracing::{info, warn};

use super::CityboxApi;
use crate::auth::Credentials;
use crate::transport::HttpRequest;
use crate::types::RemoteOutcome;

#[derive(Debug, Deserialize)]
struct SpinResult {
    winning_desc: String,
}

impl<'a> CityboxApi<'a> {
    /// Spin the wheel once. Returns the prize description on a win.
    ///
    /// A 400 means no spins are left and is only a warning.
    pub async fn roulette(&self, account: &str, creds: &Credentials) -> Option<String> {
        let request = HttpRequest::post(&self.endpoints.roulette)
            .headers(creds.headers.clone())
            .cookies(creds.cookies.clone().unwrap_or_default());

        match self.execute::<SpinResult>(request).await {
            RemoteOutcome::Success(spin) => {
                info!(account, prize = %spin.winning_desc, "Roulette prize");
                Some(spin.winning_desc)
            }
            RemoteOutcome::Rejected(message) => {
                warn!(account, message = %message, "Roulette rejected");
                None
            }
            other => {
                warn!(account, outcome = %other, "Roulette request failed");
                None
            }
        }
    }
}
