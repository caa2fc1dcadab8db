//! Drawings: joining open ones and claiming won prizes.
//!
//! The join sweep lists current drawings, keeps those whose name carries
//! a points marker, and joins the ones not yet entered. The log check
//! pulls lost (`up_status=3`) and won (`up_status=2`) entries and claims
//! every won prize that is still undelivered and unexpired.

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{lenient, readable_body, CityboxApi};
use crate::auth::Credentials;
use crate::transport::HttpRequest;
use crate::types::RemoteOutcome;

/// Drawing names containing one of these are worth entering.
pub const POINTS_MARKERS: &[&str] = &["积分", "无门槛"];

/// Body the join endpoint returns on success.
pub const JOIN_SUCCESS: &str = "参与成功";

const UP_STATUS_LOST: u8 = 3;
const UP_STATUS_WON: u8 = 2;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LotteryListing {
    pub name: String,
    #[serde(deserialize_with = "lenient::int")]
    pub is_join: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub lottery_id: String,
}

impl LotteryListing {
    pub fn has_points_marker(&self) -> bool {
        POINTS_MARKERS.iter().any(|m| self.name.contains(m))
    }

    /// Eligible and not yet entered.
    pub fn should_join(&self) -> bool {
        self.has_points_marker() && self.is_join == 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LotteryLogEntry {
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub log_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub lottery_status: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub delivery_status: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub expire_state: i64,
}

impl LotteryLogEntry {
    /// Won, not yet delivered, not expired.
    pub fn is_claimable(&self) -> bool {
        self.lottery_status == 2 && self.delivery_status == 1 && self.expire_state == 1
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSummary {
    /// Listings carrying a points marker.
    pub eligible: usize,
    pub already_joined: usize,
    pub joined: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    pub log_id: String,
    pub name: String,
    pub claimed: bool,
    /// Server reply to the claim, when there was one.
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotteryLogSummary {
    /// Won plus lost.
    pub total: usize,
    pub won: usize,
    pub unclaimed: Vec<ClaimRecord>,
}

impl LotteryLogSummary {
    pub fn claimed(&self) -> usize {
        self.unclaimed.iter().filter(|c| c.claimed).count()
    }

    /// Multi-line summary for the log.
    pub fn describe(&self, account: &str) -> String {
        let mut out = format!(
            "Citybox Account {account}:\n    Lottery Amount: {}\n    Win Amount: {}\n",
            self.total, self.won
        );
        if !self.unclaimed.is_empty() {
            out.push_str(&format!("    No Receive Amount: {}\n", self.unclaimed.len()));
            for c in &self.unclaimed {
                out.push_str(&format!("        {} {} {}\n", c.name, c.log_id, c.detail));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl<'a> CityboxApi<'a> {
    /// List drawings and join every eligible one not yet entered.
    ///
    /// Returns `None` if the listing itself failed. A failed join is
    /// logged and the sweep moves on to the next drawing.
    pub async fn join_lotteries(&self, account: &str, creds: &Credentials) -> Option<JoinSummary> {
        let request =
            HttpRequest::post(&self.endpoints.lottery_info).headers(creds.headers.clone());

        let listings = match self.execute::<Vec<LotteryListing>>(request).await {
            RemoteOutcome::Success(listings) => listings,
            other => {
                warn!(account, outcome = %other, "Lottery info request failed");
                return None;
            }
        };

        let mut summary = JoinSummary::default();

        for listing in listings.iter().filter(|l| l.has_points_marker()) {
            summary.eligible += 1;
            if !listing.should_join() {
                summary.already_joined += 1;
                continue;
            }

            let request = HttpRequest::post(&self.endpoints.lottery_join)
                .headers(creds.headers.clone())
                .form("lottery_id", &listing.lottery_id);

            match self.execute::<serde_json::Value>(request).await {
                RemoteOutcome::Success(serde_json::Value::String(msg)) if msg == JOIN_SUCCESS => {
                    info!(account, lottery = %listing.name, "Joined lottery");
                    summary.joined.push(listing.name.clone());
                }
                RemoteOutcome::Success(body) => {
                    warn!(account, lottery = %listing.name, response = %body, "Join lottery refused");
                    summary.failed.push(listing.name.clone());
                }
                other => {
                    warn!(account, lottery = %listing.name, outcome = %other, "Join lottery request failed");
                    summary.failed.push(listing.name.clone());
                }
            }
        }

        debug!(
            account,
            eligible = summary.eligible,
            joined = summary.joined.len(),
            failed = summary.failed.len(),
            "Lottery sweep done"
        );
        Some(summary)
    }

    /// Count drawings and claim undelivered prizes.
    ///
    /// Returns `None` if either log query failed.
    pub async fn check_lottery(
        &self,
        account: &str,
        creds: &Credentials,
    ) -> Option<LotteryLogSummary> {
        let lost_request = HttpRequest::post(&self.endpoints.lottery_log)
            .headers(creds.headers.clone())
            .form("up_status", UP_STATUS_LOST);

        let lost = match self.execute::<Vec<serde_json::Value>>(lost_request).await {
            RemoteOutcome::Success(entries) => entries.len(),
            other => {
                warn!(account, outcome = %other, "Lottery log request failed");
                return None;
            }
        };

        let won_request = HttpRequest::post(&self.endpoints.lottery_log)
            .headers(creds.headers.clone())
            .form("up_status", UP_STATUS_WON);

        let won = match self.execute::<Vec<LotteryLogEntry>>(won_request).await {
            RemoteOutcome::Success(entries) => entries,
            other => {
                warn!(account, outcome = %other, "Lottery log request failed");
                return None;
            }
        };

        let mut summary = LotteryLogSummary {
            total: lost + won.len(),
            won: won.len(),
            unclaimed: Vec::new(),
        };

        for entry in won.iter().filter(|e| e.is_claimable()) {
            summary.unclaimed.push(self.claim_prize(account, creds, entry).await);
        }

        info!(
            account,
            total = summary.total,
            won = summary.won,
            unclaimed = summary.unclaimed.len(),
            claimed = summary.claimed(),
            "Lottery log checked"
        );
        if summary.unclaimed.is_empty() {
            debug!("{}", summary.describe(account));
        } else {
            info!("{}", summary.describe(account));
        }

        Some(summary)
    }

    async fn claim_prize(
        &self,
        account: &str,
        creds: &Credentials,
        entry: &LotteryLogEntry,
    ) -> ClaimRecord {
        let request = HttpRequest::get(&self.endpoints.lottery_receive)
            .headers(creds.headers.clone())
            .query("log_id", &entry.log_id);

        let mut record = ClaimRecord {
            log_id: entry.log_id.clone(),
            name: entry.name.clone(),
            claimed: false,
            detail: String::new(),
        };

        match self.execute_raw(request).await {
            RemoteOutcome::Success(body) => {
                info!(account, lottery = %entry.name, "Received lottery prize");
                record.claimed = true;
                record.detail = readable_body(&body);
            }
            other => {
                warn!(account, lottery = %entry.name, log_id = %entry.log_id, outcome = %other, "Lottery receive failed");
            }
        }
        record
    }
}
