//! Run report: what happened to each account this run.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;
use uuid::Uuid;

use crate::api::coupon::Coupon;
use crate::api::lottery::{JoinSummary, LotteryLogSummary};
use crate::api::sign::SignInOutcome;

// ---------------------------------------------------------------------------
// Per-account report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// The full sequence ran.
    Completed,
    /// Stopped after the status check.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountReport {
    pub account: String,
    pub outcome: AccountOutcome,
    pub sign_in: Option<SignInOutcome>,
    /// One entry per spin attempt; `None` when nothing was won.
    pub spins: Vec<Option<String>>,
    pub lottery_log: Option<LotteryLogSummary>,
    pub lottery_join: Option<JoinSummary>,
    pub coupons: Option<Vec<Coupon>>,
    pub difference: i64,
}

impl AccountReport {
    pub fn skipped(account: &str, reason: impl Into<String>) -> Self {
        Self {
            account: account.to_string(),
            outcome: AccountOutcome::Skipped {
                reason: reason.into(),
            },
            sign_in: None,
            spins: Vec::new(),
            lottery_log: None,
            lottery_join: None,
            coupons: None,
            difference: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == AccountOutcome::Completed
    }

    pub fn prizes(&self) -> impl Iterator<Item = &str> {
        self.spins.iter().filter_map(|s| s.as_deref())
    }
}

impl fmt::Display for AccountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AccountOutcome::Skipped { reason } => write!(f, "{}: skipped ({reason})", self.account),
            AccountOutcome::Completed => {
                let sign = match self.sign_in {
                    Some(SignInOutcome::Signed { qmodou }) => format!("+{qmodou}"),
                    Some(SignInOutcome::AlreadySigned) => "already".to_string(),
                    Some(SignInOutcome::Failed) | None => "failed".to_string(),
                };
                write!(
                    f,
                    "{}: sign={} prizes={} joined={} claimed={} difference={:+}",
                    self.account,
                    sign,
                    self.prizes().count(),
                    self.lottery_join.as_ref().map_or(0, |j| j.joined.len()),
                    self.lottery_log.as_ref().map_or(0, |l| l.claimed()),
                    self.difference,
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub accounts: Vec<AccountReport>,
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            accounts: Vec::new(),
        }
    }

    pub fn account(&self, name: &str) -> Option<&AccountReport> {
        self.accounts.iter().find(|a| a.account == name)
    }

    pub fn completed(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_completed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.accounts.len() - self.completed()
    }

    pub fn total_difference(&self) -> i64 {
        self.accounts.iter().map(|a| a.difference).sum()
    }

    /// Emit one line per account and an aggregate line.
    pub fn log(&self) {
        for account in &self.accounts {
            info!(run_id = %self.run_id, "{account}");
        }
        info!(
            run_id = %self.run_id,
            accounts = self.accounts.len(),
            completed = self.completed(),
            skipped = self.skipped(),
            total_difference = self.total_difference(),
            "Run complete"
        );
    }
}
