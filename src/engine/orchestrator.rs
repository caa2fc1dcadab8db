//! Account orchestrator.
//!
//! Drives every configured account through the fixed sequence:
//!
//! ```text
//! Start ──status ok──▶ Checked ──▶ Engaged ──pause──▶ Reconciled ──▶ Done
//!   └──status failed───────────────────────────────────────────────▶ Done
//! ```
//!
//! Engaged runs sign-in, two wheel spins, the lottery log check and the
//! lottery join sweep (plus the coupon listing when enabled). Each step's
//! failure only loses that step's effect. Account state is flushed to
//! disk once, after every account is done.

use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::report::{AccountOutcome, AccountReport, RunReport};
use crate::api::CityboxApi;
use crate::auth::{Credentials, SessionProvider};
use crate::config::Endpoints;
use crate::storage::AccountStore;
use crate::transport::Transport;
use crate::types::CityboxError;

/// Pause between engagement and reconciliation.
const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// The wheel grants two free spins a day; both are always attempted.
const SPINS_PER_RUN: usize = 2;

pub struct Citybox {
    store: AccountStore,
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
    pause: Duration,
}

impl Citybox {
    pub fn new(store: AccountStore, transport: Box<dyn Transport>) -> Self {
        let endpoints = store.config().endpoints();
        Self {
            store,
            transport,
            endpoints,
            pause: DEFAULT_PAUSE,
        }
    }

    /// Override the engagement/reconciliation pause.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Process every account once, in order.
    pub async fn collect_modou(&mut self, run_id: Uuid) -> RunReport {
        let mut report = RunReport::new(run_id);

        for account in self.store.account_names() {
            let account_report = match self.process_account(&account).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(account = %account, error = %e, "Account processing aborted");
                    AccountReport::skipped(&account, e.to_string())
                }
            };
            report.accounts.push(account_report);
        }

        report.finished_at = Some(chrono::Utc::now());
        report
    }

    /// Write every account's state back to the configuration file.
    pub fn persist(&self) -> Result<(), CityboxError> {
        self.store.persist()?;
        info!(path = %self.store.path().display(), "Account info saved");
        Ok(())
    }

    async fn process_account(&mut self, account: &str) -> Result<AccountReport, CityboxError> {
        let (creds, cookie_creds) = {
            let session = SessionProvider::new(&self.store);
            (
                session.credentials(account, false)?,
                session.credentials(account, true)?,
            )
        };
        let api = CityboxApi::new(self.transport.as_ref(), &self.endpoints);

        // Start → Checked
        let checked = {
            let state = self.store.state_mut(account)?;
            api.check_status(account, &creds, state).await
        };
        if !checked {
            let state = self.store.state(account)?;
            let reason = if state.token_expire {
                "token expired"
            } else {
                "status check failed"
            };
            info!(account, reason, "Account skipped this run");
            return Ok(AccountReport::skipped(account, reason));
        }

        // Checked → Engaged
        let mut report = Self::engage(&api, account, &creds, &cookie_creds, &self.store).await?;
        if self.store.config().check_coupon {
            report.coupons = api.check_coupons(account, &creds).await;
        }

        tokio::time::sleep(self.pause).await;

        // Engaged → Reconciled
        let current = api.check_balance(account, &creds).await;
        let state = self.store.state_mut(account)?;
        report.difference = state.reconcile(current);
        info!(
            account,
            modou = state.current_modou,
            difference = state.difference,
            "Modou balance reconciled"
        );

        debug!(account, "Account done");
        Ok(report)
    }

    async fn engage(
        api: &CityboxApi<'_>,
        account: &str,
        creds: &Credentials,
        cookie_creds: &Credentials,
        store: &AccountStore,
    ) -> Result<AccountReport, CityboxError> {
        let sign_in = api.sign_in(account, creds, store.state(account)?).await;

        let mut spins = Vec::with_capacity(SPINS_PER_RUN);
        for _ in 0..SPINS_PER_RUN {
            spins.push(api.roulette(account, cookie_creds).await);
        }

        let lottery_log = api.check_lottery(account, creds).await;
        let lottery_join = api.join_lotteries(account, creds).await;

        Ok(AccountReport {
            account: account.to_string(),
            outcome: AccountOutcome::Completed,
            sign_in: Some(sign_in),
            spins,
            lottery_log,
            lottery_join,
            coupons: None,
            difference: 0,
        })
    }
}
