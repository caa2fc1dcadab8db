//! Citybox — daily modou collection
//!
//! Entry point. Resolves runtime settings, initialises logging, loads the
//! account configuration, runs every account once and writes the updated
//! account state back. Schedule it externally (cron, systemd timer).

use anyhow::Result;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use citybox::config::RuntimeSettings;
use citybox::engine::Citybox;
use citybox::logging;
use citybox::storage::AccountStore;
use citybox::transport::http::HttpTransport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let settings = RuntimeSettings::from_env();
    let _log_guard = logging::init(&settings);

    let run_id = Uuid::new_v4();
    run(settings, run_id)
        .instrument(tracing::info_span!("run", %run_id))
        .await
}

async fn run(settings: RuntimeSettings, run_id: Uuid) -> Result<()> {
    info!(conf = %settings.conf_path.display(), "Start citybox job");

    // A missing or invalid configuration is the only fatal precondition.
    let store = match AccountStore::load(&settings.conf_path) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Citybox configuration unavailable, nothing processed");
            return Err(e.into());
        }
    };

    let transport = HttpTransport::new(settings.http_timeout)?;
    let mut citybox = Citybox::new(store, Box::new(transport));

    let report = citybox.collect_modou(run_id).await;
    report.log();

    citybox.persist()?;

    info!("End citybox job");
    Ok(())
}
