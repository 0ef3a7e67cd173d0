use chrono::Utc;
use fulfillment_engine::{
    dispatch_objects::{DeliveryInput, DeliveryResult},
    DeliveryApi,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

use crate::{config::RetryConfig, integrations::messaging::ProviderClients};

/// Starts the message retry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `config.interval`, messages that are still queued or have failed, and that nobody has touched for
/// `config.deadline`, are sent again.
pub fn start_retry_worker(api: DeliveryApi<SqliteDatabase, ProviderClients>, config: RetryConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.interval);
        // The first tick completes immediately. Skip it so that a restart doesn't resend straight away.
        timer.tick().await;
        info!("🕰️ Message retry worker started. Running every {:?}", config.interval);
        loop {
            timer.tick().await;
            debug!("🕰️ Running message retry job");
            let older_than = Utc::now() - config.deadline;
            let scan = DeliveryInput::RetryScan { older_than, max_attempts: config.max_attempts };
            match api.process(scan).await {
                Ok(DeliveryResult::Retried(report)) if report.considered == 0 => {
                    debug!("🕰️ No messages need retrying");
                },
                Ok(DeliveryResult::Retried(report)) => {
                    info!(
                        "🕰️ Retried {} messages. {} sent, {} failed again, {} skipped",
                        report.considered, report.sent, report.failed, report.skipped
                    );
                },
                Ok(other) => {
                    warn!("🕰️ Unexpected result from the retry job: {other:?}");
                },
                Err(e) => {
                    error!("🕰️ Error running message retry job: {e}");
                },
            }
        }
    })
}
