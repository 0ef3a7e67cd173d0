use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Channel, MessageStatus},
    events::{EventProducers, MessageStatusChangedEvent},
    fe_api::{
        dispatch_api::DispatchApi,
        dispatch_objects::{DeliveryInput, DeliveryResult, ProviderError, ReconcileOutcome},
        errors::ReconcileError,
    },
    traits::{FulfillmentDatabase, MessagingProviders, StatusUpdate},
};

const MAX_CAS_ATTEMPTS: usize = 3;

/// `DeliveryApi` applies the asynchronous delivery reports from the messaging providers to the locally queued
/// messages.
///
/// Statuses only ever move forward along the channel's delivery order. A report that would move a message backwards
/// (a late `sent` after `delivered`, say) is accepted and dropped.
pub struct DeliveryApi<B, M> {
    db: B,
    retrier: DispatchApi<B, M>,
    producers: EventProducers,
}

impl<B, M> Debug for DeliveryApi<B, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeliveryApi")
    }
}

impl<B, M> DeliveryApi<B, M> {
    pub fn new(db: B, retrier: DispatchApi<B, M>, producers: EventProducers) -> Self {
        Self { db, retrier, producers }
    }
}

impl<B, M> DeliveryApi<B, M>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    /// Single entry point for everything that moves a message after it was queued: provider callbacks and retry scans.
    pub async fn process(&self, input: DeliveryInput) -> Result<DeliveryResult, ReconcileError> {
        match input {
            DeliveryInput::StatusCallback(callback) => {
                let outcome = self
                    .reconcile_on_channel(
                        Some(callback.channel),
                        &callback.provider_message_id,
                        &callback.status,
                        callback.error,
                    )
                    .await?;
                Ok(DeliveryResult::Reconciled(outcome))
            },
            DeliveryInput::RetryScan { older_than, max_attempts } => {
                let report = self
                    .retrier
                    .retry_stale(older_than, max_attempts)
                    .await
                    .map_err(|e| ReconcileError::DatabaseError(e.to_string()))?;
                Ok(DeliveryResult::Retried(report))
            },
        }
    }

    /// Applies `status` to the message the provider knows as `provider_message_id`.
    ///
    /// The status is parsed against the message's own channel. Unknown ids are acknowledged with
    /// [`ReconcileOutcome::NotFound`], since providers can report on messages this system never stored.
    pub async fn reconcile(
        &self,
        provider_message_id: &str,
        status: &str,
        error: Option<ProviderError>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        self.reconcile_on_channel(None, provider_message_id, status, error).await
    }

    async fn reconcile_on_channel(
        &self,
        channel: Option<Channel>,
        provider_message_id: &str,
        status: &str,
        error: Option<ProviderError>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(message) = self.db.fetch_message_by_provider_id(provider_message_id).await? else {
                info!("📬️ No message has provider id {provider_message_id}. Ignoring the '{status}' report.");
                return Ok(ReconcileOutcome::NotFound);
            };
            if let Some(channel) = channel {
                if channel != message.channel() {
                    warn!(
                        "📬️ A {channel} report arrived for provider id {provider_message_id}, which belongs to a {} \
                         message. Ignoring it.",
                        message.channel()
                    );
                    return Ok(ReconcileOutcome::NotFound);
                }
            }
            let new_status = MessageStatus::parse(message.channel(), status)?;
            if !new_status.advances_from(&message.status) {
                debug!(
                    "📬️ Message #{} is already {}. Dropping the '{new_status}' report.",
                    message.id, message.status
                );
                return Ok(ReconcileOutcome::Ignored { current: message.status });
            }
            let now = Utc::now();
            let mut update = StatusUpdate {
                status: new_status,
                sent_at: message.sent_at,
                delivered_at: message.delivered_at,
                read_at: message.read_at,
                error_code: message.error_code.clone(),
                error_message: message.error_message.clone(),
                updated_at: now,
            };
            if new_status.is_sent() || new_status.is_delivered() {
                update.sent_at.get_or_insert(now);
            }
            if new_status.is_delivered() {
                update.delivered_at.get_or_insert(now);
            }
            if new_status.is_read() {
                update.read_at.get_or_insert(now);
            }
            if new_status.is_failure() {
                let ProviderError { code, message: detail } = error.clone().unwrap_or_default();
                update.error_code = code;
                let detail = detail.unwrap_or_else(|| format!("Provider reported {}", new_status.as_str()));
                update.error_message = Some(detail);
            }
            let previous = message.status;
            match self.db.compare_and_set_status(message.id, previous, update).await? {
                Some(updated) => {
                    info!("📬️ Message #{} moved from {previous} to {new_status}", updated.id);
                    let event = MessageStatusChangedEvent::new(updated.clone(), previous);
                    self.producers.publish_message_status_changed(event).await;
                    return Ok(ReconcileOutcome::Applied { message: updated });
                },
                None => {
                    debug!("📬️ Message #{} changed while reconciling. Re-reading it.", message.id);
                },
            }
        }
        warn!("📬️ Gave up reconciling provider id {provider_message_id} after {MAX_CAS_ATTEMPTS} attempts");
        let id = self.db.fetch_message_by_provider_id(provider_message_id).await?.map(|m| m.id).unwrap_or_default();
        Err(ReconcileError::Contention(id))
    }
}
