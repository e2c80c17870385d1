use async_trait::async_trait;
use uuid::Uuid;

use farewatch_core::{DeliveryId, MailTransport};

/// Transport that only logs. Used when no mail provider is configured.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<DeliveryId> {
        let id = format!("dry-run-{}", Uuid::new_v4());
        tracing::info!(to, subject, delivery_id = %id, "Dry run, email not sent");
        tracing::debug!("{}", body);
        Ok(DeliveryId(id))
    }
}
