use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use farewatch_types::Price;

/// Placeholder shown in place of an absent price.
const NO_PRICE: &str = "N/A";

/// Identifier the mail provider hands back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryId(pub String);

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound mail transport. One call is one send attempt.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<DeliveryId>;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to notify {to} about {watch_date}: {source}")]
pub struct NotifyError {
    pub to: String,
    pub watch_date: NaiveDate,
    #[source]
    pub source: anyhow::Error,
}

/// A detected change for one watched date.
#[derive(Debug, Clone)]
pub struct PriceChange<'a> {
    pub watch_date: NaiveDate,
    pub previous: Option<&'a Price>,
    pub current: Option<&'a Price>,
    pub raw_text: &'a str,
}

impl PriceChange<'_> {
    pub fn subject(&self) -> String {
        format!("Price change alert for {}", self.watch_date)
    }

    pub fn body(&self) -> String {
        let lines = [
            format!(
                "Price changed detected for {} from {} to {}",
                self.watch_date,
                display_price(self.previous),
                display_price(self.current),
            ),
            String::new(),
            format!("Original message: {}", self.raw_text),
            String::new(),
            "This is an automated message, do not reply.".to_string(),
        ];
        lines.join("\n")
    }
}

fn display_price(price: Option<&Price>) -> &str {
    price.map(Price::as_str).unwrap_or(NO_PRICE)
}

/// Formats price-change messages and hands them to the transport.
/// Never retries; a failed send is returned to the caller.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    pub async fn notify(&self, to: &str, change: &PriceChange<'_>) -> Result<DeliveryId, NotifyError> {
        let delivery = self
            .transport
            .send(to, &change.subject(), &change.body())
            .await
            .map_err(|source| NotifyError {
                to: to.to_string(),
                watch_date: change.watch_date,
                source,
            })?;

        info!(date = %change.watch_date, delivery_id = %delivery, "Price change email sent");
        Ok(delivery)
    }
}
