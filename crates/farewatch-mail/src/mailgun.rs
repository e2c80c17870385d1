use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use serde::Deserialize;
use tracing::debug;

use farewatch_core::{DeliveryId, MailTransport};

pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net";

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub from: String,
    pub base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mailgun request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mailgun rejected the message ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

pub struct MailgunTransport {
    client: Client,
    config: MailgunConfig,
}

impl MailgunTransport {
    pub fn new(config: MailgunConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.config.domain
        )
    }

    fn build_request(&self, to: &str, subject: &str, text: &str) -> Result<Request, MailError> {
        let form = [
            ("from", self.config.from.as_str()),
            ("to", to),
            ("subject", subject),
            ("text", text),
        ];
        Ok(self
            .client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .build()?)
    }

    async fn deliver(&self, to: &str, subject: &str, text: &str) -> Result<DeliveryId, MailError> {
        let request = self.build_request(to, subject, text)?;
        let response = self.client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }

        let sent: SendResponse = response.json().await?;
        debug!(delivery_id = %sent.id, "Mailgun accepted message");
        Ok(DeliveryId(sent.id))
    }
}

#[async_trait]
impl MailTransport for MailgunTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<DeliveryId> {
        Ok(self.deliver(to, subject, body).await?)
    }
}
