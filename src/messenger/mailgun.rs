use crate::domain::Message;
use crate::error::{ApiErrorBody, DeliveryError};
use crate::http::HttpPool;
use crate::messenger::{ensure_recipients, Messenger};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

const MESSENGER_NAME: &str = "mailgun";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailgunRegion {
    #[default]
    Us,
    Eu,
}

impl MailgunRegion {
    pub fn api_base(&self) -> &'static str {
        match self {
            MailgunRegion::Us => "https://api.mailgun.net",
            MailgunRegion::Eu => "https://api.eu.mailgun.net",
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct MailgunConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Disabled entries stay in the configuration but are never built.
    #[serde(default = "crate::messenger::enabled_by_default")]
    pub enabled: bool,
    pub api_key: Secret<String>,
    pub domain: String,
    #[serde(default)]
    pub region: MailgunRegion,
    /// Takes precedence over `region`.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Mailgun v3 messages API. Delivers to the first recipient only.
pub struct MailgunMessenger {
    name: String,
    endpoint: String,
    api_key: Secret<String>,
    pool: HttpPool,
}

#[derive(Debug, Serialize)]
struct MessageForm<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
}

impl MailgunMessenger {
    pub fn new(config: MailgunConfig) -> Result<Self, DeliveryError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(DeliveryError::configuration("mailgun: API key is required"));
        }
        if config.domain.is_empty() {
            return Err(DeliveryError::configuration("mailgun: domain is required"));
        }

        let api_base = config
            .api_base
            .unwrap_or_else(|| config.region.api_base().to_string());
        Ok(Self {
            name: config.name.unwrap_or_else(|| MESSENGER_NAME.to_string()),
            endpoint: format!(
                "{}/v3/{}/messages",
                api_base.trim_end_matches('/'),
                config.domain
            ),
            api_key: config.api_key,
            pool: HttpPool::new(DEFAULT_TIMEOUT)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Messenger for MailgunMessenger {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(name = "Send a message through Mailgun", skip(self, message))]
    async fn push(&self, message: &Message) -> Result<(), DeliveryError> {
        ensure_recipients(MESSENGER_NAME, message)?;

        let form = MessageForm {
            from: &message.from,
            to: &message.to[0],
            subject: &message.subject,
            text: message.text_part(),
            html: message.html_part(),
        };

        let response = self
            .pool
            .client()
            .post(&self.endpoint)
            .basic_auth("api", Some(self.api_key.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(DeliveryError::Transport)?;
        if !status.is_success() {
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body: ApiErrorBody::Raw(body),
            });
        }

        tracing::debug!(response = %body, "Mailgun accepted the message");
        Ok(())
    }

    async fn flush(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        self.pool.reset()
    }
}
