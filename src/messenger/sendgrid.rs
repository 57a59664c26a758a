use crate::domain::{split_address, Message};
use crate::error::{ApiErrorBody, DeliveryError};
use crate::http::HttpPool;
use crate::messenger::{ensure_recipients, Messenger};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

const MESSENGER_NAME: &str = "sendgrid";
const DEFAULT_API_BASE: &str = "https://api.sendgrid.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, serde::Deserialize)]
pub struct SendGridConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Disabled entries stay in the configuration but are never built.
    #[serde(default = "crate::messenger::enabled_by_default")]
    pub enabled: bool,
    pub api_key: Secret<String>,
    /// Overrides `https://api.sendgrid.com`.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// SendGrid v3 mail send. Delivers to the first recipient only.
pub struct SendGridMessenger {
    name: String,
    api_base: String,
    api_key: Secret<String>,
    pool: HttpPool,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: EmailAddress<'a>,
    subject: &'a str,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [EmailAddress<'a>; 1],
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a str> for EmailAddress<'a> {
    fn from(address: &'a str) -> Self {
        let (name, email) = split_address(address);
        EmailAddress { email, name }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    mime_type: &'static str,
    value: String,
}

impl SendGridMessenger {
    pub fn new(config: SendGridConfig) -> Result<Self, DeliveryError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(DeliveryError::configuration("sendgrid: API key is required"));
        }
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            name: config.name.unwrap_or_else(|| MESSENGER_NAME.to_string()),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            pool: HttpPool::new(DEFAULT_TIMEOUT)?,
        })
    }
}

/// SendGrid requires `text/plain` to precede `text/html`.
fn contents(message: &Message) -> Vec<Content> {
    let mut content = Vec::with_capacity(2);
    if let Some(text) = message.text_part() {
        content.push(Content {
            mime_type: "text/plain",
            value: text,
        });
    }
    if let Some(html) = message.html_part() {
        content.push(Content {
            mime_type: "text/html",
            value: html,
        });
    }
    content
}

#[async_trait]
impl Messenger for SendGridMessenger {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(name = "Send a message through SendGrid", skip(self, message))]
    async fn push(&self, message: &Message) -> Result<(), DeliveryError> {
        ensure_recipients(MESSENGER_NAME, message)?;

        let request = MailSendRequest {
            personalizations: [Personalization {
                to: [message.to[0].as_str().into()],
            }],
            from: message.from.as_str().into(),
            subject: &message.subject,
            content: contents(message),
        };

        let response = self
            .pool
            .client()
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(DeliveryError::Transport)?;
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body: ApiErrorBody::Raw(body),
            });
        }

        let message_id = response
            .headers()
            .get("X-Message-Id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        tracing::debug!(message_id, "SendGrid accepted the message");
        Ok(())
    }

    async fn flush(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        self.pool.reset()
    }
}
