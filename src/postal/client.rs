use crate::error::{ApiErrorBody, DeliveryError};
use crate::http::HttpPool;
use crate::postal::{ErrorResponse, SendMessageRequest, SendMessageResponse};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const SEND_MESSAGE_PATH: &str = "/api/v1/send/message";
const API_KEY_HEADER: &str = "X-Server-API-Key";

pub struct PostalConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Defaults to 30 seconds.
    pub timeout: Option<Duration>,
}

/// Client for Postal's HTTP send API.
///
/// Holds no per-call state; share one instance between concurrent senders.
pub struct PostalClient {
    base_url: String,
    api_key: Secret<String>,
    pool: HttpPool,
}

impl PostalClient {
    pub fn new(config: PostalConfig) -> Result<Self, DeliveryError> {
        if config.base_url.is_empty() {
            return Err(DeliveryError::configuration("postal: base URL is required"));
        }
        if !validator::validate_url(config.base_url.as_str()) {
            return Err(DeliveryError::configuration(format!(
                "postal: base URL {} is not a valid URL",
                config.base_url
            )));
        }
        if config.api_key.expose_secret().is_empty() {
            return Err(DeliveryError::configuration("postal: API key is required"));
        }

        let pool = HttpPool::new(config.timeout.unwrap_or(DEFAULT_TIMEOUT))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            pool,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.pool.timeout()
    }

    #[tracing::instrument(
        name = "Send a message through Postal",
        skip(self, request),
        fields(recipients = request.to.len(), tag = ?request.tag)
    )]
    pub async fn send(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, DeliveryError> {
        let response = self
            .pool
            .client()
            .post(format!("{}{}", self.base_url, SEND_MESSAGE_PATH))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(DeliveryError::Transport)?;

        if !status.is_success() {
            let body = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(envelope) => ApiErrorBody::Envelope(envelope),
                Err(_) => ApiErrorBody::Raw(body),
            };
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: SendMessageResponse =
            serde_json::from_str(&body).map_err(DeliveryError::MalformedResponse)?;
        if result.status != "success" {
            return Err(DeliveryError::SendRejected(result.status));
        }

        tracing::debug!(message_id = %result.message_id(), "Postal accepted the message");
        Ok(result)
    }

    /// Drops idle pooled connections. Safe to call repeatedly; the client
    /// stays usable and in-flight sends are not interrupted.
    pub fn close(&self) -> Result<(), DeliveryError> {
        self.pool.reset()
    }
}
