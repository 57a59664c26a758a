use crate::domain::Message;
use crate::error::DeliveryError;
use crate::messenger::{ensure_recipients, Messenger};
use crate::postal::{
    Attachment, CorrelationTag, PostalClient, PostalConfig, SendMessageRequest,
    SendMessageResponse,
};
use async_trait::async_trait;
use secrecy::Secret;
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};
use std::collections::BTreeMap;
use std::time::Duration;

const MESSENGER_NAME: &str = "postal";

#[derive(Debug, serde::Deserialize)]
pub struct PostalMessengerConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Disabled entries stay in the configuration but are never built.
    #[serde(default = "crate::messenger::enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub timeout_milliseconds: Option<u64>,
    /// Stamped into correlation tags; `0` leaves the tenant out.
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub tenant_id: u32,
}

pub struct PostalMessenger {
    name: String,
    tenant_id: u32,
    client: PostalClient,
}

impl PostalMessenger {
    pub fn new(config: PostalMessengerConfig) -> Result<Self, DeliveryError> {
        let client = PostalClient::new(PostalConfig {
            base_url: config.base_url,
            api_key: config.api_key,
            timeout: config.timeout_milliseconds.map(Duration::from_millis),
        })?;

        Ok(Self {
            name: config.name.unwrap_or_else(|| MESSENGER_NAME.to_string()),
            tenant_id: config.tenant_id,
            client,
        })
    }

    /// Projects `message` onto Postal's request schema.
    ///
    /// Only the first value of a repeated header survives; Postal accepts a
    /// single value per header name.
    pub fn build_request(&self, message: &Message) -> Result<SendMessageRequest, DeliveryError> {
        ensure_recipients(MESSENGER_NAME, message)?;

        let headers: BTreeMap<String, String> = message
            .headers
            .iter()
            .filter_map(|(name, values)| Some((name.clone(), values.first()?.clone())))
            .collect();

        let attachments: Vec<Attachment> = message
            .attachments
            .iter()
            .map(|attachment| Attachment {
                name: attachment.name.clone(),
                content_type: attachment.content_type.clone(),
                data: base64::encode(&attachment.content),
            })
            .collect();

        Ok(SendMessageRequest {
            to: message.to.clone(),
            from: message.from.clone(),
            subject: message.subject.clone(),
            plain_body: message.text_part(),
            html_body: message.html_part(),
            tag: self.tag_for(message).map(|tag| tag.encode()),
            headers: (!headers.is_empty()).then(|| headers),
            attachments: (!attachments.is_empty()).then(|| attachments),
        })
    }

    fn tag_for(&self, message: &Message) -> Option<CorrelationTag> {
        let (campaign_id, subscriber_id) = message.campaign_context()?;
        Some(CorrelationTag::new(self.tenant_id, campaign_id, subscriber_id))
    }

    /// Sends `message` and returns Postal's receipt, including the message
    /// id it assigned.
    pub async fn send(&self, message: &Message) -> Result<SendMessageResponse, DeliveryError> {
        let request = self.build_request(message)?;
        let response = self.client.send(&request).await?;

        if let Some((campaign_id, subscriber_id)) = message.campaign_context() {
            tracing::info!(
                messenger = %self.name,
                campaign_id,
                subscriber_id,
                message_id = %response.message_id(),
                "Sent campaign message"
            );
        }
        Ok(response)
    }
}

#[async_trait]
impl Messenger for PostalMessenger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push(&self, message: &Message) -> Result<(), DeliveryError> {
        self.send(message).await.map(|_| ())
    }

    async fn flush(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        self.client.close()
    }
}
