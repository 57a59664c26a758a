//! Delivery events Postal posts back to us.
//!
//! Decoding is structural only. Postal owns these schemas, so unknown fields
//! are ignored and missing ones fall back to their defaults. Authenticating
//! the callback is the HTTP endpoint's job, not this module's.

use crate::postal::CorrelationTag;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEventKind {
    MessageSent,
    MessageDeliveryFailed,
    MessageBounced,
    MessageLinkClicked,
}

impl WebhookEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventKind::MessageSent => "MessageSent",
            WebhookEventKind::MessageDeliveryFailed => "MessageDeliveryFailed",
            WebhookEventKind::MessageBounced => "MessageBounced",
            WebhookEventKind::MessageLinkClicked => "MessageLinkClicked",
        }
    }

    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "MessageSent" => Some(Self::MessageSent),
            "MessageDeliveryFailed" => Some(Self::MessageDeliveryFailed),
            "MessageBounced" => Some(Self::MessageBounced),
            "MessageLinkClicked" => Some(Self::MessageLinkClicked),
            _ => None,
        }
    }
}

/// The outer `{event, timestamp, payload, uuid}` object of every callback.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookEnvelope {
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: f64,
    pub payload: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
}

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub timestamp: f64,
    pub payload: WebhookPayload,
    pub envelope_id: String,
}

#[derive(Debug, Clone)]
pub enum WebhookPayload {
    Sent(MessageSentPayload),
    DeliveryFailed(MessageDeliveryFailedPayload),
    Bounced(MessageBouncedPayload),
    LinkClicked(MessageLinkClickedPayload),
    /// Any event we do not model, kept as received.
    Unrecognized {
        event: String,
        payload: serde_json::Value,
    },
}

impl WebhookEvent {
    /// Fails only when `body` is not a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: WebhookEnvelope = serde_json::from_slice(body)?;
        Ok(envelope.into())
    }

    pub fn kind(&self) -> Option<WebhookEventKind> {
        match &self.payload {
            WebhookPayload::Sent(_) => Some(WebhookEventKind::MessageSent),
            WebhookPayload::DeliveryFailed(_) => Some(WebhookEventKind::MessageDeliveryFailed),
            WebhookPayload::Bounced(_) => Some(WebhookEventKind::MessageBounced),
            WebhookPayload::LinkClicked(_) => Some(WebhookEventKind::MessageLinkClicked),
            WebhookPayload::Unrecognized { .. } => None,
        }
    }

    /// The message the event is about. Bounces refer to the original
    /// outbound message rather than the bounce itself.
    pub fn message(&self) -> Option<&WebhookMessage> {
        match &self.payload {
            WebhookPayload::Sent(p) => Some(&p.message),
            WebhookPayload::DeliveryFailed(p) => Some(&p.message),
            WebhookPayload::Bounced(p) => Some(&p.original_message),
            WebhookPayload::LinkClicked(p) => Some(&p.message),
            WebhookPayload::Unrecognized { .. } => None,
        }
    }

    /// Invalid when the event is unrecognised or carries no usable tag.
    pub fn correlation_tag(&self) -> CorrelationTag {
        self.message()
            .map(WebhookMessage::correlation_tag)
            .unwrap_or_default()
    }
}

impl From<WebhookEnvelope> for WebhookEvent {
    fn from(envelope: WebhookEnvelope) -> Self {
        let WebhookEnvelope {
            event,
            timestamp,
            payload,
            uuid,
        } = envelope;

        let payload = match WebhookEventKind::parse(&event) {
            Some(WebhookEventKind::MessageSent) => WebhookPayload::Sent(lenient(payload, &event)),
            Some(WebhookEventKind::MessageDeliveryFailed) => {
                WebhookPayload::DeliveryFailed(lenient(payload, &event))
            }
            Some(WebhookEventKind::MessageBounced) => {
                WebhookPayload::Bounced(lenient(payload, &event))
            }
            Some(WebhookEventKind::MessageLinkClicked) => {
                WebhookPayload::LinkClicked(lenient(payload, &event))
            }
            None => WebhookPayload::Unrecognized { event, payload },
        };

        WebhookEvent {
            timestamp,
            payload,
            envelope_id: uuid,
        }
    }
}

fn lenient<T: DeserializeOwned + Default>(payload: serde_json::Value, event: &str) -> T {
    serde_json::from_value(payload).unwrap_or_else(|e| {
        tracing::debug!(event, error = %e, "Webhook payload did not match its schema");
        T::default()
    })
}

/// Postal sends `null` for fields it has no value for; treat those like
/// missing keys.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub direction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub spam_status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag: String,
}

impl WebhookMessage {
    /// Whole seconds only; the fractional part of the timestamp is dropped.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp as i64, 0).single()
    }

    pub fn correlation_tag(&self) -> CorrelationTag {
        CorrelationTag::decode(&self.tag)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MessageSentPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub message: WebhookMessage,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub details: String,
    #[serde(deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sent_with_ssl: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: f64,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MessageDeliveryFailedPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub message: WebhookMessage,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub details: String,
    #[serde(deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: f64,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MessageBouncedPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub original_message: WebhookMessage,
    #[serde(deserialize_with = "null_as_default")]
    pub bounce: BounceDetails,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BounceDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bounce_message_id: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MessageLinkClickedPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub message: WebhookMessage,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_agent: String,
}
