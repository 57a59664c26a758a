use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Body of `POST /api/v1/send/message`.
///
/// Postal treats an absent field differently from an empty one, so every
/// optional field is an `Option` and `None` is left out of the JSON entirely.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    /// Base64 encoded content.
    pub data: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SendMessageResponse {
    pub status: String,
    pub time: f64,
    pub flags: HashMap<String, bool>,
    pub data: SendMessageResponseData,
    pub messages: Vec<RecipientResult>,
}

impl SendMessageResponse {
    pub fn message_id(&self) -> &str {
        &self.data.message_id
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SendMessageResponseData {
    pub message_id: String,
    /// Keyed by recipient address.
    pub messages: HashMap<String, MessageDetails>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MessageDetails {
    pub id: i64,
    pub token: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RecipientResult {
    pub id: i64,
    pub token: String,
    pub status: String,
}

/// `{status, time, data}` envelope Postal returns alongside a non-2xx status.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub status: String,
    pub time: f64,
    pub data: serde_json::Map<String, serde_json::Value>,
}
