use crate::postal::ErrorResponse;
use std::fmt;

#[derive(thiserror::Error)]
pub enum DeliveryError {
    /// A required setting was missing or malformed when building a client.
    #[error("{0}")]
    Configuration(String),
    /// The caller's message failed a precondition; nothing was sent.
    #[error("{0}")]
    Validation(String),
    #[error("request to the delivery service failed")]
    Transport(#[source] reqwest::Error),
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: ApiErrorBody },
    /// The provider answered 2xx but reported a logical failure.
    #[error("send failed with status: {0}")]
    SendRejected(String),
    #[error("failed to decode the delivery service response")]
    MalformedResponse(#[source] serde_json::Error),
}

impl DeliveryError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True when the underlying transport gave up waiting for the provider.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Debug for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Body of a non-2xx reply: the provider's error envelope when it decodes,
/// otherwise the raw text exactly as received.
#[derive(Debug)]
pub enum ApiErrorBody {
    Envelope(ErrorResponse),
    Raw(String),
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorBody::Envelope(envelope) => {
                write!(f, "{}", serde_json::Value::Object(envelope.data.clone()))
            }
            ApiErrorBody::Raw(text) => f.write_str(text),
        }
    }
}

pub fn error_chain_fmt(e: &impl std::error::Error, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
