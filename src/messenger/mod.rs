mod mailgun;
mod postal;
mod registry;
mod sendgrid;

pub use mailgun::{MailgunConfig, MailgunMessenger, MailgunRegion};
pub use postal::{PostalMessenger, PostalMessengerConfig};
pub use registry::MessengerRegistry;
pub use sendgrid::{SendGridConfig, SendGridMessenger};

use crate::domain::Message;
use crate::error::DeliveryError;
use async_trait::async_trait;

/// A provider capable of delivering outbound email.
///
/// Synchronous providers finish the send before `push` returns, so their
/// `flush` has nothing to do; it exists for batching providers.
#[async_trait]
pub trait Messenger: Send + Sync {
    fn name(&self) -> &str;

    async fn push(&self, message: &Message) -> Result<(), DeliveryError>;

    async fn flush(&self) -> Result<(), DeliveryError>;

    async fn close(&self) -> Result<(), DeliveryError>;
}

pub(crate) fn enabled_by_default() -> bool {
    true
}

fn ensure_recipients(provider: &str, message: &Message) -> Result<(), DeliveryError> {
    if message.to.is_empty() {
        return Err(DeliveryError::validation(format!(
            "{}: no recipients",
            provider
        )));
    }
    Ok(())
}
