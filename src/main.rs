use anyhow::{anyhow, bail, Context};
use mailgate::configuration::get_configuration;
use mailgate::domain::{ContentType, Message};
use mailgate::messenger::MessengerRegistry;
use mailgate::telemetry::{get_subscriber, init_subscriber};

/// Sends a smoke-test message: `mailgate <recipient> [messenger]`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("mailgate".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let mut args = std::env::args().skip(1);
    let recipient = args
        .next()
        .context("Usage: mailgate <recipient> [messenger]")?;

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let messenger_name = args
        .next()
        .or(configuration.application.default_messenger)
        .context("No messenger given and no default_messenger configured.")?;

    let registry = MessengerRegistry::from_settings(configuration.messengers)
        .context("Failed to set up messengers.")?;
    if registry.is_empty() {
        bail!("No messengers are configured and enabled.");
    }
    let messenger = registry.get(&messenger_name).ok_or_else(|| {
        anyhow!(
            "Unknown messenger {}. Configured: {}",
            messenger_name,
            registry.names().join(", ")
        )
    })?;

    let message = Message {
        to: vec![recipient.clone()],
        from: configuration.application.sender,
        subject: "Mailgate test message".into(),
        body: b"This is a test message sent by mailgate.".to_vec(),
        content_type: ContentType::Plain,
        ..Default::default()
    };

    let outcome = messenger
        .push(&message)
        .await
        .with_context(|| format!("Failed to send a test message to {}", recipient));
    messenger.flush().await?;
    registry.close_all().await?;
    outcome?;

    tracing::info!(messenger = %messenger_name, %recipient, "Test message sent");
    Ok(())
}
