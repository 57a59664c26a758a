use crate::error::DeliveryError;
use crate::messenger::{
    MailgunConfig, MailgunMessenger, Messenger, PostalMessenger, PostalMessengerConfig,
    SendGridConfig, SendGridMessenger,
};
use config::ConfigError;
use std::sync::Arc;

pub enum Environment {
    Local,
    Production,
}

#[derive(Debug, serde::Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub messengers: Vec<MessengerSettings>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApplicationSettings {
    /// `From` address used for messages the binary sends itself.
    pub sender: String,
    #[serde(default)]
    pub default_messenger: Option<String>,
}

/// One configured provider, selected by its `provider` key.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum MessengerSettings {
    Postal(PostalMessengerConfig),
    Sendgrid(SendGridConfig),
    Mailgun(MailgunConfig),
}

impl MessengerSettings {
    pub fn is_enabled(&self) -> bool {
        match self {
            MessengerSettings::Postal(config) => config.enabled,
            MessengerSettings::Sendgrid(config) => config.enabled,
            MessengerSettings::Mailgun(config) => config.enabled,
        }
    }

    pub fn build(self) -> Result<Arc<dyn Messenger>, DeliveryError> {
        Ok(match self {
            MessengerSettings::Postal(config) => Arc::new(PostalMessenger::new(config)?),
            MessengerSettings::Sendgrid(config) => Arc::new(SendGridMessenger::new(config)?),
            MessengerSettings::Mailgun(config) => Arc::new(MailgunMessenger::new(config)?),
        })
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'local' or 'production'.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let mut settings = config::Config::default();
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(false),
    )?;
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;
    settings.try_into()
}
