use crate::configuration::MessengerSettings;
use crate::error::DeliveryError;
use crate::messenger::Messenger;
use std::collections::HashMap;
use std::sync::Arc;

/// Configured messengers, looked up by name.
#[derive(Default)]
pub struct MessengerRegistry {
    messengers: HashMap<String, Arc<dyn Messenger>>,
}

impl MessengerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: Vec<MessengerSettings>) -> Result<Self, DeliveryError> {
        let mut registry = Self::new();
        for messenger in settings {
            if !messenger.is_enabled() {
                tracing::debug!(settings = ?messenger, "Skipping disabled messenger");
                continue;
            }
            registry.register(messenger.build()?)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, messenger: Arc<dyn Messenger>) -> Result<(), DeliveryError> {
        let name = messenger.name().to_string();
        if self.messengers.contains_key(&name) {
            return Err(DeliveryError::configuration(format!(
                "a messenger named {} is already registered",
                name
            )));
        }
        tracing::info!(messenger = %name, "Registered messenger");
        self.messengers.insert(name, messenger);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Messenger>> {
        self.messengers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.messengers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.messengers.is_empty()
    }

    /// Closes every messenger, even after a failure, and reports the first
    /// error encountered.
    pub async fn close_all(&self) -> Result<(), DeliveryError> {
        let mut outcome = Ok(());
        for messenger in self.messengers.values() {
            if let Err(e) = messenger.close().await {
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        outcome
    }
}
