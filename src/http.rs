use crate::error::DeliveryError;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

const MAX_IDLE_PER_HOST: usize = 10;
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// A pooled `reqwest::Client` whose idle connections can be released.
///
/// `reqwest` has no "close idle connections" call, so `reset` swaps in a
/// freshly built client. Requests already running hold their own handle to
/// the old pool and finish undisturbed; its connections close once the last
/// of them completes.
pub struct HttpPool {
    timeout: Duration,
    client: RwLock<reqwest::Client>,
}

impl HttpPool {
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        Ok(Self {
            timeout,
            client: RwLock::new(build_client(timeout)?),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> reqwest::Client {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) -> Result<(), DeliveryError> {
        let fresh = build_client(self.timeout)?;
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(())
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, DeliveryError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .build()
        .map_err(|e| DeliveryError::configuration(format!("failed to build HTTP client: {}", e)))
}
