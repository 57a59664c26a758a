pub mod configuration;
pub mod domain;
pub mod error;
pub mod http;
pub mod messenger;
pub mod postal;
pub mod telemetry;
