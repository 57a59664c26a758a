mod client;
mod tag;
mod types;
pub mod webhook;

pub use client::{PostalClient, PostalConfig};
pub use tag::CorrelationTag;
pub use types::*;
