use time::format_description::well_known::Rfc3339;

pub mod data;
pub mod extraction;
pub mod languages;
pub mod logging;
pub mod preprocess;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod settings;
pub mod speech;
pub mod translation;

pub use providers::{Gemini, Provider, ProviderResponse, ProviderUsage};

/// RFC 3339 UTC timestamp used in result envelopes and health checks.
pub fn now_timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
