//! Logging and metric helpers shared by the botbridge crates.
//!
//! Logs go through `tracing`; counters go through the `metrics` facade so the host decides which
//! recorder (if any) is installed.

use anyhow::Result;
use bb_core::Activity;
use tracing::Span;

mod config;
mod counters;
mod tracing_init;

pub use config::TelemetryConfig;
pub use counters::{Outcome, record_inbound, record_nlp_call, record_outbound, record_storage_op};
pub use tracing_init::init_telemetry;

/// Installs the shared subscriber configured from `RUST_LOG` and `LOG_FORMAT`.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name))
}

/// Span covering the inbound handling of one activity on a channel.
pub fn channel_span(channel: &str, activity: &Activity) -> Span {
    tracing::info_span!(
        "inbound",
        channel = %channel,
        activity_type = %activity.activity_type,
        activity_id = activity.id.as_deref().unwrap_or_default(),
        conversation_id = %activity.conversation.id,
    )
}
