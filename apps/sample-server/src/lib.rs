//! Echo bot wired to every channel whose settings are present in the environment.

pub mod bot;
pub mod config;
pub mod http;

pub use bot::{GOODBYE, GREETING, build_runner, echo_bot};
pub use config::{AzureSentiment, Channels, SampleConfig};
pub use http::{HEALTHZ_PATH, build_router};
