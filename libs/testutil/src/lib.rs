//! Test helpers shared by the botbridge crates.
//!
//! * [`RecordingAdapter`] captures what a turn sends.
//! * [`RecordingBot`] records inbound activities and answers with scripted replies.
//! * [`storage`] holds the behavioural suite every storage provider must pass.
//! * [`http`] builds webhook requests and reads responses for router tests.

mod assertions;
mod doubles;
pub mod http;
pub mod storage;

pub use assertions::{activity_contains_text, assert_activity_type, json_contains_text};
pub use doubles::{RecordingAdapter, RecordingBot};
