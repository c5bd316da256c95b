//! WhatsApp through Twilio's Programmable Messaging API.
//!
//! Inbound webhooks are form encoded and signed with the account auth token. Replies are created
//! through the Messages resource, one request per activity.

mod adapter;
mod address;
mod client;
mod config;
mod error;
mod http;
mod inbound;

pub const CHANNEL_ID: &str = "whatsapp";

pub use adapter::{TwilioAdapter, message_form};
pub use address::{WHATSAPP_PREFIX, strip_whatsapp_prefix, whatsapp_address};
pub use client::{MessageForm, TwilioClient, TwilioRestClient};
pub use config::{DEFAULT_API_BASE, TwilioSettings};
pub use error::TwilioError;
pub use http::{TWILIO_WHATSAPP_PATH, TwilioState, router};
pub use inbound::{MAX_MEDIA, activity_type_for_status, to_activity};
