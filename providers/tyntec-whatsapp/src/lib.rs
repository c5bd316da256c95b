//! WhatsApp through the tyntec Conversations API (v3).

mod adapter;
mod client;
mod config;
mod error;
mod http;
mod inbound;
mod outbound;

pub const CHANNEL_ID: &str = "whatsapp";

pub use adapter::TyntecAdapter;
pub use client::{TyntecClient, TyntecRestClient};
pub use config::{DEFAULT_API_BASE, TyntecSettings, WEBHOOK_SECRET_HEADER};
pub use error::TyntecError;
pub use http::{TYNTEC_WHATSAPP_PATH, TyntecState, router};
pub use inbound::{
    CONTACTS_CONTENT_TYPE, LOCATION_CONTENT_TYPE, MoContent, MoMedia, TyntecEvent, WhatsAppContext,
    activity_type_for_event, to_activity,
};
pub use outbound::{TyntecMessage, build_message, message_content};
