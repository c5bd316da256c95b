//! Twitter Account Activity webhook: direct messages and mentions.
//!
//! Direct messages are answered with direct messages. Mentions are answered with a status reply
//! addressed to the author.

mod adapter;
mod client;
mod config;
mod error;
mod http;
mod inbound;
mod types;

pub const CHANNEL_ID: &str = "twitter";

pub use adapter::{MAX_QUICK_REPLIES, TwitterAdapter, direct_message, is_tweet_reply, tweet_reply};
pub use client::{TwitterClient, TwitterRestClient, direct_message_event};
pub use config::{DEFAULT_API_BASE, TwitterSettings};
pub use error::TwitterError;
pub use http::{TWITTER_WEBHOOK_PATH, TwitterState, router};
pub use inbound::{strip_leading_mentions, to_activities};
pub use types::*;
