use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account Activity API webhook payload. Events stay raw so they can be kept as channel data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountActivity {
    #[serde(default)]
    pub for_user_id: Option<String>,
    #[serde(default)]
    pub direct_message_events: Vec<Value>,
    #[serde(default)]
    pub tweet_create_events: Vec<Value>,
    #[serde(default)]
    pub users: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectMessageEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub id: String,
    #[serde(default)]
    pub created_timestamp: Option<String>,
    #[serde(default)]
    pub message_create: Option<MessageCreate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    pub target: Target,
    pub sender_id: String,
    #[serde(default)]
    pub message_data: MessageData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub recipient_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachment: Option<DmAttachment>,
    #[serde(default)]
    pub quick_reply_response: Option<QuickReplyResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DmAttachment {
    #[serde(default)]
    pub media: Option<Media>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub media_url_https: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickReplyResponse {
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id_str: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub extended_tweet: Option<ExtendedTweet>,
    #[serde(default)]
    pub in_reply_to_status_id_str: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub user: TweetUser,
}

impl Tweet {
    /// Untruncated text when Twitter supplied it.
    pub fn full_text(&self) -> &str {
        self.extended_tweet
            .as_ref()
            .map(|extended| extended.full_text.as_str())
            .or(self.full_text.as_deref())
            .unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedTweet {
    pub full_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetUser {
    pub id_str: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Outgoing direct message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectMessage {
    pub recipient_id: String,
    pub text: String,
    pub quick_replies: Vec<QuickReplyOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReplyOption {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Outgoing status reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TweetReply {
    pub status: String,
    pub in_reply_to_status_id: Option<String>,
}
