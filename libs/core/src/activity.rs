use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

/// Activity type tag.
///
/// Unknown strings are preserved in [`ActivityType::Other`] so a payload round-trips verbatim.
///
/// ```
/// use bb_core::ActivityType;
///
/// assert_eq!(ActivityType::parse("messageDelivered"), ActivityType::MessageDelivered);
/// assert_eq!(ActivityType::EndOfConversation.as_str(), "endOfConversation");
/// assert_eq!(ActivityType::parse("custom").as_str(), "custom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ActivityType {
    #[default]
    Message,
    Event,
    ConversationUpdate,
    EndOfConversation,
    Typing,
    MessageReaction,
    MessageDelivered,
    MessageRead,
    MessageSent,
    MessageFailed,
    MessageUndelivered,
    MessageQueued,
    MessageDeleted,
    Invoke,
    Other(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Message => "message",
            ActivityType::Event => "event",
            ActivityType::ConversationUpdate => "conversationUpdate",
            ActivityType::EndOfConversation => "endOfConversation",
            ActivityType::Typing => "typing",
            ActivityType::MessageReaction => "messageReaction",
            ActivityType::MessageDelivered => "messageDelivered",
            ActivityType::MessageRead => "messageRead",
            ActivityType::MessageSent => "messageSent",
            ActivityType::MessageFailed => "messageFailed",
            ActivityType::MessageUndelivered => "messageUndelivered",
            ActivityType::MessageQueued => "messageQueued",
            ActivityType::MessageDeleted => "messageDeleted",
            ActivityType::Invoke => "invoke",
            ActivityType::Other(other) => other.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "message" => ActivityType::Message,
            "event" => ActivityType::Event,
            "conversationUpdate" => ActivityType::ConversationUpdate,
            "endOfConversation" => ActivityType::EndOfConversation,
            "typing" => ActivityType::Typing,
            "messageReaction" => ActivityType::MessageReaction,
            "messageDelivered" => ActivityType::MessageDelivered,
            "messageRead" => ActivityType::MessageRead,
            "messageSent" => ActivityType::MessageSent,
            "messageFailed" => ActivityType::MessageFailed,
            "messageUndelivered" => ActivityType::MessageUndelivered,
            "messageQueued" => ActivityType::MessageQueued,
            "messageDeleted" => ActivityType::MessageDeleted,
            "invoke" => ActivityType::Invoke,
            other => ActivityType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActivityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ActivityType::parse(&raw))
    }
}

/// Whether the bot expects the user to reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputHint {
    AcceptingInput,
    ExpectingInput,
    IgnoringInput,
}

/// A user or bot taking part in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Media or card attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Attachment {
    /// Media reference by URL.
    pub fn media(content_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Structured content such as a card or a location payload.
    pub fn content(content_type: impl Into<String>, content: Value) -> Self {
        Self {
            content_type: content_type.into(),
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedActions {
    #[serde(default)]
    pub actions: Vec<CardAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAction {
    #[serde(rename = "type", default)]
    pub action_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl CardAction {
    pub fn im_back(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            action_type: "imBack".into(),
            value: Some(Value::String(title.clone())),
            title,
        }
    }
}

/// Canonical message/event envelope exchanged between channel adapters and the bot.
///
/// ```
/// use bb_core::{Activity, ActivityType};
///
/// let activity = Activity::message("hello");
/// assert_eq!(activity.activity_type, ActivityType::Message);
/// let json = serde_json::to_value(&activity).unwrap();
/// assert_eq!(json["type"], "message");
/// assert_eq!(json["text"], "hello");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub local_timestamp: Option<OffsetDateTime>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default)]
    pub conversation: ConversationAccount,
    #[serde(default)]
    pub from: ChannelAccount,
    #[serde(default)]
    pub recipient: ChannelAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<InputHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<SuggestedActions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
}

impl Activity {
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            ..Default::default()
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn end_of_conversation() -> Self {
        Self::new(ActivityType::EndOfConversation)
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_speak(mut self, ssml: impl Into<String>) -> Self {
        self.speak = Some(ssml.into());
        self
    }

    pub fn with_input_hint(mut self, hint: InputHint) -> Self {
        self.input_hint = Some(hint);
        self
    }

    pub fn with_channel_data(mut self, data: Value) -> Self {
        self.channel_data = Some(data);
        self
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }

    /// Text of the activity, or an empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Message addressed back to the sender of this activity.
    pub fn reply(&self, text: impl Into<String>) -> Activity {
        let mut reply = Activity::message(text);
        reply.apply_conversation_reference(&self.conversation_reference());
        reply
    }

    /// Reads a top-level key out of `channel_data`.
    pub fn channel_data_field(&self, key: &str) -> Option<&Value> {
        self.channel_data.as_ref().and_then(|data| data.get(key))
    }

    /// Reference used to address replies to the conversation this activity belongs to.
    pub fn conversation_reference(&self) -> ConversationReference {
        ConversationReference {
            activity_id: self.id.clone(),
            user: self.from.clone(),
            bot: self.recipient.clone(),
            conversation: self.conversation.clone(),
            channel_id: self.channel_id.clone(),
            service_url: self.service_url.clone(),
            locale: self.locale.clone(),
        }
    }

    /// Fills routing fields left empty on an outgoing activity from the conversation reference.
    pub fn apply_conversation_reference(&mut self, reference: &ConversationReference) {
        if self.channel_id.is_empty() {
            self.channel_id = reference.channel_id.clone();
        }
        if self.service_url.is_none() {
            self.service_url = reference.service_url.clone();
        }
        if self.conversation.id.is_empty() {
            self.conversation = reference.conversation.clone();
        }
        if self.from.id.is_empty() {
            self.from = reference.bot.clone();
        }
        if self.recipient.id.is_empty() {
            self.recipient = reference.user.clone();
        }
        if self.locale.is_none() {
            self.locale = reference.locale.clone();
        }
        if self.reply_to_id.is_none() {
            self.reply_to_id = reference.activity_id.clone();
        }
    }
}

impl From<&str> for Activity {
    fn from(text: &str) -> Self {
        Activity::message(text)
    }
}

impl From<String> for Activity {
    fn from(text: String) -> Self {
        Activity::message(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    pub user: ChannelAccount,
    pub bot: ChannelAccount,
    pub conversation: ConversationAccount,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_payload() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "messageDelivered",
            "id": "SM123",
            "timestamp": "2024-01-01T00:00:00Z",
            "channelId": "whatsapp",
            "conversation": {"id": "whatsapp:+15550001", "isGroup": false},
            "from": {"id": "whatsapp:+15550001", "name": "Ada"},
            "recipient": {"id": "whatsapp:+15550002"},
            "attachments": [{"contentType": "image/png", "contentUrl": "https://x/y.png"}]
        }))
        .unwrap();
        assert_eq!(activity.activity_type, ActivityType::MessageDelivered);
        assert_eq!(activity.conversation.is_group, Some(false));
        assert_eq!(activity.from.name.as_deref(), Some("Ada"));
        assert_eq!(
            activity.attachments[0].content_url.as_deref(),
            Some("https://x/y.png")
        );
        assert_eq!(
            activity.timestamp.map(|ts| ts.unix_timestamp()),
            Some(1_704_067_200)
        );
    }

    #[test]
    fn unknown_type_is_preserved() {
        let activity: Activity = serde_json::from_value(json!({"type": "handoff"})).unwrap();
        assert_eq!(
            activity.activity_type,
            ActivityType::Other("handoff".into())
        );
        let back = serde_json::to_value(&activity).unwrap();
        assert_eq!(back["type"], "handoff");
    }

    #[test]
    fn apply_reference_swaps_participants_and_keeps_explicit_fields() {
        let incoming = Activity {
            id: Some("in-1".into()),
            channel_id: "alexa".into(),
            conversation: ConversationAccount::new("session-1"),
            from: ChannelAccount::new("user"),
            recipient: ChannelAccount::new("bot"),
            locale: Some("en-US".into()),
            ..Activity::message("hi")
        };
        let reference = incoming.conversation_reference();

        let mut reply = Activity::message("hello");
        reply.locale = Some("de-DE".into());
        reply.apply_conversation_reference(&reference);

        assert_eq!(reply.channel_id, "alexa");
        assert_eq!(reply.conversation.id, "session-1");
        assert_eq!(reply.from.id, "bot");
        assert_eq!(reply.recipient.id, "user");
        assert_eq!(reply.reply_to_id.as_deref(), Some("in-1"));
        assert_eq!(reply.locale.as_deref(), Some("de-DE"));
    }

    #[test]
    fn reply_is_addressed_to_sender() {
        let incoming = Activity {
            id: Some("in-2".into()),
            channel_id: "twitter".into(),
            conversation: ConversationAccount::new("42"),
            from: ChannelAccount::new("42"),
            recipient: ChannelAccount::new("bot"),
            ..Activity::message("hi")
        };
        let reply = incoming.reply("hey");
        assert_eq!(reply.text.as_deref(), Some("hey"));
        assert_eq!(reply.recipient.id, "42");
        assert_eq!(reply.from.id, "bot");
        assert_eq!(reply.reply_to_id.as_deref(), Some("in-2"));
    }

    #[test]
    fn local_timestamp_round_trips() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "localTimestamp": "2024-01-01T09:00:00+09:00"
        }))
        .unwrap();
        let local = activity.local_timestamp.unwrap();
        assert_eq!(local.offset().whole_hours(), 9);
        let back = serde_json::to_value(&activity).unwrap();
        assert_eq!(back["localTimestamp"], "2024-01-01T09:00:00+09:00");
    }

    #[test]
    fn channel_data_field_reads_nested_key() {
        let activity = Activity::message("x").with_channel_data(json!({"tweet": true}));
        assert_eq!(activity.channel_data_field("tweet"), Some(&json!(true)));
        assert!(activity.channel_data_field("missing").is_none());
    }
}
