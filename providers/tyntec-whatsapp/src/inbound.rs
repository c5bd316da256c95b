use bb_core::{Activity, ActivityType, Attachment, ChannelAccount, ConversationAccount};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::CHANNEL_ID;

pub const LOCATION_CONTENT_TYPE: &str = "application/vnd.tyntec.location";
pub const CONTACTS_CONTENT_TYPE: &str = "application/vnd.tyntec.contacts";

const MO_MESSAGE: &str = "MoMessage";
const STATUS_PREFIX: &str = "MessageStatus::";

/// Webhook event as posted by the tyntec Conversations API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TyntecEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub content: Option<MoContent>,
    #[serde(default)]
    pub whatsapp: Option<WhatsAppContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoContent {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<MoMedia>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub contacts: Option<Value>,
    #[serde(default)]
    pub interactive: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoMedia {
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppContext {
    #[serde(default)]
    pub sender_name: Option<String>,
}

/// Activity type for an `event` value.
pub fn activity_type_for_event(event: &str) -> ActivityType {
    if event == MO_MESSAGE {
        return ActivityType::Message;
    }
    match event.strip_prefix(STATUS_PREFIX) {
        Some("delivered") => ActivityType::MessageDelivered,
        Some("seen") => ActivityType::MessageRead,
        Some("failed") => ActivityType::MessageFailed,
        Some("accepted") | Some("dispatched") => ActivityType::MessageSent,
        Some("deleted") => ActivityType::MessageDeleted,
        _ => ActivityType::Event,
    }
}

/// Maps a webhook event to an activity. `raw` is kept as channel data.
pub fn to_activity(event: &TyntecEvent, raw: Value) -> Activity {
    let mut activity = Activity::new(activity_type_for_event(&event.event));
    if activity.activity_type == ActivityType::Event {
        activity.name = Some(event.event.clone());
    }

    let from = event.from.clone().unwrap_or_default();
    let sender_name = event
        .whatsapp
        .as_ref()
        .and_then(|context| context.sender_name.clone());
    activity.id = event.message_id.clone();
    activity.timestamp = event
        .timestamp
        .as_deref()
        .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok());
    activity.channel_id = CHANNEL_ID.to_string();
    activity.conversation = ConversationAccount::new(from.clone());
    activity.from = ChannelAccount::new(from).with_name(sender_name);
    activity.recipient = ChannelAccount::new(event.to.clone().unwrap_or_default());

    if let Some(content) = &event.content {
        apply_content(&mut activity, content);
    }
    activity.channel_data = Some(raw);
    activity
}

fn apply_content(activity: &mut Activity, content: &MoContent) {
    match content.content_type.as_str() {
        "text" => activity.text = content.text.clone(),
        "media" => {
            let media = content
                .media
                .as_ref()
                .and_then(|media| media.url.as_ref().map(|url| (media, url)));
            if let Some((media, url)) = media {
                activity.attachments.push(
                    Attachment::media(media_mime(&media.media_type), url.as_str())
                        .with_name(media.caption.clone()),
                );
            }
        }
        "location" => {
            if let Some(location) = &content.location {
                activity
                    .attachments
                    .push(Attachment::content(LOCATION_CONTENT_TYPE, location.clone()));
            }
        }
        "contacts" => {
            if let Some(contacts) = &content.contacts {
                activity
                    .attachments
                    .push(Attachment::content(CONTACTS_CONTENT_TYPE, contacts.clone()));
            }
        }
        "interactive" => {
            let reply = content.interactive.as_ref().and_then(|interactive| {
                interactive
                    .get("button")
                    .or_else(|| interactive.get("list"))
            });
            if let Some(reply) = reply {
                activity.text = reply.get("title").and_then(Value::as_str).map(str::to_string);
                activity.value = reply.get("payload").cloned();
            }
        }
        _ => activity.text = content.text.clone(),
    }
}

fn media_mime(media_type: &str) -> &'static str {
    match media_type {
        "image" => "image/jpeg",
        "sticker" => "image/webp",
        "video" => "video/mp4",
        "audio" | "voice" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
