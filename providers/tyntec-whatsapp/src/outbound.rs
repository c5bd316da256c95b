use bb_core::markup::html_to_whatsapp;
use bb_core::{Activity, Attachment};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::inbound::{CONTACTS_CONTENT_TYPE, LOCATION_CONTENT_TYPE};

/// Request body for `POST /conversations/v3/messages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TyntecMessage {
    pub from: String,
    pub to: String,
    pub channel: &'static str,
    pub content: Value,
}

/// Builds the outgoing message, or `None` when the activity has nothing WhatsApp can carry.
pub fn build_message(from: &str, activity: &Activity) -> Option<TyntecMessage> {
    let to = if activity.conversation.id.is_empty() {
        activity.recipient.id.clone()
    } else {
        activity.conversation.id.clone()
    };
    let content = message_content(activity)?;
    Some(TyntecMessage {
        from: from.to_string(),
        to,
        channel: "whatsapp",
        content,
    })
}

/// Content object for an activity: template passthrough, then the first attachment, then text.
pub fn message_content(activity: &Activity) -> Option<Value> {
    if let Some(data) = activity.channel_data.as_ref().filter(|data| {
        matches!(
            data.get("contentType").and_then(Value::as_str),
            Some("template") | Some("interactive")
        )
    }) {
        return Some(data.clone());
    }

    let text = activity
        .text
        .as_deref()
        .map(html_to_whatsapp)
        .filter(|text| !text.trim().is_empty());

    if let Some(content) = activity
        .attachments
        .iter()
        .find_map(|attachment| attachment_content(attachment, text.as_deref()))
    {
        if activity.attachments.len() > 1 {
            debug!(
                count = activity.attachments.len(),
                "tyntec sends one attachment per message, using the first supported one"
            );
        }
        return Some(content);
    }

    text.map(|text| json!({"contentType": "text", "text": text}))
}

fn attachment_content(attachment: &Attachment, caption: Option<&str>) -> Option<Value> {
    let content_type = attachment.content_type.to_ascii_lowercase();
    match content_type.as_str() {
        LOCATION_CONTENT_TYPE => {
            return attachment
                .content
                .clone()
                .map(|location| json!({"contentType": "location", "location": location}));
        }
        CONTACTS_CONTENT_TYPE => {
            return attachment
                .content
                .clone()
                .map(|contacts| json!({"contentType": "contacts", "contacts": contacts}));
        }
        _ => {}
    }

    let url = attachment.content_url.as_deref()?;
    let kind = if content_type == "image/webp" {
        "sticker"
    } else if content_type.starts_with("image/") {
        "image"
    } else if content_type.starts_with("video/") {
        "video"
    } else if content_type.starts_with("audio/") {
        "audio"
    } else if content_type.starts_with("application/") {
        "document"
    } else {
        return None;
    };

    let mut media = json!({ "url": url });
    // stickers and audio take no caption
    if let Some(caption) = caption.filter(|_| matches!(kind, "image" | "video" | "document")) {
        media["caption"] = Value::String(caption.to_string());
    }
    if kind == "document" {
        if let Some(name) = &attachment.name {
            media["filename"] = Value::String(name.clone());
        }
    }
    let mut content = json!({ "contentType": kind });
    content[kind] = media;
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::ConversationAccount;

    fn reply(text: &str) -> Activity {
        Activity {
            conversation: ConversationAccount::new("491672634678"),
            ..Activity::message(text)
        }
    }

    #[test]
    fn text_message_is_formatted() {
        let message = build_message("4923147790813", &reply("<b>bold</b>")).unwrap();
        assert_eq!(
            serde_json::to_value(message).unwrap(),
            json!({
                "from": "4923147790813",
                "to": "491672634678",
                "channel": "whatsapp",
                "content": {"contentType": "text", "text": "*bold*"}
            })
        );
    }

    #[test]
    fn image_takes_text_as_caption() {
        let activity = reply("look").with_attachment(Attachment::media("image/png", "https://m/1.png"));
        assert_eq!(
            message_content(&activity),
            Some(json!({"contentType": "image", "image": {"url": "https://m/1.png", "caption": "look"}}))
        );
    }

    #[test]
    fn webp_is_sent_as_sticker_without_caption() {
        let activity = reply("ignored").with_attachment(Attachment::media("image/webp", "https://m/s.webp"));
        assert_eq!(
            message_content(&activity),
            Some(json!({"contentType": "sticker", "sticker": {"url": "https://m/s.webp"}}))
        );
    }

    #[test]
    fn documents_carry_filename() {
        let activity = reply("").with_attachment(
            Attachment::media("application/pdf", "https://m/r.pdf").with_name(Some("report.pdf".into())),
        );
        assert_eq!(
            message_content(&activity),
            Some(json!({"contentType": "document", "document": {"url": "https://m/r.pdf", "filename": "report.pdf"}}))
        );
    }

    #[test]
    fn location_attachment_wins_over_text() {
        let activity = reply("here").with_attachment(Attachment::content(
            LOCATION_CONTENT_TYPE,
            json!({"latitude": 1.0, "longitude": 2.0}),
        ));
        assert_eq!(
            message_content(&activity),
            Some(json!({"contentType": "location", "location": {"latitude": 1.0, "longitude": 2.0}}))
        );
    }

    #[test]
    fn template_channel_data_passes_through() {
        let template = json!({
            "contentType": "template",
            "template": {"templateId": "welcome", "templateLanguage": "en"}
        });
        let activity = reply("ignored").with_channel_data(template.clone());
        assert_eq!(message_content(&activity), Some(template));
    }

    #[test]
    fn empty_activity_has_no_content() {
        assert!(build_message("1", &reply("  ")).is_none());
        let unsupported = reply("").with_attachment(Attachment::media("text/html", "https://x"));
        assert!(message_content(&unsupported).is_none());
    }
}
