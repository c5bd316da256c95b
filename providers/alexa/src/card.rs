use bb_core::Attachment;
use serde_json::{Value, json};

pub const SIMPLE_CARD_CONTENT_TYPE: &str = "application/vnd.amazon.alexa.card.simple";
pub const STANDARD_CARD_CONTENT_TYPE: &str = "application/vnd.amazon.alexa.card.standard";
pub const LINK_ACCOUNT_CARD_CONTENT_TYPE: &str = "application/vnd.amazon.alexa.card.link-account";

/// Builders for attachments that become the card of the Alexa response.
pub struct AlexaCard;

impl AlexaCard {
    pub fn simple(title: impl Into<String>, content: impl Into<String>) -> Attachment {
        Attachment::content(
            SIMPLE_CARD_CONTENT_TYPE,
            json!({
                "type": "Simple",
                "title": title.into(),
                "content": content.into(),
            }),
        )
    }

    pub fn standard(
        title: impl Into<String>,
        text: impl Into<String>,
        small_image_url: Option<String>,
        large_image_url: Option<String>,
    ) -> Attachment {
        let mut card = json!({
            "type": "Standard",
            "title": title.into(),
            "text": text.into(),
        });
        if small_image_url.is_some() || large_image_url.is_some() {
            let mut image = serde_json::Map::new();
            if let Some(url) = small_image_url {
                image.insert("smallImageUrl".into(), Value::String(url));
            }
            if let Some(url) = large_image_url {
                image.insert("largeImageUrl".into(), Value::String(url));
            }
            card["image"] = Value::Object(image);
        }
        Attachment::content(STANDARD_CARD_CONTENT_TYPE, card)
    }

    pub fn link_account() -> Attachment {
        Attachment::content(LINK_ACCOUNT_CARD_CONTENT_TYPE, json!({"type": "LinkAccount"}))
    }
}

pub(crate) fn is_card(content_type: &str) -> bool {
    matches!(
        content_type,
        SIMPLE_CARD_CONTENT_TYPE | STANDARD_CARD_CONTENT_TYPE | LINK_ACCOUNT_CARD_CONTENT_TYPE
    )
}
