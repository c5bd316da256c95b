use bb_core::{Activity, Attachment, ChannelAccount, ConversationAccount};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::CHANNEL_ID;
use crate::config::TwitterSettings;
use crate::types::{AccountActivity, DirectMessageEvent, Tweet};

static LEADING_MENTIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\s*@\w+)+\s*").expect("mention pattern compiles"));

/// One activity per direct message and tweet in the payload, skipping the bot's own events.
pub fn to_activities(settings: &TwitterSettings, payload: &AccountActivity) -> Vec<Activity> {
    let bot_id = payload.for_user_id.as_deref();
    let mut activities = Vec::new();

    for raw in &payload.direct_message_events {
        let event: DirectMessageEvent = match serde_json::from_value(raw.clone()) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "skipping malformed direct message event");
                continue;
            }
        };
        if let Some(activity) = direct_message_activity(&event, raw, bot_id, payload) {
            activities.push(activity);
        }
    }

    for raw in &payload.tweet_create_events {
        let tweet: Tweet = match serde_json::from_value(raw.clone()) {
            Ok(tweet) => tweet,
            Err(err) => {
                warn!(error = %err, "skipping malformed tweet event");
                continue;
            }
        };
        if settings.is_bot(&tweet.user.screen_name) || Some(tweet.user.id_str.as_str()) == bot_id {
            debug!(tweet_id = %tweet.id_str, "ignoring tweet authored by the bot");
            continue;
        }
        activities.push(tweet_activity(&tweet, raw, bot_id, settings));
    }
    activities
}

fn direct_message_activity(
    event: &DirectMessageEvent,
    raw: &Value,
    bot_id: Option<&str>,
    payload: &AccountActivity,
) -> Option<Activity> {
    if event.event_type != "message_create" {
        debug!(event_type = %event.event_type, "ignoring direct message event");
        return None;
    }
    let create = event.message_create.as_ref()?;
    if Some(create.sender_id.as_str()) == bot_id {
        debug!(event_id = %event.id, "ignoring direct message sent by the bot");
        return None;
    }

    let sender_name = payload
        .users
        .get(&create.sender_id)
        .and_then(|user| user.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut activity = Activity::message(create.message_data.text.clone());
    activity.id = Some(event.id.clone());
    activity.timestamp = event
        .created_timestamp
        .as_deref()
        .and_then(|ms| ms.parse::<i128>().ok())
        .and_then(|ms| ms.checked_mul(1_000_000))
        .and_then(|nanos| OffsetDateTime::from_unix_timestamp_nanos(nanos).ok());
    activity.channel_id = CHANNEL_ID.to_string();
    activity.conversation = ConversationAccount::new(create.sender_id.clone());
    activity.from = ChannelAccount::new(create.sender_id.clone()).with_name(sender_name);
    activity.recipient = ChannelAccount::new(create.target.recipient_id.clone());
    if let Some(media) = create
        .message_data
        .attachment
        .as_ref()
        .and_then(|attachment| attachment.media.as_ref())
    {
        activity.attachments.push(Attachment::media(
            media_content_type(&media.media_type),
            media.media_url_https.clone(),
        ));
    }
    if let Some(metadata) = create
        .message_data
        .quick_reply_response
        .as_ref()
        .and_then(|reply| reply.metadata.clone())
    {
        activity.value = Some(Value::String(metadata));
    }
    activity.channel_data = Some(raw.clone());
    Some(activity)
}

fn tweet_activity(
    tweet: &Tweet,
    raw: &Value,
    bot_id: Option<&str>,
    settings: &TwitterSettings,
) -> Activity {
    let mut activity = Activity::message(strip_leading_mentions(tweet.full_text()));
    activity.id = Some(tweet.id_str.clone());
    activity.timestamp = tweet
        .created_at
        .as_deref()
        .and_then(parse_created_at);
    activity.channel_id = CHANNEL_ID.to_string();
    let conversation_id = tweet
        .in_reply_to_status_id_str
        .clone()
        .unwrap_or_else(|| tweet.id_str.clone());
    activity.conversation = ConversationAccount {
        is_group: Some(true),
        ..ConversationAccount::new(conversation_id)
    };
    activity.from = ChannelAccount::new(tweet.user.id_str.clone()).with_name(tweet.user.name.clone());
    activity.recipient = ChannelAccount::new(bot_id.unwrap_or(&settings.screen_name))
        .with_name(Some(settings.screen_name.clone()));
    activity.channel_data = Some(raw.clone());
    activity
}

/// Parses Twitter's `Wed Oct 10 20:19:24 +0000 2018` timestamps.
fn parse_created_at(raw: &str) -> Option<OffsetDateTime> {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
    );
    OffsetDateTime::parse(raw, format).ok()
}

/// Removes the `@handle` prefix Twitter adds to replies.
///
/// ```
/// use bb_provider_twitter::strip_leading_mentions;
///
/// assert_eq!(strip_leading_mentions("@bot @alice what's up @bob"), "what's up @bob");
/// ```
pub fn strip_leading_mentions(text: &str) -> String {
    LEADING_MENTIONS.replace(text, "").into_owned()
}

fn media_content_type(media_type: &str) -> &'static str {
    match media_type {
        "photo" => "image/jpeg",
        "animated_gif" => "image/gif",
        "video" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> TwitterSettings {
        TwitterSettings::new("secret", "bearer", "echobot")
    }

    fn payload(value: Value) -> AccountActivity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn out_of_range_dm_timestamp_is_dropped() {
        let event = json!({
            "type": "message_create",
            "id": "1002",
            "created_timestamp": "99999999999999999999999999999999999",
            "message_create": {
                "target": {"recipient_id": "42"},
                "sender_id": "7",
                "message_data": {"text": "late"}
            }
        });
        let activities = to_activities(
            &settings(),
            &payload(json!({"for_user_id": "42", "direct_message_events": [event]})),
        );

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].text.as_deref(), Some("late"));
        assert!(activities[0].timestamp.is_none());
    }

    #[test]
    fn maps_direct_message() {
        let event = json!({
            "type": "message_create",
            "id": "1001",
            "created_timestamp": "1714557600000",
            "message_create": {
                "target": {"recipient_id": "42"},
                "sender_id": "7",
                "message_data": {
                    "text": "hello bot",
                    "attachment": {"type": "media", "media": {"media_url_https": "https://pbs/1.jpg", "type": "photo"}}
                }
            }
        });
        let activities = to_activities(
            &settings(),
            &payload(json!({
                "for_user_id": "42",
                "direct_message_events": [event.clone()],
                "users": {"7": {"id": "7", "name": "Ada", "screen_name": "ada"}}
            })),
        );

        assert_eq!(activities.len(), 1);
        let activity = &activities[0];
        assert_eq!(activity.id.as_deref(), Some("1001"));
        assert_eq!(activity.channel_id, "twitter");
        assert_eq!(activity.conversation.id, "7");
        assert_eq!(activity.from.id, "7");
        assert_eq!(activity.from.name.as_deref(), Some("Ada"));
        assert_eq!(activity.recipient.id, "42");
        assert_eq!(activity.text.as_deref(), Some("hello bot"));
        assert_eq!(activity.attachments, vec![Attachment::media("image/jpeg", "https://pbs/1.jpg")]);
        assert_eq!(activity.channel_data, Some(event));
        assert_eq!(
            activity.timestamp.map(OffsetDateTime::unix_timestamp),
            Some(1_714_557_600)
        );
    }

    #[test]
    fn skips_bot_authored_events() {
        let activities = to_activities(
            &settings(),
            &payload(json!({
                "for_user_id": "42",
                "direct_message_events": [{
                    "type": "message_create",
                    "id": "1",
                    "message_create": {
                        "target": {"recipient_id": "7"},
                        "sender_id": "42",
                        "message_data": {"text": "echo"}
                    }
                }],
                "tweet_create_events": [{
                    "id_str": "2",
                    "text": "my own tweet",
                    "user": {"id_str": "42", "screen_name": "EchoBot"}
                }]
            })),
        );
        assert!(activities.is_empty());
    }

    #[test]
    fn maps_mention_tweet() {
        let activities = to_activities(
            &settings(),
            &payload(json!({
                "for_user_id": "42",
                "tweet_create_events": [{
                    "id_str": "555",
                    "text": "@echobot what time is it?",
                    "in_reply_to_status_id_str": "500",
                    "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                    "user": {"id_str": "9", "screen_name": "bob", "name": "Bob"}
                }]
            })),
        );

        let activity = &activities[0];
        assert_eq!(activity.text.as_deref(), Some("what time is it?"));
        assert_eq!(activity.conversation.id, "500");
        assert_eq!(activity.conversation.is_group, Some(true));
        assert_eq!(activity.from.id, "9");
        assert_eq!(activity.recipient.id, "42");
        assert_eq!(
            activity.timestamp.map(OffsetDateTime::unix_timestamp),
            Some(1_539_202_764)
        );
    }

    #[test]
    fn ignores_non_message_dm_events() {
        let activities = to_activities(
            &settings(),
            &payload(json!({
                "direct_message_events": [{"type": "message_read", "id": "1"}]
            })),
        );
        assert!(activities.is_empty());
    }
}
