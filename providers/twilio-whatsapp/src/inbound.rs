use std::collections::BTreeMap;

use bb_core::{Activity, ActivityType, Attachment, ChannelAccount, ConversationAccount};
use serde_json::{Map, Value, json};

use crate::CHANNEL_ID;

/// Activity type for a Twilio `SmsStatus` / `MessageStatus` value.
///
/// Webhooks without a status are incoming messages.
pub fn activity_type_for_status(status: Option<&str>) -> ActivityType {
    match status {
        None | Some("") | Some("received") => ActivityType::Message,
        Some("sent") => ActivityType::MessageSent,
        Some("delivered") => ActivityType::MessageDelivered,
        Some("read") => ActivityType::MessageRead,
        Some("failed") => ActivityType::MessageFailed,
        Some("undelivered") => ActivityType::MessageUndelivered,
        Some("queued") => ActivityType::MessageQueued,
        Some(_) => ActivityType::Event,
    }
}

/// Maps the form parameters of a Twilio webhook to an activity.
pub fn to_activity(params: &BTreeMap<String, String>) -> Activity {
    let field = |name: &str| params.get(name).map(String::as_str).filter(|v| !v.is_empty());

    let status = field("SmsStatus").or_else(|| field("MessageStatus"));
    let mut activity = Activity::new(activity_type_for_status(status));
    if activity.activity_type == ActivityType::Event {
        activity.name = status.map(str::to_string);
    }

    let from = field("From").unwrap_or_default();
    activity.id = field("MessageSid")
        .or_else(|| field("SmsSid"))
        .map(str::to_string);
    activity.channel_id = CHANNEL_ID.to_string();
    activity.conversation = ConversationAccount::new(from);
    activity.from = ChannelAccount::new(from).with_name(field("ProfileName").map(str::to_string));
    activity.recipient = ChannelAccount::new(field("To").unwrap_or_default());
    activity.text = field("Body").map(str::to_string);
    activity.attachments = media_attachments(params);

    if let Some(location) = location(params) {
        activity.entities.push(location.entity);
        activity.value = Some(location.value);
    }

    let channel_data: Map<String, Value> = params
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    activity.channel_data = Some(Value::Object(channel_data));
    activity
}

/// Twilio attaches at most ten media items to one message.
pub const MAX_MEDIA: usize = 10;

fn media_attachments(params: &BTreeMap<String, String>) -> Vec<Attachment> {
    let count = params
        .get("NumMedia")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_MEDIA);
    (0..count)
        .map_while(|idx| {
            let url = params.get(&format!("MediaUrl{idx}"))?;
            let content_type = params
                .get(&format!("MediaContentType{idx}"))
                .map(String::as_str)
                .unwrap_or("application/octet-stream");
            Some(Attachment::media(content_type, url.as_str()))
        })
        .collect()
}

struct Location {
    entity: Value,
    value: Value,
}

fn location(params: &BTreeMap<String, String>) -> Option<Location> {
    let coordinate = |name: &str| params.get(name).and_then(|raw| raw.trim().parse::<f64>().ok());
    let latitude = coordinate("Latitude")?;
    let longitude = coordinate("Longitude")?;
    let address = params.get("Address").cloned();
    let label = params.get("Label").cloned();

    let mut entity = json!({
        "type": "GeoCoordinates",
        "latitude": latitude,
        "longitude": longitude,
    });
    if let Some(name) = label.clone().or_else(|| address.clone()) {
        entity["name"] = Value::String(name);
    }
    let mut value = json!({"latitude": latitude, "longitude": longitude});
    if let Some(address) = address {
        value["address"] = Value::String(address);
    }
    if let Some(label) = label {
        value["label"] = Value::String(label);
    }
    Some(Location { entity, value })
}
