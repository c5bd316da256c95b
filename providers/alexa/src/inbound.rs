use bb_core::{Activity, ActivityType, ChannelAccount, ConversationAccount};
use bb_security::{SignatureError, verify_timestamp_tolerance};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::warn;

use crate::CHANNEL_ID;
use crate::config::AlexaSettings;
use crate::error::AlexaError;
use crate::types::AlexaRequestEnvelope;

/// Slot whose value is used as the message text when present.
pub const PHRASE_SLOT: &str = "phrase";

/// Application id and timestamp checks configured in `settings`.
pub fn verify_envelope(
    settings: &AlexaSettings,
    envelope: &AlexaRequestEnvelope,
    now: OffsetDateTime,
) -> Result<(), AlexaError> {
    if let Some(expected) = settings.skill_id.as_deref() {
        let actual = envelope.application_id();
        if actual != Some(expected) {
            warn!(
                expected,
                actual = actual.unwrap_or_default(),
                "alexa application id rejected"
            );
            return Err(AlexaError::ApplicationId);
        }
    }
    if settings.verify_timestamp {
        let timestamp = envelope
            .request
            .timestamp()
            .ok_or(AlexaError::Timestamp(SignatureError::Missing))?;
        verify_timestamp_tolerance(timestamp, now, settings.timestamp_tolerance).map_err(|err| {
            warn!(request_id = %envelope.request.request_id, "alexa request timestamp outside tolerance");
            AlexaError::Timestamp(err)
        })?;
    }
    Ok(())
}

/// Maps an Alexa request to an activity. `raw` is the untouched envelope kept as channel data.
pub fn to_activity(envelope: &AlexaRequestEnvelope, raw: Value) -> Activity {
    let request = &envelope.request;
    let user_id = envelope.user_id().unwrap_or_default().to_string();
    let from = ChannelAccount::new(user_id.clone());
    let conversation_id = envelope
        .session_id()
        .map(str::to_string)
        .unwrap_or(user_id);

    let mut activity = match request.request_type.as_str() {
        "IntentRequest" => {
            let mut activity = Activity::new(ActivityType::Message);
            if let Some(intent) = &request.intent {
                let text = intent
                    .slot_value(PHRASE_SLOT)
                    .unwrap_or(intent.name.as_str());
                activity.text = Some(text.to_string());
                activity.value = Some(Value::Object(intent.slots.clone()));
            }
            activity
        }
        "LaunchRequest" => {
            let mut activity = Activity::new(ActivityType::ConversationUpdate);
            activity.members_added = vec![from.clone()];
            activity
        }
        "SessionEndedRequest" => {
            let mut activity = Activity::end_of_conversation();
            let mut value = Map::new();
            if let Some(reason) = &request.reason {
                value.insert("reason".into(), Value::String(reason.clone()));
            }
            if let Some(error) = &request.error {
                value.insert("error".into(), error.clone());
            }
            if !value.is_empty() {
                activity.value = Some(Value::Object(value));
            }
            activity
        }
        other => {
            let mut activity = Activity::new(ActivityType::Event);
            activity.name = Some(other.to_string());
            activity.value = raw.get("request").cloned();
            activity
        }
    };

    activity.id = Some(request.request_id.clone()).filter(|id| !id.is_empty());
    activity.timestamp = request.timestamp();
    activity.channel_id = CHANNEL_ID.to_string();
    activity.service_url = envelope.api_endpoint().map(str::to_string);
    activity.conversation = ConversationAccount::new(conversation_id);
    activity.from = from;
    activity.recipient = ChannelAccount::new(envelope.application_id().unwrap_or_default());
    activity.locale = request.locale.clone();
    activity.channel_data = Some(raw);
    activity
}
