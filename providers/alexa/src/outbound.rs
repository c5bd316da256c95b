use bb_core::{Activity, ActivityType, InputHint};
use serde_json::{Value, json};
use tracing::warn;

use crate::card::is_card;
use crate::types::{AlexaResponse, AlexaResponseEnvelope, OutputSpeech};

pub const RESPONSE_VERSION: &str = "1.0";

/// Folds the replies of a turn into the single response Alexa accepts.
pub fn build_response(activities: &[Activity], end_session_by_default: bool) -> AlexaResponseEnvelope {
    let mut speech = SpeechParts::default();
    let mut card = None;
    let mut reprompt = None;
    let mut directives = Vec::new();
    let mut ended = false;
    let mut last_hint = None;

    for activity in activities {
        match activity.activity_type {
            ActivityType::Message => {}
            ActivityType::EndOfConversation => {
                ended = true;
                continue;
            }
            ref other => {
                warn!(activity_type = %other, "alexa cannot express activity type, skipping");
                continue;
            }
        }

        speech.push(activity);
        if activity.input_hint.is_some() {
            last_hint = activity.input_hint;
        }
        if let Some(passthrough) = activity.channel_data_field("card") {
            card = Some(passthrough.clone());
        }
        if let Some(content) = activity
            .attachments
            .iter()
            .rev()
            .find(|attachment| is_card(&attachment.content_type))
            .and_then(|attachment| attachment.content.clone())
        {
            card = Some(content);
        }
        if let Some(value) = activity.channel_data_field("reprompt") {
            reprompt = Some(reprompt_value(value));
        }
        match activity.channel_data_field("directives") {
            Some(Value::Array(items)) => directives.extend(items.iter().cloned()),
            Some(other) => directives.push(other.clone()),
            None => {}
        }
    }

    let should_end_session = ended
        || match last_hint {
            Some(InputHint::IgnoringInput) => true,
            Some(InputHint::ExpectingInput) | Some(InputHint::AcceptingInput) => false,
            None => end_session_by_default,
        };

    AlexaResponseEnvelope {
        version: RESPONSE_VERSION.to_string(),
        session_attributes: None,
        response: AlexaResponse {
            output_speech: speech.finish(),
            card,
            reprompt,
            should_end_session,
            directives,
        },
    }
}

#[derive(Default)]
struct SpeechParts {
    parts: Vec<SpeechPart>,
}

enum SpeechPart {
    Text(String),
    Ssml(String),
}

impl SpeechParts {
    fn push(&mut self, activity: &Activity) {
        if let Some(ssml) = activity.speak.as_deref().filter(|s| !s.trim().is_empty()) {
            self.parts.push(SpeechPart::Ssml(strip_speak(ssml).to_string()));
        } else if let Some(text) = activity.text.as_deref().filter(|t| !t.trim().is_empty()) {
            self.parts.push(SpeechPart::Text(text.to_string()));
        }
    }

    fn finish(self) -> Option<OutputSpeech> {
        if self.parts.is_empty() {
            return None;
        }
        let ssml = self
            .parts
            .iter()
            .any(|part| matches!(part, SpeechPart::Ssml(_)));
        if !ssml {
            let text = self
                .parts
                .into_iter()
                .filter_map(|part| match part {
                    SpeechPart::Text(text) => Some(text),
                    SpeechPart::Ssml(_) => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            return Some(OutputSpeech::PlainText { text });
        }
        let body = self
            .parts
            .into_iter()
            .map(|part| match part {
                SpeechPart::Text(text) => escape_xml(&text),
                SpeechPart::Ssml(ssml) => ssml,
            })
            .collect::<Vec<_>>()
            .join(" ");
        Some(OutputSpeech::Ssml {
            ssml: format!("<speak>{body}</speak>"),
        })
    }
}

fn reprompt_value(value: &Value) -> Value {
    match value {
        Value::String(text) => {
            let speech = speech_for(text);
            json!({ "outputSpeech": speech })
        }
        other => other.clone(),
    }
}

fn speech_for(text: &str) -> OutputSpeech {
    let trimmed = text.trim();
    if trimmed.starts_with("<speak>") {
        OutputSpeech::Ssml {
            ssml: trimmed.to_string(),
        }
    } else {
        OutputSpeech::PlainText {
            text: trimmed.to_string(),
        }
    }
}

fn strip_speak(ssml: &str) -> &str {
    let trimmed = ssml.trim();
    trimmed
        .strip_prefix("<speak>")
        .and_then(|inner| inner.strip_suffix("</speak>"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
