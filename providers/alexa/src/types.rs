use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Request envelope posted by Alexa to the skill endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaRequestEnvelope {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub session: Option<AlexaSession>,
    #[serde(default)]
    pub context: Option<AlexaContext>,
    pub request: AlexaRequest,
}

impl AlexaRequestEnvelope {
    fn system(&self) -> Option<&AlexaSystem> {
        self.context.as_ref().map(|context| &context.system)
    }

    /// Application id from `context.System`, falling back to the session.
    pub fn application_id(&self) -> Option<&str> {
        self.system()
            .and_then(|system| system.application.as_ref())
            .or_else(|| {
                self.session
                    .as_ref()
                    .and_then(|session| session.application.as_ref())
            })
            .map(|app| app.application_id.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.system()
            .and_then(|system| system.user.as_ref())
            .or_else(|| self.session.as_ref().and_then(|session| session.user.as_ref()))
            .map(|user| user.user_id.as_str())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.session_id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn api_endpoint(&self) -> Option<&str> {
        self.system().and_then(|system| system.api_endpoint.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaSession {
    #[serde(rename = "new", default)]
    pub is_new: bool,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub application: Option<AlexaApplication>,
    #[serde(default)]
    pub user: Option<AlexaUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlexaContext {
    #[serde(rename = "System")]
    pub system: AlexaSystem,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaSystem {
    #[serde(default)]
    pub application: Option<AlexaApplication>,
    #[serde(default)]
    pub user: Option<AlexaUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaApplication {
    pub application_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaUser {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub intent: Option<AlexaIntent>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl AlexaRequest {
    /// Request time. Alexa sends ISO 8601 strings; numeric values are read as epoch milliseconds.
    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        match self.timestamp.as_ref()? {
            Value::String(raw) => OffsetDateTime::parse(raw, &Rfc3339).ok(),
            Value::Number(ms) => ms
                .as_i64()
                .and_then(|ms| OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000).ok()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaIntent {
    pub name: String,
    #[serde(default)]
    pub slots: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_status: Option<String>,
}

impl AlexaIntent {
    pub fn slot_value(&self, slot: &str) -> Option<&str> {
        self.slots
            .get(slot)
            .and_then(|slot| slot.get("value"))
            .and_then(Value::as_str)
    }
}

/// Response envelope returned in the HTTP body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaResponseEnvelope {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<Map<String, Value>>,
    pub response: AlexaResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Value>,
    pub should_end_session: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}
