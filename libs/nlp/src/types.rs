use bb_core::BoxError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    /// Vendor entity type, e.g. `Person`, `LOCATION`.
    pub kind: String,
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPhrase {
    pub text: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    pub name: String,
    pub iso6391_name: String,
    pub score: f64,
}

/// Document sentiment.
///
/// `score` is the overall polarity in `[-1, 1]`; the per-class confidences are filled when the
/// engine reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f64,
    pub positive: Option<f64>,
    pub negative: Option<f64>,
    pub neutral: Option<f64>,
    pub mixed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub text: String,
    pub relevance: f64,
    pub dbpedia_resource: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub anger: f64,
    pub disgust: f64,
    pub fear: f64,
    pub joy: f64,
    pub sadness: f64,
}

/// Turn state slot filled by the analysis middleware.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NlpResults {
    pub entities: Option<Vec<Entity>>,
    pub key_phrases: Option<Vec<KeyPhrase>>,
    pub language: Option<DetectedLanguage>,
    pub sentiment: Option<Sentiment>,
    pub categories: Option<Vec<Category>>,
    pub concepts: Option<Vec<Concept>>,
    pub emotion: Option<Emotion>,
}

#[derive(Debug, thiserror::Error)]
pub enum NlpError {
    #[error("{engine} does not support {op}")]
    Unsupported {
        engine: &'static str,
        op: &'static str,
    },
    #[error("{engine} request failed")]
    Http {
        engine: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{engine} answered status {status}: {body}")]
    Status {
        engine: &'static str,
        status: u16,
        body: String,
    },
    #[error("{engine} returned an unexpected payload: {message}")]
    Parse {
        engine: &'static str,
        message: String,
    },
    #[error("{engine} client failed")]
    Client {
        engine: &'static str,
        #[source]
        source: BoxError,
    },
}

impl NlpError {
    pub(crate) fn parse(engine: &'static str, message: impl Into<String>) -> Self {
        NlpError::Parse {
            engine,
            message: message.into(),
        }
    }
}
