use std::sync::Arc;

use async_trait::async_trait;
use bb_core::BoxError;
use serde_json::{Value, json};

use crate::analyzer::TextAnalyzer;
use crate::types::{DetectedLanguage, Entity, KeyPhrase, NlpError, Sentiment};

const ENGINE: &str = "comprehend";

/// The four Comprehend actions, answering the service's JSON response shapes
/// (`{"Entities": [...]}`, `{"KeyPhrases": [...]}`, `{"Languages": [...]}`,
/// `{"Sentiment": ..., "SentimentScore": {...}}`). Implement over the AWS SDK, which owns request
/// signing.
#[async_trait]
pub trait ComprehendApi: Send + Sync {
    async fn detect_entities(&self, text: &str, language_code: &str) -> Result<Value, BoxError>;
    async fn detect_key_phrases(&self, text: &str, language_code: &str)
    -> Result<Value, BoxError>;
    async fn detect_dominant_language(&self, text: &str) -> Result<Value, BoxError>;
    async fn detect_sentiment(&self, text: &str, language_code: &str) -> Result<Value, BoxError>;
}

pub struct AwsComprehend {
    api: Arc<dyn ComprehendApi>,
    language_code: String,
}

impl AwsComprehend {
    pub fn new(api: Arc<dyn ComprehendApi>) -> Self {
        Self {
            api,
            language_code: "en".into(),
        }
    }

    pub fn with_language_code(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }
}

fn client(source: BoxError) -> NlpError {
    NlpError::Client {
        engine: ENGINE,
        source,
    }
}

#[async_trait]
impl TextAnalyzer for AwsComprehend {
    fn engine_name(&self) -> &'static str {
        ENGINE
    }

    async fn entities(&self, text: &str) -> Result<Vec<Entity>, NlpError> {
        let response = self
            .api
            .detect_entities(text, &self.language_code)
            .await
            .map_err(client)?;
        parse_entities(&response)
    }

    async fn key_phrases(&self, text: &str) -> Result<Vec<KeyPhrase>, NlpError> {
        let response = self
            .api
            .detect_key_phrases(text, &self.language_code)
            .await
            .map_err(client)?;
        parse_key_phrases(&response)
    }

    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, NlpError> {
        let response = self
            .api
            .detect_dominant_language(text)
            .await
            .map_err(client)?;
        parse_dominant_language(&response)
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment, NlpError> {
        let response = self
            .api
            .detect_sentiment(text, &self.language_code)
            .await
            .map_err(client)?;
        parse_sentiment(&response)
    }
}

pub fn parse_entities(response: &Value) -> Result<Vec<Entity>, NlpError> {
    let entities = response
        .get("Entities")
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing Entities"))?;
    Ok(entities
        .iter()
        .filter_map(|entity| {
            Some(Entity {
                text: entity.get("Text")?.as_str()?.to_string(),
                kind: entity
                    .get("Type")
                    .and_then(Value::as_str)
                    .unwrap_or("OTHER")
                    .to_string(),
                score: entity.get("Score").and_then(Value::as_f64),
                metadata: json!({
                    "beginOffset": entity.get("BeginOffset"),
                    "endOffset": entity.get("EndOffset"),
                }),
            })
        })
        .collect())
}

pub fn parse_key_phrases(response: &Value) -> Result<Vec<KeyPhrase>, NlpError> {
    let phrases = response
        .get("KeyPhrases")
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing KeyPhrases"))?;
    Ok(phrases
        .iter()
        .filter_map(|phrase| {
            Some(KeyPhrase {
                text: phrase.get("Text")?.as_str()?.to_string(),
                score: phrase.get("Score").and_then(Value::as_f64),
            })
        })
        .collect())
}

/// Highest scoring language. Comprehend reports codes only, so `name` repeats the code.
pub fn parse_dominant_language(response: &Value) -> Result<DetectedLanguage, NlpError> {
    response
        .get("Languages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|language| {
            let code = language.get("LanguageCode")?.as_str()?;
            let score = language.get("Score")?.as_f64()?;
            Some(DetectedLanguage {
                name: code.to_string(),
                iso6391_name: code.to_string(),
                score,
            })
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| NlpError::parse(ENGINE, "no Languages detected"))
}

pub fn parse_sentiment(response: &Value) -> Result<Sentiment, NlpError> {
    let label = response
        .get("Sentiment")
        .and_then(Value::as_str)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing Sentiment"))?;
    let scores = response.get("SentimentScore");
    let score_of = |name: &str| scores.and_then(|s| s.get(name)).and_then(Value::as_f64);
    let positive = score_of("Positive");
    let negative = score_of("Negative");
    Ok(Sentiment {
        label: label.to_ascii_lowercase(),
        score: positive.unwrap_or_default() - negative.unwrap_or_default(),
        positive,
        negative,
        neutral: score_of("Neutral"),
        mixed: score_of("Mixed"),
    })
}
