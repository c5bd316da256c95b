use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::analyzer::TextAnalyzer;
use crate::http::send_json;
use crate::types::{DetectedLanguage, Entity, KeyPhrase, NlpError, Sentiment};

const ENGINE: &str = "azure";

/// Azure Cognitive Services Text Analytics v3.0.
pub struct AzureTextAnalytics {
    http: Client,
    endpoint: String,
    key: String,
    language: String,
}

impl AzureTextAnalytics {
    /// `endpoint` is the resource endpoint, e.g. `https://res.cognitiveservices.azure.com`.
    pub fn new(http: Client, endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
            language: "en".into(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    async fn call(&self, path: &str, document: Value) -> Result<Value, NlpError> {
        let url = format!("{}/text/analytics/v3.0/{path}", self.endpoint);
        let request = self
            .http
            .post(url)
            .header("Ocp-Apim-Subscription-Key", &self.key);
        let response = send_json(ENGINE, request, &json!({ "documents": [document] })).await?;
        first_document(&response).cloned()
    }

    fn document(&self, text: &str) -> Value {
        json!({ "id": "1", "language": self.language, "text": text })
    }
}

#[async_trait]
impl TextAnalyzer for AzureTextAnalytics {
    fn engine_name(&self) -> &'static str {
        ENGINE
    }

    async fn entities(&self, text: &str) -> Result<Vec<Entity>, NlpError> {
        let doc = self
            .call("entities/recognition/general", self.document(text))
            .await?;
        parse_entities(&doc)
    }

    async fn key_phrases(&self, text: &str) -> Result<Vec<KeyPhrase>, NlpError> {
        let doc = self.call("keyPhrases", self.document(text)).await?;
        parse_key_phrases(&doc)
    }

    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, NlpError> {
        let doc = self
            .call("languages", json!({ "id": "1", "text": text }))
            .await?;
        parse_language(&doc)
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment, NlpError> {
        let doc = self.call("sentiment", self.document(text)).await?;
        parse_sentiment(&doc)
    }
}

/// Picks the single document out of a batch response, surfacing per-document errors.
pub fn first_document(response: &Value) -> Result<&Value, NlpError> {
    if let Some(error) = response
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let message = error
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("document error");
        return Err(NlpError::parse(ENGINE, message));
    }
    response
        .get("documents")
        .and_then(Value::as_array)
        .and_then(|docs| docs.first())
        .ok_or_else(|| NlpError::parse(ENGINE, "no documents in response"))
}

pub fn parse_entities(doc: &Value) -> Result<Vec<Entity>, NlpError> {
    let entities = doc
        .get("entities")
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing entities"))?;
    Ok(entities
        .iter()
        .filter_map(|entity| {
            Some(Entity {
                text: entity.get("text")?.as_str()?.to_string(),
                kind: entity
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                score: entity.get("confidenceScore").and_then(Value::as_f64),
                metadata: json!({
                    "subcategory": entity.get("subcategory"),
                    "offset": entity.get("offset"),
                    "length": entity.get("length"),
                }),
            })
        })
        .collect())
}

pub fn parse_key_phrases(doc: &Value) -> Result<Vec<KeyPhrase>, NlpError> {
    let phrases = doc
        .get("keyPhrases")
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing keyPhrases"))?;
    Ok(phrases
        .iter()
        .filter_map(Value::as_str)
        .map(|text| KeyPhrase {
            text: text.to_string(),
            score: None,
        })
        .collect())
}

pub fn parse_language(doc: &Value) -> Result<DetectedLanguage, NlpError> {
    let detected = doc
        .get("detectedLanguage")
        .ok_or_else(|| NlpError::parse(ENGINE, "missing detectedLanguage"))?;
    Ok(DetectedLanguage {
        name: str_field(detected, "name"),
        iso6391_name: str_field(detected, "iso6391Name"),
        score: detected
            .get("confidenceScore")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
    })
}

pub fn parse_sentiment(doc: &Value) -> Result<Sentiment, NlpError> {
    let label = doc
        .get("sentiment")
        .and_then(Value::as_str)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing sentiment"))?;
    let scores = doc.get("confidenceScores");
    let score_of = |name: &str| scores.and_then(|s| s.get(name)).and_then(Value::as_f64);
    let positive = score_of("positive");
    let negative = score_of("negative");
    Ok(Sentiment {
        label: label.to_string(),
        score: positive.unwrap_or_default() - negative.unwrap_or_default(),
        positive,
        negative,
        neutral: score_of("neutral"),
        mixed: None,
    })
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
