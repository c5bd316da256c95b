use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::analyzer::TextAnalyzer;
use crate::http::send_json;
use crate::types::{Category, Concept, Emotion, Entity, KeyPhrase, NlpError, Sentiment};

const ENGINE: &str = "watson";
const API_VERSION: &str = "2022-04-07";

/// IBM Watson Natural Language Understanding.
pub struct WatsonNlu {
    http: Client,
    service_url: String,
    api_key: String,
}

impl WatsonNlu {
    /// `service_url` is the instance URL from the service credentials.
    pub fn new(http: Client, service_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            service_url: service_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn analyze(&self, text: &str, features: Value) -> Result<Value, NlpError> {
        let url = format!("{}/v1/analyze", self.service_url);
        let request = self
            .http
            .post(url)
            .query(&[("version", API_VERSION)])
            .basic_auth("apikey", Some(&self.api_key));
        send_json(ENGINE, request, &json!({ "text": text, "features": features })).await
    }
}

#[async_trait]
impl TextAnalyzer for WatsonNlu {
    fn engine_name(&self) -> &'static str {
        ENGINE
    }

    async fn entities(&self, text: &str) -> Result<Vec<Entity>, NlpError> {
        parse_entities(&self.analyze(text, json!({ "entities": {} })).await?)
    }

    async fn key_phrases(&self, text: &str) -> Result<Vec<KeyPhrase>, NlpError> {
        parse_keywords(&self.analyze(text, json!({ "keywords": {} })).await?)
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment, NlpError> {
        parse_sentiment(&self.analyze(text, json!({ "sentiment": {} })).await?)
    }

    async fn categories(&self, text: &str) -> Result<Vec<Category>, NlpError> {
        parse_categories(&self.analyze(text, json!({ "categories": {} })).await?)
    }

    async fn concepts(&self, text: &str) -> Result<Vec<Concept>, NlpError> {
        parse_concepts(&self.analyze(text, json!({ "concepts": {} })).await?)
    }

    async fn emotion(&self, text: &str) -> Result<Emotion, NlpError> {
        parse_emotion(&self.analyze(text, json!({ "emotion": {} })).await?)
    }
}

fn array<'a>(response: &'a Value, key: &str) -> Result<&'a Vec<Value>, NlpError> {
    response
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, format!("missing {key}")))
}

pub fn parse_entities(response: &Value) -> Result<Vec<Entity>, NlpError> {
    Ok(array(response, "entities")?
        .iter()
        .filter_map(|entity| {
            Some(Entity {
                text: entity.get("text")?.as_str()?.to_string(),
                kind: entity
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                score: entity.get("relevance").and_then(Value::as_f64),
                metadata: json!({
                    "count": entity.get("count"),
                    "confidence": entity.get("confidence"),
                }),
            })
        })
        .collect())
}

pub fn parse_keywords(response: &Value) -> Result<Vec<KeyPhrase>, NlpError> {
    Ok(array(response, "keywords")?
        .iter()
        .filter_map(|keyword| {
            Some(KeyPhrase {
                text: keyword.get("text")?.as_str()?.to_string(),
                score: keyword.get("relevance").and_then(Value::as_f64),
            })
        })
        .collect())
}

pub fn parse_sentiment(response: &Value) -> Result<Sentiment, NlpError> {
    let document = response
        .pointer("/sentiment/document")
        .ok_or_else(|| NlpError::parse(ENGINE, "missing sentiment.document"))?;
    Ok(Sentiment {
        label: document
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or("neutral")
            .to_string(),
        score: document
            .get("score")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
        positive: None,
        negative: None,
        neutral: None,
        mixed: None,
    })
}

pub fn parse_categories(response: &Value) -> Result<Vec<Category>, NlpError> {
    Ok(array(response, "categories")?
        .iter()
        .filter_map(|category| {
            Some(Category {
                label: category.get("label")?.as_str()?.to_string(),
                score: category.get("score")?.as_f64()?,
            })
        })
        .collect())
}

pub fn parse_concepts(response: &Value) -> Result<Vec<Concept>, NlpError> {
    Ok(array(response, "concepts")?
        .iter()
        .filter_map(|concept| {
            Some(Concept {
                text: concept.get("text")?.as_str()?.to_string(),
                relevance: concept.get("relevance")?.as_f64()?,
                dbpedia_resource: concept
                    .get("dbpedia_resource")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect())
}

pub fn parse_emotion(response: &Value) -> Result<Emotion, NlpError> {
    let scores = response
        .pointer("/emotion/document/emotion")
        .ok_or_else(|| NlpError::parse(ENGINE, "missing emotion.document"))?;
    let score = |name: &str| scores.get(name).and_then(Value::as_f64).unwrap_or_default();
    Ok(Emotion {
        anger: score("anger"),
        disgust: score("disgust"),
        fear: score("fear"),
        joy: score("joy"),
        sadness: score("sadness"),
    })
}
