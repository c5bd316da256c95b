use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::analyzer::TextAnalyzer;
use crate::http::send_json;
use crate::types::{Category, Entity, NlpError, Sentiment};

const ENGINE: &str = "google";
const DEFAULT_API_BASE: &str = "https://language.googleapis.com/v1";
/// Polarity beyond which a document is labelled positive or negative.
const NEUTRAL_BAND: f64 = 0.25;

/// Google Cloud Natural Language v1, authenticated with an API key.
pub struct GoogleLanguage {
    http: Client,
    api_base: String,
    key: String,
}

impl GoogleLanguage {
    pub fn new(http: Client, key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.into(),
            key: key.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn call(&self, method: &str, text: &str) -> Result<Value, NlpError> {
        let url = format!("{}/documents:{method}", self.api_base);
        let request = self.http.post(url).query(&[("key", self.key.as_str())]);
        let body = json!({
            "document": { "type": "PLAIN_TEXT", "content": text },
            "encodingType": "UTF8",
        });
        send_json(ENGINE, request, &body).await
    }
}

#[async_trait]
impl TextAnalyzer for GoogleLanguage {
    fn engine_name(&self) -> &'static str {
        ENGINE
    }

    async fn entities(&self, text: &str) -> Result<Vec<Entity>, NlpError> {
        parse_entities(&self.call("analyzeEntities", text).await?)
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment, NlpError> {
        parse_sentiment(&self.call("analyzeSentiment", text).await?)
    }

    async fn categories(&self, text: &str) -> Result<Vec<Category>, NlpError> {
        parse_categories(&self.call("classifyText", text).await?)
    }
}

pub fn parse_entities(response: &Value) -> Result<Vec<Entity>, NlpError> {
    let entities = response
        .get("entities")
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing entities"))?;
    Ok(entities
        .iter()
        .filter_map(|entity| {
            Some(Entity {
                text: entity.get("name")?.as_str()?.to_string(),
                kind: entity
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("UNKNOWN")
                    .to_string(),
                score: entity.get("salience").and_then(Value::as_f64),
                metadata: entity.get("metadata").cloned().unwrap_or(Value::Null),
            })
        })
        .collect())
}

pub fn parse_sentiment(response: &Value) -> Result<Sentiment, NlpError> {
    let score = response
        .pointer("/documentSentiment/score")
        .and_then(Value::as_f64)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing documentSentiment"))?;
    let label = if score > NEUTRAL_BAND {
        "positive"
    } else if score < -NEUTRAL_BAND {
        "negative"
    } else {
        "neutral"
    };
    Ok(Sentiment {
        label: label.to_string(),
        score,
        positive: None,
        negative: None,
        neutral: None,
        mixed: None,
    })
}

pub fn parse_categories(response: &Value) -> Result<Vec<Category>, NlpError> {
    let categories = response
        .get("categories")
        .and_then(Value::as_array)
        .ok_or_else(|| NlpError::parse(ENGINE, "missing categories"))?;
    Ok(categories
        .iter()
        .filter_map(|category| {
            Some(Category {
                label: category.get("name")?.as_str()?.to_string(),
                score: category.get("confidence")?.as_f64()?,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_label_follows_score() {
        let positive = parse_sentiment(&json!({"documentSentiment": {"magnitude": 0.9, "score": 0.8}}))
            .unwrap();
        assert_eq!(positive.label, "positive");
        let neutral = parse_sentiment(&json!({"documentSentiment": {"score": 0.1}})).unwrap();
        assert_eq!(neutral.label, "neutral");
        let negative = parse_sentiment(&json!({"documentSentiment": {"score": -0.6}})).unwrap();
        assert_eq!(negative.label, "negative");
    }

    #[test]
    fn parses_entities_with_metadata() {
        let response = json!({
            "entities": [{
                "name": "Google",
                "type": "ORGANIZATION",
                "metadata": {"wikipedia_url": "https://en.wikipedia.org/wiki/Google"},
                "salience": 0.7
            }],
            "language": "en"
        });
        let entities = parse_entities(&response).unwrap();
        assert_eq!(entities[0].kind, "ORGANIZATION");
        assert_eq!(entities[0].score, Some(0.7));
        assert!(entities[0].metadata["wikipedia_url"].is_string());
    }

    #[test]
    fn parses_categories() {
        let response = json!({"categories": [{"name": "/Science/Computer Science", "confidence": 0.61}]});
        let categories = parse_categories(&response).unwrap();
        assert_eq!(categories[0].label, "/Science/Computer Science");
        assert!(parse_categories(&json!({})).is_err());
    }
}
