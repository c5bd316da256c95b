use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use bb_nlp::{AzureTextAnalytics, Engine, GoogleLanguage, NlpError, TextAnalyzer, WatsonNlu};
use serde_json::{Value, json};
use std::collections::HashMap;

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(String, Value)>>>);

impl Seen {
    fn push(&self, what: impl Into<String>, body: Value) {
        self.0.lock().unwrap().push((what.into(), body));
    }

    fn all(&self) -> Vec<(String, Value)> {
        self.0.lock().unwrap().clone()
    }
}

async fn azure_sentiment(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let key = headers
        .get("ocp-apim-subscription-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.push(format!("azure key={key}"), body);
    Ok(Json(json!({
        "documents": [{
            "id": "1",
            "sentiment": "negative",
            "confidenceScores": {"positive": 0.1, "neutral": 0.2, "negative": 0.7}
        }],
        "errors": []
    })))
}

async fn google_classify(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    seen.push(
        format!("google key={}", query.get("key").cloned().unwrap_or_default()),
        body,
    );
    Json(json!({"categories": [{"name": "/Travel", "confidence": 0.9}]}))
}

async fn watson_analyze(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.push(
        format!(
            "watson version={} auth={auth}",
            query.get("version").cloned().unwrap_or_default()
        ),
        body,
    );
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({"error": "rate limited", "code": 429})),
    )
}

async fn start() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/text/analytics/v3.0/sentiment", post(azure_sentiment))
        .route("/v1/documents:classifyText", post(google_classify))
        .route("/v1/analyze", post(watson_analyze))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn azure_sends_single_document_with_subscription_key() {
    let (base, seen) = start().await;
    let engine = Engine::from(AzureTextAnalytics::new(reqwest::Client::new(), &base, "az-key"));

    let sentiment = engine.sentiment("this is awful").await.unwrap();
    assert_eq!(sentiment.label, "negative");
    assert!(sentiment.score < 0.0);

    let calls = seen.all();
    assert_eq!(calls[0].0, "azure key=az-key");
    assert_eq!(
        calls[0].1,
        json!({"documents": [{"id": "1", "language": "en", "text": "this is awful"}]})
    );
}

#[tokio::test]
async fn google_passes_api_key_as_query_parameter() {
    let (base, seen) = start().await;
    let engine = GoogleLanguage::new(reqwest::Client::new(), "g-key")
        .with_api_base(format!("{base}/v1"));

    let categories = engine.categories("cheap flights to Lisbon").await.unwrap();
    assert_eq!(categories[0].label, "/Travel");

    let calls = seen.all();
    assert_eq!(calls[0].0, "google key=g-key");
    assert_eq!(calls[0].1["document"]["type"], "PLAIN_TEXT");
    assert_eq!(calls[0].1["document"]["content"], "cheap flights to Lisbon");
}

#[tokio::test]
async fn watson_status_errors_carry_the_body() {
    let (base, seen) = start().await;
    let engine = WatsonNlu::new(reqwest::Client::new(), &base, "w-key");

    let err = engine.emotion("hello").await.unwrap_err();
    match err {
        NlpError::Status { engine, status, body } => {
            assert_eq!(engine, "watson");
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("unexpected error {other:?}"),
    }

    let calls = seen.all();
    // base64("apikey:w-key")
    assert_eq!(
        calls[0].0,
        "watson version=2022-04-07 auth=Basic YXBpa2V5Oncta2V5"
    );
    assert_eq!(calls[0].1["features"], json!({"emotion": {}}));
}

#[tokio::test]
async fn google_does_not_offer_key_phrases() {
    let engine = GoogleLanguage::new(reqwest::Client::new(), "k");
    assert!(matches!(
        engine.key_phrases("x").await,
        Err(NlpError::Unsupported { engine: "google", op: "key_phrases" })
    ));
}
