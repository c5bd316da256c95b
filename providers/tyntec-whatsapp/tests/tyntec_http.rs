use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bb_core::{Activity, ActivityType, TurnRunner};
use bb_provider_tyntec_whatsapp::{
    TYNTEC_WHATSAPP_PATH, TyntecClient, TyntecError, TyntecMessage, TyntecSettings, TyntecState,
    WEBHOOK_SECRET_HEADER, router,
};
use bb_testutil::RecordingBot;
use bb_testutil::http::{body_json, json_post, raw_post};
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Default)]
struct FakeTyntec {
    sent: Mutex<Vec<TyntecMessage>>,
}

#[async_trait]
impl TyntecClient for FakeTyntec {
    async fn send_message(&self, message: &TyntecMessage) -> Result<String, TyntecError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok("0b6e1d3f".into())
    }
}

fn inbound() -> Value {
    json!({
        "event": "MoMessage",
        "messageId": "in-1",
        "channel": "whatsapp",
        "from": "491672634678",
        "to": "4923147790813",
        "timestamp": "2024-05-01T10:00:00Z",
        "content": {"contentType": "text", "text": "hello"}
    })
}

fn app(settings: TyntecSettings, bot: Arc<RecordingBot>, client: Arc<FakeTyntec>) -> axum::Router {
    router(TyntecState::new(settings, TurnRunner::new(bot), client))
}

#[tokio::test]
async fn message_runs_turn_and_reply_goes_to_sender() {
    let bot = RecordingBot::replying(vec![Activity::message("<em>hi</em> back")]);
    let client = Arc::new(FakeTyntec::default());
    let response = app(TyntecSettings::new("key", "4923147790813"), bot.clone(), client.clone())
        .oneshot(json_post(TYNTEC_WHATSAPP_PATH, &inbound()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bot.received()[0].text.as_deref(), Some("hello"));
    let sent = client.sent.lock().unwrap();
    assert_eq!(
        serde_json::to_value(&sent[0]).unwrap(),
        json!({
            "from": "4923147790813",
            "to": "491672634678",
            "channel": "whatsapp",
            "content": {"contentType": "text", "text": "_hi_ back"}
        })
    );
}

#[tokio::test]
async fn shared_secret_is_enforced_when_configured() {
    let settings = TyntecSettings::new("key", "4923147790813").with_webhook_secret("s3cret");
    let bot = RecordingBot::new();

    let missing = app(settings.clone(), bot.clone(), Arc::default())
        .oneshot(json_post(TYNTEC_WHATSAPP_PATH, &inbound()))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert!(bot.received().is_empty());

    let request = Request::builder()
        .method("POST")
        .uri(TYNTEC_WHATSAPP_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .header(WEBHOOK_SECRET_HEADER, "s3cret")
        .body(Body::from(inbound().to_string()))
        .unwrap();
    let accepted = app(settings, bot.clone(), Arc::default())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(bot.received().len(), 1);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let response = app(TyntecSettings::new("key", "1"), RecordingBot::new(), Arc::default())
        .oneshot(raw_post(TYNTEC_WHATSAPP_PATH, "application/json", "{\"event\":"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_json(response)
            .await["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body")
    );
}

#[tokio::test]
async fn status_event_reaches_bot() {
    let bot = RecordingBot::new();
    let status = json!({
        "event": "MessageStatus::seen",
        "messageId": "0b6e1d3f",
        "channel": "whatsapp",
        "from": "491672634678",
        "timestamp": "2024-05-01T10:00:05Z"
    });
    let response = app(TyntecSettings::new("key", "1"), bot.clone(), Arc::default())
        .oneshot(json_post(TYNTEC_WHATSAPP_PATH, &status))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bot.received()[0].activity_type, ActivityType::MessageRead);
}
