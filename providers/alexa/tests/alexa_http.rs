use std::sync::Arc;

use axum::http::StatusCode;
use bb_core::{Activity, ActivityType, InputHint, TurnRunner};
use bb_provider_alexa::{AlexaCard, AlexaSettings, AlexaState, CertChainUrlVerifier, router};
use bb_testutil::RecordingBot;
use bb_testutil::http::{body_json, json_post, raw_post};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tower::ServiceExt;

fn request(request: Value) -> Value {
    json!({
        "version": "1.0",
        "session": {
            "new": true,
            "sessionId": "amzn1.echo-api.session.abc",
            "application": {"applicationId": "amzn1.ask.skill.demo"},
            "user": {"userId": "amzn1.ask.account.user"}
        },
        "context": {
            "System": {
                "application": {"applicationId": "amzn1.ask.skill.demo"},
                "user": {"userId": "amzn1.ask.account.user"},
                "apiEndpoint": "https://api.amazonalexa.com"
            }
        },
        "request": request
    })
}

fn now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap()
}

fn app(bot: Arc<RecordingBot>, settings: AlexaSettings) -> axum::Router {
    router(AlexaState::new(settings, TurnRunner::new(bot)))
}

#[tokio::test]
async fn intent_request_reaches_bot_and_reply_is_spoken() {
    let bot = RecordingBot::replying(vec![
        Activity::message("Hello there")
            .with_input_hint(InputHint::ExpectingInput)
            .with_attachment(AlexaCard::simple("Greeting", "Hello there")),
    ]);
    let body = request(json!({
        "type": "IntentRequest",
        "requestId": "amzn1.echo-api.request.1",
        "timestamp": now(),
        "locale": "en-GB",
        "intent": {"name": "myIntent", "slots": {}}
    }));

    let response = app(bot.clone(), AlexaSettings::default().with_skill_id("amzn1.ask.skill.demo"))
        .oneshot(json_post("/api/alexa", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["version"], "1.0");
    assert_eq!(
        json["response"]["outputSpeech"],
        json!({"type": "PlainText", "text": "Hello there"})
    );
    assert_eq!(json["response"]["card"]["type"], "Simple");
    assert_eq!(json["response"]["shouldEndSession"], false);

    let received = bot.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].activity_type, ActivityType::Message);
    assert_eq!(received[0].text.as_deref(), Some("myIntent"));
    assert_eq!(received[0].locale.as_deref(), Some("en-GB"));
}

#[tokio::test]
async fn session_ended_request_maps_to_end_of_conversation() {
    let bot = RecordingBot::new();
    let body = request(json!({
        "type": "SessionEndedRequest",
        "requestId": "amzn1.echo-api.request.2",
        "timestamp": now(),
        "reason": "USER_INITIATED"
    }));

    let response = app(bot.clone(), AlexaSettings::default())
        .oneshot(json_post("/api/alexa", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"version": "1.0", "response": {"shouldEndSession": true}})
    );
    assert_eq!(bot.received()[0].activity_type, ActivityType::EndOfConversation);
}

#[tokio::test]
async fn wrong_skill_is_forbidden() {
    let bot = RecordingBot::new();
    let body = request(json!({
        "type": "LaunchRequest",
        "requestId": "r",
        "timestamp": now()
    }));

    let response = app(bot.clone(), AlexaSettings::default().with_skill_id("amzn1.ask.skill.other"))
        .oneshot(json_post("/api/alexa", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "application id not allowed");
    assert!(bot.received().is_empty());
}

#[tokio::test]
async fn stale_timestamp_is_forbidden() {
    let body = request(json!({
        "type": "LaunchRequest",
        "requestId": "r",
        "timestamp": "2019-01-01T00:00:00Z"
    }));
    let response = app(RecordingBot::new(), AlexaSettings::default())
        .oneshot(json_post("/api/alexa", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let response = app(RecordingBot::new(), AlexaSettings::default())
        .oneshot(raw_post("/api/alexa", "application/json", "{\"version\": 1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing_request = json!({"version": "1.0"});
    let response = app(RecordingBot::new(), AlexaSettings::default())
        .oneshot(json_post("/api/alexa", &missing_request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verifier_runs_before_parsing() {
    let state = AlexaState::new(
        AlexaSettings::default(),
        TurnRunner::new(RecordingBot::new()),
    )
    .with_verifier(CertChainUrlVerifier);
    let body = request(json!({"type": "LaunchRequest", "requestId": "r", "timestamp": now()}));

    let response = router(state)
        .oneshot(json_post("/api/alexa", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
