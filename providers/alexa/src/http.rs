use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use bb_core::{DEFAULT_BODY_LIMIT, TurnRunner, decode_body};
use bb_telemetry::{Outcome, channel_span, record_inbound, record_outbound};
use time::OffsetDateTime;
use tracing::{Instrument, warn};

use crate::CHANNEL_ID;
use crate::adapter::AlexaTurnBuffer;
use crate::config::AlexaSettings;
use crate::error::AlexaError;
use crate::inbound::{to_activity, verify_envelope};
use crate::outbound::build_response;
use crate::types::{AlexaRequestEnvelope, AlexaResponseEnvelope};
use crate::verifier::{AcceptAll, RequestVerifier};

pub const ALEXA_PATH: &str = "/api/alexa";

#[derive(Clone)]
pub struct AlexaState {
    settings: Arc<AlexaSettings>,
    runner: TurnRunner,
    verifier: Arc<dyn RequestVerifier>,
}

impl AlexaState {
    pub fn new(settings: AlexaSettings, runner: TurnRunner) -> Self {
        Self {
            settings: Arc::new(settings),
            runner,
            verifier: Arc::new(AcceptAll),
        }
    }

    pub fn with_verifier(mut self, verifier: impl RequestVerifier + 'static) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }
}

pub fn router(state: AlexaState) -> Router {
    Router::new()
        .route(ALEXA_PATH, post(receive))
        .with_state(state)
}

async fn receive(
    State(state): State<AlexaState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AlexaResponseEnvelope>, AlexaError> {
    if let Err(err) = state.verifier.verify(&headers, &body).await {
        warn!(error = %err, "alexa request verification failed");
        return Err(err.into());
    }
    let raw = decode_body(Some("application/json"), &body, DEFAULT_BODY_LIMIT)?;
    let envelope: AlexaRequestEnvelope = serde_json::from_value(raw.clone())?;
    verify_envelope(&state.settings, &envelope, OffsetDateTime::now_utc())?;

    let activity = to_activity(&envelope, raw);
    record_inbound(CHANNEL_ID, activity.activity_type.as_str());
    let span = channel_span(CHANNEL_ID, &activity);

    let buffer = AlexaTurnBuffer::new(envelope.request.request_id.clone());
    state
        .runner
        .run_turn(buffer.clone(), activity)
        .instrument(span)
        .await
        .map_err(AlexaError::Turn)?;

    let replies = buffer.take();
    for _ in &replies {
        record_outbound(CHANNEL_ID, Outcome::Ok);
    }
    Ok(Json(build_response(
        &replies,
        state.settings.end_session_by_default,
    )))
}
