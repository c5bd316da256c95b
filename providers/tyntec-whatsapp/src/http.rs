use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Router, middleware};
use bb_core::{BodyError, DEFAULT_BODY_LIMIT, TurnRunner, decode_body};
use bb_security::{SharedSecretConfig, require_shared_secret};
use bb_telemetry::{channel_span, record_inbound};
use tracing::Instrument;

use crate::CHANNEL_ID;
use crate::adapter::TyntecAdapter;
use crate::client::{TyntecClient, TyntecRestClient};
use crate::config::{TyntecSettings, WEBHOOK_SECRET_HEADER};
use crate::error::TyntecError;
use crate::inbound::{TyntecEvent, to_activity};

pub const TYNTEC_WHATSAPP_PATH: &str = "/api/tyntec/whatsapp";

#[derive(Clone)]
pub struct TyntecState {
    settings: Arc<TyntecSettings>,
    runner: TurnRunner,
    adapter: Arc<TyntecAdapter>,
}

impl TyntecState {
    pub fn new(settings: TyntecSettings, runner: TurnRunner, client: Arc<dyn TyntecClient>) -> Self {
        let adapter = Arc::new(TyntecAdapter::new(settings.whatsapp_number.clone(), client));
        Self {
            settings: Arc::new(settings),
            runner,
            adapter,
        }
    }

    pub fn with_rest_client(settings: TyntecSettings, runner: TurnRunner, http: reqwest::Client) -> Self {
        let client = TyntecRestClient::new(http, settings.api_base.clone(), settings.api_key.clone());
        Self::new(settings, runner, Arc::new(client))
    }

    pub fn adapter(&self) -> Arc<TyntecAdapter> {
        self.adapter.clone()
    }
}

pub fn router(state: TyntecState) -> Router {
    let secret = SharedSecretConfig::new(WEBHOOK_SECRET_HEADER, state.settings.webhook_secret.clone());
    Router::new()
        .route(TYNTEC_WHATSAPP_PATH, post(receive))
        .with_state(state)
        .layer(middleware::from_fn(require_shared_secret))
        .layer(Extension(secret))
}

async fn receive(State(state): State<TyntecState>, body: Bytes) -> Result<StatusCode, TyntecError> {
    let raw = decode_body(Some("application/json"), &body, DEFAULT_BODY_LIMIT)?;
    let event: TyntecEvent =
        serde_json::from_value(raw.clone()).map_err(|err| TyntecError::Body(BodyError::Json(err)))?;

    let activity = to_activity(&event, raw);
    record_inbound(CHANNEL_ID, activity.activity_type.as_str());
    let span = channel_span(CHANNEL_ID, &activity);
    state
        .runner
        .run_turn(state.adapter.clone(), activity)
        .instrument(span)
        .await
        .map_err(TyntecError::Turn)?;
    Ok(StatusCode::OK)
}
