use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use bb_core::{BodyError, DEFAULT_BODY_LIMIT, TurnRunner, decode_form};
use bb_security::{TWILIO_SIGNATURE_HEADER, verify_twilio_signature};
use bb_telemetry::{channel_span, record_inbound};
use tracing::{Instrument, warn};

use crate::CHANNEL_ID;
use crate::adapter::TwilioAdapter;
use crate::client::{TwilioClient, TwilioRestClient};
use crate::config::TwilioSettings;
use crate::error::TwilioError;
use crate::inbound::to_activity;

pub const TWILIO_WHATSAPP_PATH: &str = "/api/whatsapp/messages";

#[derive(Clone)]
pub struct TwilioState {
    settings: Arc<TwilioSettings>,
    runner: TurnRunner,
    adapter: Arc<TwilioAdapter>,
}

impl TwilioState {
    pub fn new(settings: TwilioSettings, runner: TurnRunner, client: Arc<dyn TwilioClient>) -> Self {
        let settings = Arc::new(settings);
        let adapter = Arc::new(TwilioAdapter::new(settings.clone(), client));
        Self {
            settings,
            runner,
            adapter,
        }
    }

    /// State talking to the Twilio REST API.
    pub fn with_rest_client(settings: TwilioSettings, runner: TurnRunner, http: reqwest::Client) -> Self {
        let client = TwilioRestClient::new(
            http,
            settings.api_base.clone(),
            settings.account_sid.clone(),
            settings.auth_token.clone(),
        );
        Self::new(settings, runner, Arc::new(client))
    }

    pub fn adapter(&self) -> Arc<TwilioAdapter> {
        self.adapter.clone()
    }
}

pub fn router(state: TwilioState) -> Router {
    Router::new()
        .route(TWILIO_WHATSAPP_PATH, post(receive))
        .with_state(state)
}

async fn receive(
    State(state): State<TwilioState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, TwilioError> {
    if body.len() > DEFAULT_BODY_LIMIT {
        return Err(BodyError::TooLarge {
            limit: DEFAULT_BODY_LIMIT,
        }
        .into());
    }
    if body.is_empty() {
        return Err(BodyError::Empty.into());
    }
    let params = decode_form(&body);
    let signature = headers
        .get(TWILIO_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = verify_twilio_signature(
        &state.settings.auth_token,
        &state.settings.endpoint_url,
        &params,
        signature,
    ) {
        warn!(error = %err, "twilio signature check failed");
        return Err(err.into());
    }

    let activity = to_activity(&params);
    record_inbound(CHANNEL_ID, activity.activity_type.as_str());
    let span = channel_span(CHANNEL_ID, &activity);
    state
        .runner
        .run_turn(state.adapter.clone(), activity)
        .instrument(span)
        .await
        .map_err(TwilioError::Turn)?;
    Ok(StatusCode::OK)
}
