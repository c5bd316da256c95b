use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use bb_core::{BodyError, DEFAULT_BODY_LIMIT, TurnRunner, decode_body};
use bb_security::{TWITTER_SIGNATURE_HEADER, twitter_crc_response, verify_twitter_signature};
use bb_telemetry::{channel_span, record_inbound};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, warn};

use crate::CHANNEL_ID;
use crate::adapter::TwitterAdapter;
use crate::client::{TwitterClient, TwitterRestClient};
use crate::config::TwitterSettings;
use crate::error::TwitterError;
use crate::inbound::to_activities;
use crate::types::AccountActivity;

pub const TWITTER_WEBHOOK_PATH: &str = "/api/twitter/webhook";

#[derive(Clone)]
pub struct TwitterState {
    settings: Arc<TwitterSettings>,
    runner: TurnRunner,
    adapter: Arc<TwitterAdapter>,
}

impl TwitterState {
    pub fn new(settings: TwitterSettings, runner: TurnRunner, client: Arc<dyn TwitterClient>) -> Self {
        Self {
            settings: Arc::new(settings),
            runner,
            adapter: Arc::new(TwitterAdapter::new(client)),
        }
    }

    pub fn with_rest_client(settings: TwitterSettings, runner: TurnRunner, http: reqwest::Client) -> Self {
        let client = TwitterRestClient::new(
            http,
            settings.api_base.clone(),
            settings.bearer_token.clone(),
        );
        Self::new(settings, runner, Arc::new(client))
    }

    pub fn adapter(&self) -> Arc<TwitterAdapter> {
        self.adapter.clone()
    }
}

pub fn router(state: TwitterState) -> Router {
    Router::new()
        .route(TWITTER_WEBHOOK_PATH, get(crc).post(receive))
        .with_state(state)
}

#[derive(Deserialize)]
struct CrcQuery {
    crc_token: Option<String>,
}

#[derive(Serialize)]
struct CrcResponse {
    response_token: String,
}

async fn crc(
    State(state): State<TwitterState>,
    Query(query): Query<CrcQuery>,
) -> Result<Json<CrcResponse>, TwitterError> {
    let token = query
        .crc_token
        .filter(|token| !token.is_empty())
        .ok_or(TwitterError::MissingCrcToken)?;
    debug!("answering twitter crc challenge");
    Ok(Json(CrcResponse {
        response_token: twitter_crc_response(&state.settings.consumer_secret, &token),
    }))
}

async fn receive(
    State(state): State<TwitterState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, TwitterError> {
    if state.settings.verify_signature {
        let signature = headers
            .get(TWITTER_SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        if let Err(err) = verify_twitter_signature(&state.settings.consumer_secret, &body, signature) {
            warn!(error = %err, "twitter webhook signature check failed");
            return Err(err.into());
        }
    }
    let raw = decode_body(Some("application/json"), &body, DEFAULT_BODY_LIMIT)?;
    let payload: AccountActivity =
        serde_json::from_value(raw).map_err(|err| TwitterError::Body(BodyError::Json(err)))?;

    for activity in to_activities(&state.settings, &payload) {
        record_inbound(CHANNEL_ID, activity.activity_type.as_str());
        let span = channel_span(CHANNEL_ID, &activity);
        state
            .runner
            .run_turn(state.adapter.clone(), activity)
            .instrument(span)
            .await
            .map_err(TwitterError::Turn)?;
    }
    Ok(StatusCode::OK)
}
