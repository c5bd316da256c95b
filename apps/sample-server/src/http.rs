use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use bb_core::TurnRunner;
use bb_provider_alexa::{AlexaState, CertChainUrlVerifier};
use bb_provider_twilio_whatsapp::TwilioState;
use bb_provider_twitter::TwitterState;
use bb_provider_tyntec_whatsapp::TyntecState;
use tracing::info;

use crate::config::Channels;

pub const HEALTHZ_PATH: &str = "/healthz";

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Health check plus one webhook router per configured channel.
pub fn build_router(channels: Channels, runner: TurnRunner, http: reqwest::Client) -> Router {
    let mut alexa = AlexaState::new(channels.alexa, runner.clone());
    if channels.alexa_cert_chain_check {
        alexa = alexa.with_verifier(CertChainUrlVerifier);
    }
    let mut router = Router::new()
        .route(HEALTHZ_PATH, get(healthz))
        .merge(bb_provider_alexa::router(alexa));
    info!(channel = bb_provider_alexa::CHANNEL_ID, path = bb_provider_alexa::ALEXA_PATH, "channel mounted");

    if let Some(settings) = channels.twilio {
        let state = TwilioState::with_rest_client(settings, runner.clone(), http.clone());
        router = router.merge(bb_provider_twilio_whatsapp::router(state));
        info!(
            channel = "twilio-whatsapp",
            path = bb_provider_twilio_whatsapp::TWILIO_WHATSAPP_PATH,
            "channel mounted"
        );
    }
    if let Some(settings) = channels.twitter {
        let state = TwitterState::with_rest_client(settings, runner.clone(), http.clone());
        router = router.merge(bb_provider_twitter::router(state));
        info!(
            channel = bb_provider_twitter::CHANNEL_ID,
            path = bb_provider_twitter::TWITTER_WEBHOOK_PATH,
            "channel mounted"
        );
    }
    if let Some(settings) = channels.tyntec {
        let state = TyntecState::with_rest_client(settings, runner, http);
        router = router.merge(bb_provider_tyntec_whatsapp::router(state));
        info!(
            channel = "tyntec-whatsapp",
            path = bb_provider_tyntec_whatsapp::TYNTEC_WHATSAPP_PATH,
            "channel mounted"
        );
    }
    router
}
