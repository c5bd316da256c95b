//! Alexa skill endpoint.
//!
//! Alexa expects the reply in the HTTP response of the request that started the turn, so the
//! adapter buffers everything the bot sends and folds it into one response envelope once the turn
//! completes.

mod adapter;
mod card;
mod config;
mod error;
mod http;
mod inbound;
mod outbound;
mod types;
mod verifier;

pub const CHANNEL_ID: &str = "alexa";

pub use adapter::AlexaTurnBuffer;
pub use card::{
    AlexaCard, LINK_ACCOUNT_CARD_CONTENT_TYPE, SIMPLE_CARD_CONTENT_TYPE, STANDARD_CARD_CONTENT_TYPE,
};
pub use config::{AlexaSettings, DEFAULT_TIMESTAMP_TOLERANCE_SECS};
pub use error::AlexaError;
pub use http::{ALEXA_PATH, AlexaState, router};
pub use inbound::{PHRASE_SLOT, to_activity, verify_envelope};
pub use outbound::{RESPONSE_VERSION, build_response};
pub use types::*;
pub use verifier::{
    AcceptAll, CERT_CHAIN_URL_HEADER, CertChainUrlVerifier, RequestVerifier, SIGNATURE_HEADER,
    VerificationError, validate_cert_chain_url,
};
