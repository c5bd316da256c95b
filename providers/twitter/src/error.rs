use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use bb_core::{BodyError, TurnError};
use bb_security::SignatureError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum TwitterError {
    #[error("missing setting {0}")]
    MissingSetting(&'static str),
    #[error("crc_token query parameter missing")]
    MissingCrcToken,
    #[error("invalid request body: {0}")]
    Body(#[from] BodyError),
    #[error("webhook signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("twitter api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("twitter request failed")]
    Http(#[from] reqwest::Error),
    #[error("unexpected twitter response: {0}")]
    Response(String),
    #[error("turn failed")]
    Turn(#[source] TurnError),
}

impl TwitterError {
    pub fn status(&self) -> StatusCode {
        match self {
            TwitterError::MissingCrcToken => StatusCode::BAD_REQUEST,
            TwitterError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            TwitterError::Body(_) => StatusCode::BAD_REQUEST,
            TwitterError::Signature(_) => StatusCode::UNAUTHORIZED,
            TwitterError::Api { .. } | TwitterError::Http(_) | TwitterError::Response(_) => {
                StatusCode::BAD_GATEWAY
            }
            TwitterError::MissingSetting(_) | TwitterError::Turn(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            TwitterError::Api { .. } | TwitterError::Http(_) | TwitterError::Response(_) => {
                "downstream twitter error".to_string()
            }
            TwitterError::MissingSetting(_) | TwitterError::Turn(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for TwitterError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.message(),
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}
