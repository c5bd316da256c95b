use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use bb_core::{BodyError, TurnError};
use bb_security::SignatureError;
use serde::Serialize;

use crate::verifier::VerificationError;

#[derive(Debug, thiserror::Error)]
pub enum AlexaError {
    #[error("invalid request body: {0}")]
    Body(#[from] BodyError),
    #[error("malformed alexa request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("application id not allowed")]
    ApplicationId,
    #[error("request timestamp rejected: {0}")]
    Timestamp(#[source] SignatureError),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("turn failed")]
    Turn(#[source] TurnError),
}

impl AlexaError {
    pub fn status(&self) -> StatusCode {
        match self {
            AlexaError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AlexaError::Body(_) | AlexaError::Malformed(_) => StatusCode::BAD_REQUEST,
            AlexaError::ApplicationId | AlexaError::Timestamp(_) | AlexaError::Verification(_) => {
                StatusCode::FORBIDDEN
            }
            AlexaError::Turn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AlexaError::Turn(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AlexaError {
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
