use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use bb_core::{BodyError, TurnError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum TyntecError {
    #[error("missing setting {0}")]
    MissingSetting(&'static str),
    #[error("invalid request body: {0}")]
    Body(#[from] BodyError),
    #[error("tyntec api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("tyntec request failed")]
    Http(#[from] reqwest::Error),
    #[error("unexpected tyntec response: {0}")]
    Response(String),
    #[error("turn failed")]
    Turn(#[source] TurnError),
}

impl TyntecError {
    pub fn status(&self) -> StatusCode {
        match self {
            TyntecError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            TyntecError::Body(_) => StatusCode::BAD_REQUEST,
            TyntecError::Api { .. } | TyntecError::Http(_) | TyntecError::Response(_) => {
                StatusCode::BAD_GATEWAY
            }
            TyntecError::MissingSetting(_) | TyntecError::Turn(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            TyntecError::Api { .. } | TyntecError::Http(_) | TyntecError::Response(_) => {
                "downstream tyntec error".to_string()
            }
            TyntecError::MissingSetting(_) | TyntecError::Turn(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for TyntecError {
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
