use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use bb_core::{BodyError, TurnError};
use bb_security::SignatureError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("missing setting {0}")]
    MissingSetting(&'static str),
    #[error("invalid request body: {0}")]
    Body(#[from] BodyError),
    #[error("twilio signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("twilio api returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("twilio request failed")]
    Http(#[from] reqwest::Error),
    #[error("turn failed")]
    Turn(#[source] TurnError),
}

impl TwilioError {
    pub fn status(&self) -> StatusCode {
        match self {
            TwilioError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            TwilioError::Body(_) => StatusCode::BAD_REQUEST,
            TwilioError::Signature(_) => StatusCode::UNAUTHORIZED,
            TwilioError::Api { .. } | TwilioError::Http(_) => StatusCode::BAD_GATEWAY,
            TwilioError::MissingSetting(_) | TwilioError::Turn(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            TwilioError::Api { .. } | TwilioError::Http(_) => "downstream twilio error".to_string(),
            TwilioError::MissingSetting(_) | TwilioError::Turn(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for TwilioError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses() {
        assert_eq!(
            TwilioError::Signature(SignatureError::Mismatch).status(),
            StatusCode::UNAUTHORIZED
        );
        let api = TwilioError::Api {
            status: 400,
            code: Some(63016),
            message: "outside window".into(),
        };
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(api.message(), "downstream twilio error");
    }
}
