use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::debug;

use crate::types::NlpError;

/// Sends a JSON request and returns the decoded body, mapping non-2xx answers to
/// [`NlpError::Status`].
pub(crate) async fn send_json(
    engine: &'static str,
    request: RequestBuilder,
    body: &Value,
) -> Result<Value, NlpError> {
    let http = |source| NlpError::Http { engine, source };
    let response = request.json(body).send().await.map_err(http)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(engine, status = status.as_u16(), "nlp call rejected");
        return Err(NlpError::Status {
            engine,
            status: status.as_u16(),
            body,
        });
    }
    response.json().await.map_err(http)
}
