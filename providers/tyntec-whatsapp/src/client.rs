use async_trait::async_trait;
use serde::Deserialize;

use crate::error::TyntecError;
use crate::outbound::TyntecMessage;

#[async_trait]
pub trait TyntecClient: Send + Sync {
    /// Submits a message and returns its `messageId`.
    async fn send_message(&self, message: &TyntecMessage) -> Result<String, TyntecError>;
}

pub struct TyntecRestClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl TyntecRestClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/conversations/v3/messages", self.api_base)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accepted {
    message_id: String,
}

#[async_trait]
impl TyntecClient for TyntecRestClient {
    async fn send_message(&self, message: &TyntecMessage) -> Result<String, TyntecError> {
        let response = self
            .http
            .post(self.messages_url())
            .header("apikey", &self.api_key)
            .json(message)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TyntecError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let accepted: Accepted = response
            .json()
            .await
            .map_err(|err| TyntecError::Response(err.to_string()))?;
        Ok(accepted.message_id)
    }
}
