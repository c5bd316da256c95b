use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TwilioError;

/// Form posted to the Twilio Messages resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageForm {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<String>,
}

#[async_trait]
pub trait TwilioClient: Send + Sync {
    /// Creates a message and returns its sid.
    async fn create_message(&self, form: &MessageForm) -> Result<String, TwilioError>;
}

pub struct TwilioRestClient {
    http: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioRestClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[derive(Deserialize)]
struct CreatedMessage {
    sid: String,
}

#[derive(Deserialize, Default)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl TwilioClient for TwilioRestClient {
    async fn create_message(&self, form: &MessageForm) -> Result<String, TwilioError> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let api: ApiError = serde_json::from_str(&body).unwrap_or_default();
            return Err(TwilioError::Api {
                status: status.as_u16(),
                code: api.code,
                message: api.message.unwrap_or(body),
            });
        }
        let created: CreatedMessage = response.json().await?;
        debug!(sid = %created.sid, "twilio message created");
        Ok(created.sid)
    }
}
