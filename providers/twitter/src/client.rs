use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::TwitterError;
use crate::types::{DirectMessage, TweetReply};

/// Twitter endpoints used to answer users.
#[async_trait]
pub trait TwitterClient: Send + Sync {
    /// Sends a direct message and returns the event id.
    async fn send_direct_message(&self, message: &DirectMessage) -> Result<String, TwitterError>;
    /// Posts a status and returns its id.
    async fn post_reply(&self, reply: &TweetReply) -> Result<String, TwitterError>;
}

/// `message_create` event body for the direct message endpoint.
pub fn direct_message_event(message: &DirectMessage) -> Value {
    let mut message_data = json!({ "text": message.text });
    if !message.quick_replies.is_empty() {
        message_data["quick_reply"] = json!({
            "type": "options",
            "options": message.quick_replies,
        });
    }
    json!({
        "event": {
            "type": "message_create",
            "message_create": {
                "target": {"recipient_id": message.recipient_id},
                "message_data": message_data,
            }
        }
    })
}

pub struct TwitterRestClient {
    http: reqwest::Client,
    api_base: String,
    bearer_token: String,
}

impl TwitterRestClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    async fn read(response: reqwest::Response) -> Result<Value, TwitterError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TwitterClient for TwitterRestClient {
    async fn send_direct_message(&self, message: &DirectMessage) -> Result<String, TwitterError> {
        let response = self
            .http
            .post(format!("{}/1.1/direct_messages/events/new.json", self.api_base))
            .bearer_auth(&self.bearer_token)
            .json(&direct_message_event(message))
            .send()
            .await?;
        let body = Self::read(response).await?;
        body.pointer("/event/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TwitterError::Response("direct message response without event id".into()))
    }

    async fn post_reply(&self, reply: &TweetReply) -> Result<String, TwitterError> {
        let mut form = vec![("status", reply.status.as_str())];
        if let Some(id) = reply.in_reply_to_status_id.as_deref() {
            form.push(("in_reply_to_status_id", id));
        }
        let response = self
            .http
            .post(format!("{}/1.1/statuses/update.json", self.api_base))
            .bearer_auth(&self.bearer_token)
            .form(&form)
            .send()
            .await?;
        let body = Self::read(response).await?;
        body.get("id_str")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TwitterError::Response("status response without id_str".into()))
    }
}
