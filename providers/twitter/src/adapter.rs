use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{Activity, ActivityType, ChannelAdapter, ResourceResponse, TurnError};
use bb_telemetry::{Outcome, record_outbound};
use serde_json::Value;
use tracing::warn;

use crate::CHANNEL_ID;
use crate::client::TwitterClient;
use crate::types::{DirectMessage, QuickReplyOption, TweetReply};

pub const MAX_QUICK_REPLIES: usize = 20;
const MAX_QUICK_REPLY_LABEL: usize = 36;

/// True when the reply should be posted as a status rather than a direct message.
pub fn is_tweet_reply(activity: &Activity) -> bool {
    matches!(activity.channel_data_field("tweet"), Some(Value::Bool(true)))
        || activity.conversation.is_group == Some(true)
}

pub fn direct_message(activity: &Activity) -> DirectMessage {
    let recipient_id = if activity.conversation.id.is_empty() {
        activity.recipient.id.clone()
    } else {
        activity.conversation.id.clone()
    };
    let quick_replies = activity
        .suggested_actions
        .iter()
        .flat_map(|suggested| suggested.actions.iter())
        .take(MAX_QUICK_REPLIES)
        .map(|action| QuickReplyOption {
            label: action.title.chars().take(MAX_QUICK_REPLY_LABEL).collect(),
            metadata: action
                .value
                .as_ref()
                .and_then(Value::as_str)
                .filter(|value| *value != action.title)
                .map(str::to_string),
        })
        .collect();
    DirectMessage {
        recipient_id,
        text: activity.text_or_empty().to_string(),
        quick_replies,
    }
}

/// Status reply addressed to the author of the tweet that started the turn.
pub fn tweet_reply(incoming: &Activity, activity: &Activity) -> TweetReply {
    let author = incoming
        .channel_data
        .as_ref()
        .and_then(|tweet| tweet.pointer("/user/screen_name"))
        .and_then(Value::as_str);
    let text = activity.text_or_empty();
    let status = match author {
        Some(handle) if !text.starts_with(&format!("@{handle}")) => format!("@{handle} {text}"),
        _ => text.to_string(),
    };
    let in_reply_to_status_id = activity
        .reply_to_id
        .clone()
        .or_else(|| Some(activity.conversation.id.clone()))
        .filter(|id| !id.is_empty());
    TweetReply {
        status,
        in_reply_to_status_id,
    }
}

pub struct TwitterAdapter {
    client: Arc<dyn TwitterClient>,
}

impl TwitterAdapter {
    pub fn new(client: Arc<dyn TwitterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelAdapter for TwitterAdapter {
    fn channel_id(&self) -> &str {
        CHANNEL_ID
    }

    async fn send_activities(
        &self,
        incoming: &Activity,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, TurnError> {
        let mut responses = Vec::with_capacity(activities.len());
        for activity in &activities {
            if activity.activity_type != ActivityType::Message {
                warn!(activity_type = %activity.activity_type, "twitter cannot send activity type");
                record_outbound(CHANNEL_ID, Outcome::Skipped);
                responses.push(ResourceResponse::empty());
                continue;
            }
            if !activity.attachments.is_empty() {
                warn!(
                    count = activity.attachments.len(),
                    "twitter replies do not carry attachments, dropping them"
                );
            }
            let result = if is_tweet_reply(activity) {
                self.client.post_reply(&tweet_reply(incoming, activity)).await
            } else {
                self.client
                    .send_direct_message(&direct_message(activity))
                    .await
            };
            record_outbound(CHANNEL_ID, Outcome::of(&result));
            let id = result.map_err(|err| TurnError::send(CHANNEL_ID, err))?;
            responses.push(ResourceResponse::new(id));
        }
        Ok(responses)
    }
}
