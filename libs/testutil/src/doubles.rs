use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bb_core::{Activity, BotHandler, ChannelAdapter, ResourceResponse, TurnContext, TurnError};

/// Adapter that keeps every outbound activity instead of delivering it.
pub struct RecordingAdapter {
    channel: String,
    sent: Mutex<Vec<Activity>>,
    fail_with: Option<String>,
}

impl RecordingAdapter {
    pub fn new(channel: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            channel: channel.into(),
            sent: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    /// Adapter whose sends fail with the given vendor message.
    pub fn failing(channel: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            channel: channel.into(),
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        })
    }

    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChannelAdapter for RecordingAdapter {
    fn channel_id(&self) -> &str {
        &self.channel
    }

    async fn send_activities(
        &self,
        _incoming: &Activity,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, TurnError> {
        if let Some(message) = &self.fail_with {
            return Err(TurnError::send(self.channel.clone(), message.clone()));
        }
        let mut sent = self.sent.lock().map_err(|_| {
            TurnError::send(self.channel.clone(), "recording adapter lock poisoned")
        })?;
        let start = sent.len();
        let responses = (0..activities.len())
            .map(|offset| ResourceResponse::new(format!("sent-{}", start + offset)))
            .collect();
        sent.extend(activities);
        Ok(responses)
    }
}

/// Bot that records each inbound activity and sends a fixed set of replies.
#[derive(Default)]
pub struct RecordingBot {
    received: Mutex<Vec<Activity>>,
    replies: Vec<Activity>,
}

impl RecordingBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replying(replies: Vec<Activity>) -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            replies,
        })
    }

    pub fn received(&self) -> Vec<Activity> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BotHandler for RecordingBot {
    async fn on_turn(&self, ctx: &mut TurnContext) -> Result<(), TurnError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(ctx.activity().clone());
        }
        if !self.replies.is_empty() {
            ctx.send_activities(self.replies.clone()).await?;
        }
        Ok(())
    }
}
