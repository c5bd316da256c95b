use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bb_core::{Activity, ChannelAdapter, ResourceResponse, TurnError};
use tracing::debug;

use crate::CHANNEL_ID;

/// Collects the replies of one turn; Alexa receives them in the HTTP response.
pub struct AlexaTurnBuffer {
    request_id: String,
    activities: Mutex<Vec<Activity>>,
}

impl AlexaTurnBuffer {
    pub fn new(request_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            request_id: request_id.into(),
            activities: Mutex::new(Vec::new()),
        })
    }

    /// Drains the buffered activities.
    pub fn take(&self) -> Vec<Activity> {
        self.activities
            .lock()
            .map(|mut activities| std::mem::take(&mut *activities))
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChannelAdapter for AlexaTurnBuffer {
    fn channel_id(&self) -> &str {
        CHANNEL_ID
    }

    async fn send_activities(
        &self,
        _incoming: &Activity,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, TurnError> {
        let mut buffered = self
            .activities
            .lock()
            .map_err(|_| TurnError::send(CHANNEL_ID, "alexa reply buffer poisoned"))?;
        let start = buffered.len();
        let responses = (0..activities.len())
            .map(|offset| ResourceResponse::new(format!("{}-{}", self.request_id, start + offset)))
            .collect();
        debug!(request_id = %self.request_id, count = activities.len(), "buffering alexa replies");
        buffered.extend(activities);
        Ok(responses)
    }
}
