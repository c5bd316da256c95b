use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::error::TurnError;

/// Per-activity result of a send. Soft-failed sends carry an empty id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    #[serde(default)]
    pub id: String,
}

impl ResourceResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

/// Outbound half of a channel adapter.
///
/// Implementations send `activities` in order and stop at the first vendor error. Activity types
/// the channel cannot express are logged and answered with [`ResourceResponse::empty`] so the rest
/// of the batch still goes out.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn channel_id(&self) -> &str;

    async fn send_activities(
        &self,
        incoming: &Activity,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, TurnError>;

    async fn update_activity(
        &self,
        _incoming: &Activity,
        _activity: Activity,
    ) -> Result<ResourceResponse, TurnError> {
        Err(TurnError::NotSupported {
            channel: self.channel_id().to_string(),
            op: "update_activity",
        })
    }

    async fn delete_activity(
        &self,
        _incoming: &Activity,
        _activity_id: &str,
    ) -> Result<(), TurnError> {
        Err(TurnError::NotSupported {
            channel: self.channel_id().to_string(),
            op: "delete_activity",
        })
    }
}
