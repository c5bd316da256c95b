use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::activity::Activity;
use crate::adapter::{ChannelAdapter, ResourceResponse};
use crate::error::TurnError;

/// Typed per-turn scratch space.
///
/// Each slot is keyed by its Rust type, so middleware hands results to the bot through a named
/// struct instead of string keys.
///
/// ```
/// use bb_core::TurnState;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Lang(String);
///
/// let mut state = TurnState::default();
/// state.insert(Lang("en".into()));
/// assert_eq!(state.get::<Lang>(), Some(&Lang("en".into())));
/// assert!(state.remove::<Lang>().is_some());
/// assert!(!state.contains::<Lang>());
/// ```
#[derive(Default)]
pub struct TurnState {
    slots: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl TurnState {
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    /// Returns the slot for `T`, inserting `T::default()` first when absent.
    pub fn get_or_default<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        let slot = self
            .slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("turn state slot keyed by TypeId holds a different type"),
        }
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast::<T>().ok())
            .map(|slot| *slot)
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }
}

/// Everything one turn needs: the inbound activity, the adapter to answer through and state.
pub struct TurnContext {
    activity: Activity,
    adapter: Arc<dyn ChannelAdapter>,
    state: TurnState,
    responded: bool,
    responses: Vec<ResourceResponse>,
}

impl TurnContext {
    pub fn new(adapter: Arc<dyn ChannelAdapter>, activity: Activity) -> Self {
        Self {
            activity,
            adapter,
            state: TurnState::default(),
            responded: false,
            responses: Vec::new(),
        }
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn adapter(&self) -> &Arc<dyn ChannelAdapter> {
        &self.adapter
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TurnState {
        &mut self.state
    }

    /// True once anything was sent during this turn.
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Responses collected from every send made during this turn, in send order.
    pub fn responses(&self) -> &[ResourceResponse] {
        &self.responses
    }

    pub async fn send_activity(
        &mut self,
        activity: impl Into<Activity>,
    ) -> Result<ResourceResponse, TurnError> {
        let mut responses = self.send_activities(vec![activity.into()]).await?;
        Ok(responses.pop().unwrap_or_default())
    }

    pub async fn send_activities(
        &mut self,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, TurnError> {
        if activities.is_empty() {
            return Ok(Vec::new());
        }
        let reference = self.activity.conversation_reference();
        let prepared: Vec<Activity> = activities
            .into_iter()
            .map(|mut activity| {
                activity.apply_conversation_reference(&reference);
                activity
            })
            .collect();
        debug!(
            channel = %self.activity.channel_id,
            count = prepared.len(),
            "sending activities"
        );
        let responses = self
            .adapter
            .send_activities(&self.activity, prepared)
            .await?;
        self.responded = true;
        self.responses.extend(responses.iter().cloned());
        Ok(responses)
    }

    pub async fn update_activity(
        &mut self,
        activity: Activity,
    ) -> Result<ResourceResponse, TurnError> {
        self.adapter.update_activity(&self.activity, activity).await
    }

    pub async fn delete_activity(&mut self, activity_id: &str) -> Result<(), TurnError> {
        self.adapter.delete_activity(&self.activity, activity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ChannelAccount, ConversationAccount};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        sent: Mutex<Vec<Activity>>,
    }

    #[async_trait]
    impl ChannelAdapter for Capture {
        fn channel_id(&self) -> &str {
            "test"
        }

        async fn send_activities(
            &self,
            _incoming: &Activity,
            activities: Vec<Activity>,
        ) -> Result<Vec<ResourceResponse>, TurnError> {
            let mut sent = self.sent.lock().unwrap();
            let responses = activities
                .iter()
                .enumerate()
                .map(|(idx, _)| ResourceResponse::new(format!("r{}", sent.len() + idx)))
                .collect();
            sent.extend(activities);
            Ok(responses)
        }
    }

    fn inbound() -> Activity {
        Activity {
            id: Some("in-1".into()),
            channel_id: "test".into(),
            conversation: ConversationAccount::new("conv"),
            from: ChannelAccount::new("user"),
            recipient: ChannelAccount::new("bot"),
            ..Activity::message("hi")
        }
    }

    #[tokio::test]
    async fn send_activity_routes_reply_to_sender() {
        let adapter = Arc::new(Capture::default());
        let mut ctx = TurnContext::new(adapter.clone(), inbound());
        assert!(!ctx.responded());

        let response = ctx.send_activity("hello").await.unwrap();
        assert_eq!(response.id, "r0");
        assert!(ctx.responded());

        let sent = adapter.sent.lock().unwrap();
        assert_eq!(sent[0].recipient.id, "user");
        assert_eq!(sent[0].from.id, "bot");
        assert_eq!(sent[0].conversation.id, "conv");
        assert_eq!(sent[0].reply_to_id.as_deref(), Some("in-1"));
    }

    #[tokio::test]
    async fn empty_batch_does_not_mark_responded() {
        let adapter = Arc::new(Capture::default());
        let mut ctx = TurnContext::new(adapter, inbound());
        assert!(ctx.send_activities(Vec::new()).await.unwrap().is_empty());
        assert!(!ctx.responded());
    }

    #[tokio::test]
    async fn update_is_not_supported_by_default() {
        let mut ctx = TurnContext::new(Arc::new(Capture::default()), inbound());
        let err = ctx.update_activity(Activity::message("x")).await.unwrap_err();
        assert!(matches!(err, TurnError::NotSupported { op: "update_activity", .. }));
    }

    #[test]
    fn get_or_default_inserts_once() {
        let mut state = TurnState::default();
        state.get_or_default::<Vec<u8>>().push(1);
        state.get_or_default::<Vec<u8>>().push(2);
        assert_eq!(state.get::<Vec<u8>>(), Some(&vec![1, 2]));
    }
}
