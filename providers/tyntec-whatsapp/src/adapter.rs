use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{Activity, ActivityType, ChannelAdapter, ResourceResponse, TurnError};
use bb_telemetry::{Outcome, record_outbound};
use tracing::warn;

use crate::CHANNEL_ID;
use crate::client::TyntecClient;
use crate::outbound::build_message;

pub struct TyntecAdapter {
    whatsapp_number: String,
    client: Arc<dyn TyntecClient>,
}

impl TyntecAdapter {
    pub fn new(whatsapp_number: impl Into<String>, client: Arc<dyn TyntecClient>) -> Self {
        Self {
            whatsapp_number: whatsapp_number.into(),
            client,
        }
    }
}

#[async_trait]
impl ChannelAdapter for TyntecAdapter {
    fn channel_id(&self) -> &str {
        CHANNEL_ID
    }

    async fn send_activities(
        &self,
        _incoming: &Activity,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, TurnError> {
        let mut responses = Vec::with_capacity(activities.len());
        for activity in &activities {
            let message = match activity.activity_type {
                ActivityType::Message => build_message(&self.whatsapp_number, activity),
                _ => None,
            };
            let Some(message) = message else {
                warn!(
                    activity_type = %activity.activity_type,
                    "nothing tyntec can send for activity, skipping"
                );
                record_outbound(CHANNEL_ID, Outcome::Skipped);
                responses.push(ResourceResponse::empty());
                continue;
            };
            let result = self.client.send_message(&message).await;
            record_outbound(CHANNEL_ID, Outcome::of(&result));
            let id = result.map_err(|err| TurnError::send(CHANNEL_ID, err))?;
            responses.push(ResourceResponse::new(id));
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TyntecError;
    use crate::outbound::TyntecMessage;
    use bb_core::ConversationAccount;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct FakeTyntec {
        sent: Mutex<Vec<TyntecMessage>>,
        status: Option<u16>,
    }

    #[async_trait]
    impl TyntecClient for FakeTyntec {
        async fn send_message(&self, message: &TyntecMessage) -> Result<String, TyntecError> {
            if let Some(status) = self.status {
                return Err(TyntecError::Api {
                    status,
                    message: "rejected".into(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.clone());
            Ok(format!("msg-{}", sent.len()))
        }
    }

    fn reply(text: &str) -> Activity {
        Activity {
            conversation: ConversationAccount::new("491672634678"),
            ..Activity::message(text)
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn skips_unsupported_activities_softly() {
        let client = Arc::new(FakeTyntec::default());
        let adapter = TyntecAdapter::new("4923147790813", client.clone());
        let responses = adapter
            .send_activities(
                &Activity::message("in"),
                vec![Activity::new(ActivityType::Typing), reply("hi")],
            )
            .await
            .unwrap();

        assert!(responses[0].is_empty());
        assert_eq!(responses[1].id, "msg-1");
        assert!(logs_contain("nothing tyntec can send"));
        assert_eq!(client.sent.lock().unwrap()[0].from, "4923147790813");
    }

    #[tokio::test]
    async fn vendor_error_aborts_batch() {
        let client = Arc::new(FakeTyntec {
            status: Some(422),
            ..Default::default()
        });
        let adapter = TyntecAdapter::new("1", client);
        let err = adapter
            .send_activities(&Activity::message("in"), vec![reply("a"), reply("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Send { .. }));
    }
}
