use std::sync::Arc;

use async_trait::async_trait;
use bb_core::markup::html_to_whatsapp;
use bb_core::{Activity, ActivityType, ChannelAdapter, ResourceResponse, TurnError};
use bb_telemetry::{Outcome, record_outbound};
use tracing::warn;

use crate::CHANNEL_ID;
use crate::address::whatsapp_address;
use crate::client::{MessageForm, TwilioClient};
use crate::config::TwilioSettings;

/// Builds the Twilio form for an outgoing message activity.
///
/// Twilio WhatsApp carries a single media item per message; further attachments are dropped.
pub fn message_form(settings: &TwilioSettings, activity: &Activity) -> Option<MessageForm> {
    let to = if activity.conversation.id.is_empty() {
        activity.recipient.id.as_str()
    } else {
        activity.conversation.id.as_str()
    };
    let body = activity
        .text
        .as_deref()
        .map(html_to_whatsapp)
        .filter(|text| !text.is_empty());

    let mut media = activity
        .attachments
        .iter()
        .filter_map(|attachment| attachment.content_url.clone());
    let media_url = media.next();
    let dropped = media.count();
    if dropped > 0 {
        warn!(dropped, "twilio whatsapp sends one media item per message, dropping the rest");
    }

    if body.is_none() && media_url.is_none() {
        return None;
    }
    Some(MessageForm {
        from: whatsapp_address(&settings.whatsapp_number),
        to: whatsapp_address(to),
        body,
        media_url,
        status_callback: settings.status_callback.clone(),
    })
}

pub struct TwilioAdapter {
    settings: Arc<TwilioSettings>,
    client: Arc<dyn TwilioClient>,
}

impl TwilioAdapter {
    pub fn new(settings: Arc<TwilioSettings>, client: Arc<dyn TwilioClient>) -> Self {
        Self { settings, client }
    }
}

#[async_trait]
impl ChannelAdapter for TwilioAdapter {
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
            if activity.activity_type != ActivityType::Message {
                warn!(activity_type = %activity.activity_type, "twilio whatsapp cannot send activity type");
                record_outbound(CHANNEL_ID, Outcome::Skipped);
                responses.push(ResourceResponse::empty());
                continue;
            }
            let Some(form) = message_form(&self.settings, activity) else {
                warn!("message has neither text nor media, skipping");
                record_outbound(CHANNEL_ID, Outcome::Skipped);
                responses.push(ResourceResponse::empty());
                continue;
            };
            let result = self.client.create_message(&form).await;
            record_outbound(CHANNEL_ID, Outcome::of(&result));
            let sid = result.map_err(|err| TurnError::send(CHANNEL_ID, err))?;
            responses.push(ResourceResponse::new(sid));
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TwilioError;
    use bb_core::{Attachment, ConversationAccount};
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct FakeTwilio {
        forms: Mutex<Vec<MessageForm>>,
        fail: bool,
    }

    #[async_trait]
    impl TwilioClient for FakeTwilio {
        async fn create_message(&self, form: &MessageForm) -> Result<String, TwilioError> {
            if self.fail {
                return Err(TwilioError::Api {
                    status: 400,
                    code: Some(21211),
                    message: "invalid To".into(),
                });
            }
            let mut forms = self.forms.lock().unwrap();
            forms.push(form.clone());
            Ok(format!("SM{}", forms.len()))
        }
    }

    fn settings() -> Arc<TwilioSettings> {
        Arc::new(TwilioSettings::new(
            "AC1",
            "token",
            "+14155238886",
            "https://bot.example.com/api/whatsapp/messages",
        ))
    }

    fn reply(text: &str) -> Activity {
        Activity {
            conversation: ConversationAccount::new("whatsapp:+15550001"),
            ..Activity::message(text)
        }
    }

    #[test]
    fn text_only_body_is_formatted_text() {
        let form = message_form(&settings(), &reply("<b>bold</b> move")).unwrap();
        assert_eq!(form.from, "whatsapp:+14155238886");
        assert_eq!(form.to, "whatsapp:+15550001");
        assert_eq!(form.body.as_deref(), Some("*bold* move"));
        assert!(form.media_url.is_none());
    }

    #[traced_test]
    #[test]
    fn only_first_media_is_sent() {
        let activity = reply("pics")
            .with_attachment(Attachment::media("image/png", "https://m/1.png"))
            .with_attachment(Attachment::media("image/png", "https://m/2.png"));
        let form = message_form(&settings(), &activity).unwrap();
        assert_eq!(form.media_url.as_deref(), Some("https://m/1.png"));
        assert!(logs_contain("dropping the rest"));
    }

    #[tokio::test]
    async fn sends_messages_and_skips_other_types() {
        let client = Arc::new(FakeTwilio::default());
        let adapter = TwilioAdapter::new(settings(), client.clone());
        let responses = adapter
            .send_activities(
                &Activity::message("in"),
                vec![reply("one"), Activity::new(ActivityType::Typing), reply("two")],
            )
            .await
            .unwrap();

        let ids: Vec<&str> = responses.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["SM1", "", "SM2"]);
        assert_eq!(client.forms.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn vendor_failure_aborts_batch() {
        let client = Arc::new(FakeTwilio {
            fail: true,
            ..Default::default()
        });
        let adapter = TwilioAdapter::new(settings(), client);
        let err = adapter
            .send_activities(&Activity::message("in"), vec![reply("one"), reply("two")])
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Send { .. }));
    }
}
