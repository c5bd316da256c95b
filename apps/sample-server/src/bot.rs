use std::sync::Arc;

use bb_core::{ActivityType, BotHandler, TurnContext, TurnError, TurnRunner, handler_fn};
use bb_nlp::{AzureTextAnalytics, Engine, NlpResults, SentimentMiddleware};
use futures::future::BoxFuture;
use tracing::info;

use crate::config::AzureSentiment;

pub const GREETING: &str = "Hello and welcome! Say anything and I will repeat it.";
pub const GOODBYE: &str = "Goodbye!";

pub fn echo_bot() -> Arc<dyn BotHandler> {
    Arc::new(handler_fn(echo_turn))
}

fn echo_turn(ctx: &mut TurnContext) -> BoxFuture<'_, Result<(), TurnError>> {
    Box::pin(on_turn(ctx))
}

async fn on_turn(ctx: &mut TurnContext) -> Result<(), TurnError> {
    match ctx.activity().activity_type {
        ActivityType::Message => {
            if let Some(sentiment) = ctx
                .state()
                .get::<NlpResults>()
                .and_then(|results| results.sentiment.as_ref())
            {
                info!(label = %sentiment.label, score = sentiment.score, "message sentiment");
            }
            let reply = format!("You said: {}", ctx.activity().text_or_empty());
            ctx.send_activity(reply).await?;
        }
        ActivityType::ConversationUpdate => {
            let bot_id = ctx.activity().recipient.id.clone();
            let newcomer = ctx
                .activity()
                .members_added
                .iter()
                .any(|member| member.id != bot_id);
            if newcomer {
                ctx.send_activity(GREETING).await?;
            }
        }
        ActivityType::EndOfConversation => {
            ctx.send_activity(GOODBYE).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Echo bot runner, with Azure sentiment in front of it when credentials are present.
pub fn build_runner(sentiment: Option<&AzureSentiment>, http: reqwest::Client) -> TurnRunner {
    let runner = TurnRunner::new(echo_bot());
    match sentiment {
        Some(azure) => {
            let engine = Engine::from(AzureTextAnalytics::new(
                http,
                azure.endpoint.clone(),
                azure.key.clone(),
            ));
            info!("sentiment analysis enabled");
            runner.with_middleware(SentimentMiddleware::new(engine.into_shared()))
        }
        None => runner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{Activity, ChannelAccount};
    use bb_testutil::RecordingAdapter;

    async fn run(activity: Activity) -> Vec<Activity> {
        let adapter = RecordingAdapter::new("test");
        build_runner(None, reqwest::Client::new())
            .run_turn(adapter.clone(), activity)
            .await
            .unwrap();
        adapter.sent()
    }

    #[tokio::test]
    async fn echoes_message_text() {
        let sent = run(Activity::message("ping")).await;
        assert_eq!(sent[0].text.as_deref(), Some("You said: ping"));
    }

    #[tokio::test]
    async fn greets_new_members_but_not_itself() {
        let mut update = Activity::new(ActivityType::ConversationUpdate);
        update.recipient = ChannelAccount::new("bot");
        update.members_added = vec![ChannelAccount::new("bot")];
        assert!(run(update.clone()).await.is_empty());

        update.members_added.push(ChannelAccount::new("user"));
        let sent = run(update).await;
        assert_eq!(sent[0].text.as_deref(), Some(GREETING));
    }

    #[tokio::test]
    async fn says_goodbye_at_end_of_conversation() {
        let sent = run(Activity::end_of_conversation()).await;
        assert_eq!(sent[0].text.as_deref(), Some(GOODBYE));
    }

    #[tokio::test]
    async fn ignores_typing() {
        assert!(run(Activity::new(ActivityType::Typing)).await.is_empty());
    }
}
