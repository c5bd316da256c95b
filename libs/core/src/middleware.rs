use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{Instrument, error, info_span};

use crate::activity::Activity;
use crate::adapter::ChannelAdapter;
use crate::error::TurnError;
use crate::turn::TurnContext;

/// Bot logic invoked once the middleware chain has run.
#[async_trait]
pub trait BotHandler: Send + Sync {
    async fn on_turn(&self, ctx: &mut TurnContext) -> Result<(), TurnError>;
}

/// Adapts a closure returning a boxed future into a [`BotHandler`].
pub struct HandlerFn<F>(F);

/// ```
/// use bb_core::{handler_fn, TurnContext};
///
/// let handler = handler_fn(|ctx: &mut TurnContext| {
///     Box::pin(async move {
///         let text = ctx.activity().text_or_empty().to_string();
///         ctx.send_activity(format!("echo: {text}")).await?;
///         Ok::<(), bb_core::TurnError>(())
///     })
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, Result<(), TurnError>> + Send + Sync,
{
    HandlerFn(f)
}

#[async_trait]
impl<F> BotHandler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, Result<(), TurnError>> + Send + Sync,
{
    async fn on_turn(&self, ctx: &mut TurnContext) -> Result<(), TurnError> {
        (self.0)(ctx).await
    }
}

/// A pipeline stage. Call `next.run(ctx)` to continue; returning without it ends the turn.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> Result<(), TurnError>;
}

/// Continuation over the remaining middleware and the bot handler.
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    handler: &'a dyn BotHandler,
}

impl<'a> Next<'a> {
    pub async fn run(self, ctx: &mut TurnContext) -> Result<(), TurnError> {
        match self.middleware.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    middleware: rest,
                    handler: self.handler,
                };
                head.on_turn(ctx, next).await
            }
            None => self.handler.on_turn(ctx).await,
        }
    }
}

/// Ordered middleware, run in registration order before the handler.
#[derive(Clone, Default)]
pub struct MiddlewareSet {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    pub async fn run(
        &self,
        ctx: &mut TurnContext,
        handler: &dyn BotHandler,
    ) -> Result<(), TurnError> {
        Next {
            middleware: &self.middleware,
            handler,
        }
        .run(ctx)
        .await
    }
}

/// Hook invoked when a turn fails. Returning `Ok` marks the error as handled.
#[async_trait]
pub trait OnTurnError: Send + Sync {
    async fn on_turn_error(&self, ctx: &mut TurnContext, error: &TurnError)
    -> Result<(), TurnError>;
}

/// Runs turns for adapters: builds the context, runs middleware and handler, applies the error
/// hook.
#[derive(Clone)]
pub struct TurnRunner {
    middleware: MiddlewareSet,
    handler: Arc<dyn BotHandler>,
    on_error: Option<Arc<dyn OnTurnError>>,
}

impl TurnRunner {
    pub fn new(handler: Arc<dyn BotHandler>) -> Self {
        Self {
            middleware: MiddlewareSet::new(),
            handler,
            on_error: None,
        }
    }

    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn with_error_handler(mut self, on_error: impl OnTurnError + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    pub fn middleware(&self) -> &MiddlewareSet {
        &self.middleware
    }

    pub async fn run_turn(
        &self,
        adapter: Arc<dyn ChannelAdapter>,
        activity: Activity,
    ) -> Result<TurnContext, TurnError> {
        let span = info_span!(
            "turn",
            channel = %activity.channel_id,
            activity_type = %activity.activity_type,
            activity_id = activity.id.as_deref().unwrap_or_default(),
            conversation_id = %activity.conversation.id,
        );
        let mut ctx = TurnContext::new(adapter, activity);
        let outcome = self
            .middleware
            .run(&mut ctx, self.handler.as_ref())
            .instrument(span.clone())
            .await;
        match outcome {
            Ok(()) => Ok(ctx),
            Err(err) => {
                error!(parent: &span, error = %err, "turn failed");
                match &self.on_error {
                    Some(hook) => {
                        hook.on_turn_error(&mut ctx, &err).await?;
                        Ok(ctx)
                    }
                    None => Err(err),
                }
            }
        }
    }
}
