use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{Middleware, Next, TurnContext, TurnError};
use bb_telemetry::{Outcome, record_nlp_call};
use futures::future::BoxFuture;
use tracing::debug;

use crate::analyzer::TextAnalyzer;
use crate::types::{
    Category, Concept, DetectedLanguage, Emotion, Entity, KeyPhrase, NlpError, NlpResults,
};

/// One analyzer operation and the [`NlpResults`] field it fills.
pub trait AnalysisOp: Send + Sync + 'static {
    const NAME: &'static str;
    type Output: Send;

    fn call<'a>(
        analyzer: &'a dyn TextAnalyzer,
        text: &'a str,
    ) -> BoxFuture<'a, Result<Self::Output, NlpError>>;

    fn store(results: &mut NlpResults, output: Self::Output);
}

pub mod ops {
    use super::*;

    pub struct Entities;
    pub struct KeyPhrases;
    pub struct LanguageDetection;
    pub struct Sentiment;
    pub struct Categories;
    pub struct Concepts;
    pub struct Emotions;

    impl AnalysisOp for Entities {
        const NAME: &'static str = "entities";
        type Output = Vec<Entity>;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.entities(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.entities = Some(output);
        }
    }

    impl AnalysisOp for KeyPhrases {
        const NAME: &'static str = "key_phrases";
        type Output = Vec<KeyPhrase>;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.key_phrases(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.key_phrases = Some(output);
        }
    }

    impl AnalysisOp for LanguageDetection {
        const NAME: &'static str = "detect_language";
        type Output = DetectedLanguage;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.detect_language(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.language = Some(output);
        }
    }

    impl AnalysisOp for Sentiment {
        const NAME: &'static str = "sentiment";
        type Output = crate::types::Sentiment;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.sentiment(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.sentiment = Some(output);
        }
    }

    impl AnalysisOp for Categories {
        const NAME: &'static str = "categories";
        type Output = Vec<Category>;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.categories(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.categories = Some(output);
        }
    }

    impl AnalysisOp for Concepts {
        const NAME: &'static str = "concepts";
        type Output = Vec<Concept>;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.concepts(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.concepts = Some(output);
        }
    }

    impl AnalysisOp for Emotions {
        const NAME: &'static str = "emotion";
        type Output = Emotion;

        fn call<'a>(
            analyzer: &'a dyn TextAnalyzer,
            text: &'a str,
        ) -> BoxFuture<'a, Result<Self::Output, NlpError>> {
            analyzer.emotion(text)
        }

        fn store(results: &mut NlpResults, output: Self::Output) {
            results.emotion = Some(output);
        }
    }
}

/// Runs one analyzer operation on message text and stores the result in the turn's
/// [`NlpResults`] slot before continuing the chain.
///
/// Non-message activities and blank text pass straight through. A vendor failure ends the turn
/// with [`TurnError::Middleware`].
pub struct AnalysisMiddleware<Op> {
    analyzer: Arc<dyn TextAnalyzer>,
    _op: PhantomData<fn() -> Op>,
}

impl<Op: AnalysisOp> AnalysisMiddleware<Op> {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self {
            analyzer,
            _op: PhantomData,
        }
    }
}

pub type EntitiesMiddleware = AnalysisMiddleware<ops::Entities>;
pub type KeyPhrasesMiddleware = AnalysisMiddleware<ops::KeyPhrases>;
pub type LanguageDetectionMiddleware = AnalysisMiddleware<ops::LanguageDetection>;
pub type SentimentMiddleware = AnalysisMiddleware<ops::Sentiment>;
pub type CategoriesMiddleware = AnalysisMiddleware<ops::Categories>;
pub type ConceptsMiddleware = AnalysisMiddleware<ops::Concepts>;
pub type EmotionMiddleware = AnalysisMiddleware<ops::Emotions>;

#[async_trait]
impl<Op: AnalysisOp> Middleware for AnalysisMiddleware<Op> {
    fn name(&self) -> &'static str {
        Op::NAME
    }

    async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> Result<(), TurnError> {
        let engine = self.analyzer.engine_name();
        let activity = ctx.activity();
        let text = activity
            .text
            .clone()
            .filter(|text| activity.is_message() && !text.trim().is_empty());
        let Some(text) = text else {
            record_nlp_call(engine, Op::NAME, Outcome::Skipped);
            return next.run(ctx).await;
        };

        let result = Op::call(self.analyzer.as_ref(), &text).await;
        record_nlp_call(engine, Op::NAME, Outcome::of(&result));
        let output = result.map_err(|err| TurnError::middleware(Op::NAME, err))?;
        debug!(engine, op = Op::NAME, "stored analysis result");
        Op::store(ctx.state_mut().get_or_default::<NlpResults>(), output);
        next.run(ctx).await
    }
}
