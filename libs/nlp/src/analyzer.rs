use std::sync::Arc;

use async_trait::async_trait;

use crate::azure::AzureTextAnalytics;
use crate::comprehend::AwsComprehend;
use crate::google::GoogleLanguage;
use crate::types::{
    Category, Concept, DetectedLanguage, Emotion, Entity, KeyPhrase, NlpError, Sentiment,
};
use crate::watson::WatsonNlu;

/// Uniform surface over the text analytics vendors. Operations an engine lacks answer
/// [`NlpError::Unsupported`].
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    fn engine_name(&self) -> &'static str;

    async fn entities(&self, _text: &str) -> Result<Vec<Entity>, NlpError> {
        Err(self.unsupported("entities"))
    }

    async fn key_phrases(&self, _text: &str) -> Result<Vec<KeyPhrase>, NlpError> {
        Err(self.unsupported("key_phrases"))
    }

    async fn detect_language(&self, _text: &str) -> Result<DetectedLanguage, NlpError> {
        Err(self.unsupported("detect_language"))
    }

    async fn sentiment(&self, _text: &str) -> Result<Sentiment, NlpError> {
        Err(self.unsupported("sentiment"))
    }

    async fn categories(&self, _text: &str) -> Result<Vec<Category>, NlpError> {
        Err(self.unsupported("categories"))
    }

    async fn concepts(&self, _text: &str) -> Result<Vec<Concept>, NlpError> {
        Err(self.unsupported("concepts"))
    }

    async fn emotion(&self, _text: &str) -> Result<Emotion, NlpError> {
        Err(self.unsupported("emotion"))
    }

    fn unsupported(&self, op: &'static str) -> NlpError {
        NlpError::Unsupported {
            engine: self.engine_name(),
            op,
        }
    }
}

/// The engine a middleware talks to, picked once at construction.
pub enum Engine {
    Azure(AzureTextAnalytics),
    Google(GoogleLanguage),
    Watson(WatsonNlu),
    Comprehend(AwsComprehend),
}

impl Engine {
    fn inner(&self) -> &dyn TextAnalyzer {
        match self {
            Engine::Azure(engine) => engine,
            Engine::Google(engine) => engine,
            Engine::Watson(engine) => engine,
            Engine::Comprehend(engine) => engine,
        }
    }

    pub fn into_shared(self) -> Arc<dyn TextAnalyzer> {
        Arc::new(self)
    }
}

#[async_trait]
impl TextAnalyzer for Engine {
    fn engine_name(&self) -> &'static str {
        self.inner().engine_name()
    }

    async fn entities(&self, text: &str) -> Result<Vec<Entity>, NlpError> {
        self.inner().entities(text).await
    }

    async fn key_phrases(&self, text: &str) -> Result<Vec<KeyPhrase>, NlpError> {
        self.inner().key_phrases(text).await
    }

    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, NlpError> {
        self.inner().detect_language(text).await
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment, NlpError> {
        self.inner().sentiment(text).await
    }

    async fn categories(&self, text: &str) -> Result<Vec<Category>, NlpError> {
        self.inner().categories(text).await
    }

    async fn concepts(&self, text: &str) -> Result<Vec<Concept>, NlpError> {
        self.inner().concepts(text).await
    }

    async fn emotion(&self, text: &str) -> Result<Emotion, NlpError> {
        self.inner().emotion(text).await
    }
}

impl From<AzureTextAnalytics> for Engine {
    fn from(engine: AzureTextAnalytics) -> Self {
        Engine::Azure(engine)
    }
}

impl From<GoogleLanguage> for Engine {
    fn from(engine: GoogleLanguage) -> Self {
        Engine::Google(engine)
    }
}

impl From<WatsonNlu> for Engine {
    fn from(engine: WatsonNlu) -> Self {
        Engine::Watson(engine)
    }
}

impl From<AwsComprehend> for Engine {
    fn from(engine: AwsComprehend) -> Self {
        Engine::Comprehend(engine)
    }
}
