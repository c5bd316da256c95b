//! Text analytics for botbridge turns.
//!
//! An engine ([`AzureTextAnalytics`], [`GoogleLanguage`], [`WatsonNlu`], [`AwsComprehend`])
//! implements [`TextAnalyzer`]; the middleware aliases ([`SentimentMiddleware`] and friends) run
//! one operation per message turn and leave the typed result in the [`NlpResults`] turn state slot.
//!
//! ```no_run
//! use bb_nlp::{AzureTextAnalytics, Engine, NlpResults, SentimentMiddleware};
//!
//! let engine = Engine::from(AzureTextAnalytics::new(
//!     reqwest::Client::new(),
//!     "https://example.cognitiveservices.azure.com",
//!     "key",
//! ));
//! let middleware = SentimentMiddleware::new(engine.into_shared());
//! # let _ = middleware;
//! // later, in the bot: ctx.state().get::<NlpResults>()
//! ```

mod analyzer;
mod azure;
mod comprehend;
mod google;
mod http;
mod middleware;
mod types;
mod watson;

pub use analyzer::{Engine, TextAnalyzer};
pub use azure::AzureTextAnalytics;
pub use comprehend::{AwsComprehend, ComprehendApi};
pub use google::GoogleLanguage;
pub use middleware::{
    AnalysisMiddleware, AnalysisOp, CategoriesMiddleware, ConceptsMiddleware, EmotionMiddleware,
    EntitiesMiddleware, KeyPhrasesMiddleware, LanguageDetectionMiddleware, SentimentMiddleware,
    ops,
};
pub use types::{
    Category, Concept, DetectedLanguage, Emotion, Entity, KeyPhrase, NlpError, NlpResults,
    Sentiment,
};
pub use watson::WatsonNlu;

/// Pure response parsers, one module per vendor.
pub mod parse {
    pub mod azure {
        pub use crate::azure::{
            first_document, parse_entities, parse_key_phrases, parse_language, parse_sentiment,
        };
    }
    pub mod google {
        pub use crate::google::{parse_categories, parse_entities, parse_sentiment};
    }
    pub mod watson {
        pub use crate::watson::{
            parse_categories, parse_concepts, parse_emotion, parse_entities, parse_keywords,
            parse_sentiment,
        };
    }
    pub mod comprehend {
        pub use crate::comprehend::{
            parse_dominant_language, parse_entities, parse_key_phrases, parse_sentiment,
        };
    }
}
