//! Recognizers that pull typed values out of user replies, and a [`Prompt`] that re-asks until a
//! reply is recognized or attempts run out.

mod adaptive_card;
mod email;
mod phone;
mod prompt;
mod social;

use bb_core::Activity;

pub use adaptive_card::AdaptiveCardRecognizer;
pub use email::EmailRecognizer;
pub use phone::PhoneNumberRecognizer;
pub use prompt::{DEFAULT_MAX_ATTEMPTS, Prompt, PromptOutcome, PromptState};
pub use social::{SocialMediaKind, SocialMediaRecognizer};

/// What a recognizer made of a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRecognizerResult<T> {
    pub succeeded: bool,
    pub value: Option<T>,
}

impl<T> PromptRecognizerResult<T> {
    pub fn success(value: T) -> Self {
        Self {
            succeeded: true,
            value: Some(value),
        }
    }

    pub fn failure() -> Self {
        Self {
            succeeded: false,
            value: None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        if self.succeeded { self.value } else { None }
    }
}

pub trait Recognizer<T>: Send + Sync {
    fn recognize(&self, activity: &Activity) -> PromptRecognizerResult<T>;
}
