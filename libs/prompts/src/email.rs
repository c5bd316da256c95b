use bb_core::Activity;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{PromptRecognizerResult, Recognizer};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}\b")
        .expect("email pattern compiles")
});

/// First e-mail address in the reply text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRecognizer;

impl Recognizer<String> for EmailRecognizer {
    fn recognize(&self, activity: &Activity) -> PromptRecognizerResult<String> {
        match EMAIL.find(activity.text_or_empty()) {
            Some(found) => PromptRecognizerResult::success(found.as_str().to_string()),
            None => PromptRecognizerResult::failure(),
        }
    }
}
