use bb_core::Activity;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{PromptRecognizerResult, Recognizer};

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w@])(@\w{1,15})\b").expect("mention pattern compiles"));
static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w#&])(#\w*[^\W\d]\w*)").expect("hashtag pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialMediaKind {
    Mention,
    Hashtag,
}

/// Every `@mention` or `#hashtag` in the reply, prefix included, in order of appearance.
#[derive(Debug, Clone, Copy)]
pub struct SocialMediaRecognizer {
    kind: SocialMediaKind,
}

impl SocialMediaRecognizer {
    pub fn new(kind: SocialMediaKind) -> Self {
        Self { kind }
    }

    pub fn mentions() -> Self {
        Self::new(SocialMediaKind::Mention)
    }

    pub fn hashtags() -> Self {
        Self::new(SocialMediaKind::Hashtag)
    }
}

impl Recognizer<Vec<String>> for SocialMediaRecognizer {
    fn recognize(&self, activity: &Activity) -> PromptRecognizerResult<Vec<String>> {
        let pattern = match self.kind {
            SocialMediaKind::Mention => &*MENTION,
            SocialMediaKind::Hashtag => &*HASHTAG,
        };
        let found: Vec<String> = pattern
            .captures_iter(activity.text_or_empty())
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect();
        if found.is_empty() {
            PromptRecognizerResult::failure()
        } else {
            PromptRecognizerResult::success(found)
        }
    }
}
