use bb_core::Activity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Recognizer;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

type Validator<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Per-conversation prompt progress. Serializable so it can live in conversation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptState {
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome<T> {
    Recognized(T),
    /// Ask again with this text.
    Retry(String),
    Exhausted,
}

/// Asks for a value until the recognizer (and validator, if any) accepts a reply.
///
/// ```
/// use bb_core::Activity;
/// use bb_prompts::{EmailRecognizer, Prompt, PromptOutcome, PromptState};
///
/// let prompt = Prompt::new(EmailRecognizer, "Please send a valid e-mail address.").max_attempts(2);
/// let mut state = PromptState::default();
///
/// assert_eq!(
///     prompt.on_reply(&mut state, &Activity::message("nope")),
///     PromptOutcome::Retry("Please send a valid e-mail address.".into())
/// );
/// assert_eq!(
///     prompt.on_reply(&mut state, &Activity::message("ada@example.com")),
///     PromptOutcome::Recognized("ada@example.com".to_string())
/// );
/// ```
pub struct Prompt<T> {
    recognizer: Box<dyn Recognizer<T>>,
    retry_prompt: String,
    validator: Option<Validator<T>>,
    max_attempts: u32,
}

impl<T> Prompt<T> {
    pub fn new(recognizer: impl Recognizer<T> + 'static, retry_prompt: impl Into<String>) -> Self {
        Self {
            recognizer: Box::new(recognizer),
            retry_prompt: retry_prompt.into(),
            validator: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn validator(mut self, validator: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Attempts allowed before [`PromptOutcome::Exhausted`]; at least one.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn retry_prompt(&self) -> &str {
        &self.retry_prompt
    }

    /// Scores one reply. A recognized value resets `state`.
    pub fn on_reply(&self, state: &mut PromptState, activity: &Activity) -> PromptOutcome<T> {
        state.attempts += 1;
        let accepted = self
            .recognizer
            .recognize(activity)
            .into_value()
            .filter(|value| self.validator.as_ref().is_none_or(|valid| valid(value)));

        match accepted {
            Some(value) => {
                *state = PromptState::default();
                PromptOutcome::Recognized(value)
            }
            None if state.attempts >= self.max_attempts => {
                debug!(attempts = state.attempts, "prompt exhausted");
                PromptOutcome::Exhausted
            }
            None => PromptOutcome::Retry(self.retry_prompt.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhoneNumberRecognizer;

    #[test]
    fn validator_rejections_count_as_attempts() {
        let prompt = Prompt::new(PhoneNumberRecognizer, "US numbers only")
            .validator(|number: &String| !number.starts_with('+'))
            .max_attempts(2);
        let mut state = PromptState::default();

        assert_eq!(
            prompt.on_reply(&mut state, &Activity::message("+44 20 7946 0958")),
            PromptOutcome::Retry("US numbers only".into())
        );
        assert_eq!(
            prompt.on_reply(&mut state, &Activity::message("+33 1 23 45 67 89")),
            PromptOutcome::Exhausted
        );
        assert_eq!(state.attempts, 2);
    }

    #[test]
    fn success_resets_attempts() {
        let prompt = Prompt::new(PhoneNumberRecognizer, "again?");
        let mut state = PromptState { attempts: 2 };
        assert_eq!(
            prompt.on_reply(&mut state, &Activity::message("555 123 4567")),
            PromptOutcome::Recognized("5551234567".into())
        );
        assert_eq!(state, PromptState::default());
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let prompt = Prompt::new(PhoneNumberRecognizer, "x").max_attempts(0);
        let mut state = PromptState::default();
        assert_eq!(
            prompt.on_reply(&mut state, &Activity::message("no")),
            PromptOutcome::Exhausted
        );
    }
}
