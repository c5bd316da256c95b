use bb_core::Activity;
use serde_json::{Map, Value};

use crate::{PromptRecognizerResult, Recognizer};

/// Reads the input values an Adaptive Card submit action posts in `activity.value`.
///
/// A typed reply (text without a value) is rejected so the prompt re-asks for the card.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveCardRecognizer {
    required_inputs: Vec<String>,
}

impl AdaptiveCardRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input ids that must be present and non-empty.
    pub fn require(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_inputs.extend(ids.into_iter().map(Into::into));
        self
    }
}

fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}

impl Recognizer<Map<String, Value>> for AdaptiveCardRecognizer {
    fn recognize(&self, activity: &Activity) -> PromptRecognizerResult<Map<String, Value>> {
        let Some(Value::Object(inputs)) = &activity.value else {
            return PromptRecognizerResult::failure();
        };
        let complete = self
            .required_inputs
            .iter()
            .all(|id| is_filled(inputs.get(id)));
        if complete {
            PromptRecognizerResult::success(inputs.clone())
        } else {
            PromptRecognizerResult::failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submit(value: Value) -> Activity {
        Activity {
            value: Some(value),
            ..Activity::message("")
        }
    }

    #[test]
    fn accepts_submitted_inputs() {
        let recognizer = AdaptiveCardRecognizer::new().require(["name", "age"]);
        let result = recognizer.recognize(&submit(json!({"name": "Ada", "age": 36})));
        assert_eq!(result.into_value().unwrap()["name"], "Ada");
    }

    #[test]
    fn rejects_missing_required_input() {
        let recognizer = AdaptiveCardRecognizer::new().require(["name"]);
        assert!(!recognizer.recognize(&submit(json!({"name": "  "}))).succeeded);
        assert!(!recognizer.recognize(&submit(json!("name"))).succeeded);
    }

    #[test]
    fn rejects_typed_text_without_value() {
        let recognizer = AdaptiveCardRecognizer::new();
        assert!(!recognizer.recognize(&Activity::message("Ada, 36")).succeeded);
    }
}
