use bb_core::{Activity, ActivityType};
use serde_json::Value;

/// Returns true when the payload contains the text fragment anywhere in its structure.
pub fn json_contains_text(value: &Value, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    let mut stack = vec![value];
    while let Some(current) = stack.pop() {
        match current {
            Value::String(text) => {
                if text.contains(needle) {
                    return true;
                }
            }
            Value::Array(items) => stack.extend(items),
            Value::Object(map) => stack.extend(map.values()),
            _ => {}
        }
    }
    false
}

/// Searches the activity text, speak text and serialized attachments.
pub fn activity_contains_text(activity: &Activity, needle: &str) -> bool {
    if activity.text.as_deref().is_some_and(|t| t.contains(needle))
        || activity.speak.as_deref().is_some_and(|t| t.contains(needle))
    {
        return true;
    }
    activity.attachments.iter().any(|attachment| {
        serde_json::to_value(attachment)
            .map(|value| json_contains_text(&value, needle))
            .unwrap_or(false)
    })
}

pub fn assert_activity_type(activity: &Activity, expected: ActivityType) {
    assert_eq!(
        activity.activity_type, expected,
        "unexpected activity type for {:?}",
        activity.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::Attachment;
    use serde_json::json;

    #[test]
    fn finds_nested_text() {
        let payload = json!({"a": [{"b": "hello world"}]});
        assert!(json_contains_text(&payload, "world"));
        assert!(!json_contains_text(&payload, "mars"));
    }

    #[test]
    fn looks_inside_attachments() {
        let activity = Activity::message("hi").with_attachment(Attachment::content(
            "application/vnd.test",
            json!({"title": "card title"}),
        ));
        assert!(activity_contains_text(&activity, "card title"));
        assert_activity_type(&activity, ActivityType::Message);
    }
}
