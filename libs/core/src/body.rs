use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Largest inbound webhook body accepted by the adapters.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("request body is empty")]
    Empty,
    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes a webhook body as JSON or url-encoded form, chosen by content type.
///
/// Form bodies become a JSON object of strings. A missing or unknown content type is treated as
/// JSON.
///
/// ```
/// use bb_core::{decode_body, DEFAULT_BODY_LIMIT};
///
/// let form = decode_body(
///     Some("application/x-www-form-urlencoded; charset=utf-8"),
///     b"Body=hi+there&From=whatsapp%3A%2B1555",
///     DEFAULT_BODY_LIMIT,
/// )
/// .unwrap();
/// assert_eq!(form["Body"], "hi there");
/// assert_eq!(form["From"], "whatsapp:+1555");
/// ```
pub fn decode_body(
    content_type: Option<&str>,
    bytes: &[u8],
    limit: usize,
) -> Result<Value, BodyError> {
    if bytes.len() > limit {
        return Err(BodyError::TooLarge { limit });
    }
    if bytes.is_empty() {
        return Err(BodyError::Empty);
    }
    if is_form(content_type) {
        let object: Map<String, Value> = decode_form(bytes)
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        return Ok(Value::Object(object));
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Url-encoded form pairs. Repeated keys keep the last value.
pub fn decode_form(bytes: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(bytes).into_owned().collect()
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_default() {
        let value = decode_body(None, br#"{"a":1}"#, DEFAULT_BODY_LIMIT).unwrap();
        assert_eq!(value["a"], 1);
        let value = decode_body(
            Some("application/vnd.api+json"),
            br#"{"b":2}"#,
            DEFAULT_BODY_LIMIT,
        )
        .unwrap();
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn rejects_oversized_and_empty() {
        assert!(matches!(
            decode_body(None, b"{}", 1),
            Err(BodyError::TooLarge { limit: 1 })
        ));
        assert!(matches!(
            decode_body(None, b"", DEFAULT_BODY_LIMIT),
            Err(BodyError::Empty)
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            decode_body(Some("application/json"), b"{nope", DEFAULT_BODY_LIMIT),
            Err(BodyError::Json(_))
        ));
    }

    #[test]
    fn repeated_form_keys_keep_last_value() {
        let pairs = decode_form(b"a=1&a=2&b=");
        assert_eq!(pairs.get("a").map(String::as_str), Some("2"));
        assert_eq!(pairs.get("b").map(String::as_str), Some(""));
    }
}
