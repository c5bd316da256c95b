use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::signature::{SignatureError, constant_time_eq, hmac_sha1};

/// Header Twilio puts its request signature in.
pub const TWILIO_SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Twilio request signature: base64 HMAC-SHA1 of the public URL followed by every POST parameter
/// as `key` + `value`, keys in sorted order.
pub fn twilio_signature(auth_token: &str, url: &str, params: &BTreeMap<String, String>) -> String {
    let mut data = String::from(url);
    for (key, value) in params {
        data.push_str(key);
        data.push_str(value);
    }
    B64.encode(hmac_sha1(auth_token.as_bytes(), data.as_bytes()))
}

pub fn verify_twilio_signature(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
    provided: Option<&str>,
) -> Result<(), SignatureError> {
    let provided = provided
        .map(str::trim)
        .filter(|sig| !sig.is_empty())
        .ok_or(SignatureError::Missing)?;
    let expected = twilio_signature(auth_token, url, params);
    if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
